//! Full gate evaluation and baseline promotion

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bulwark_gate::GateError;
use bulwark_types::{Actor, Patch, Snapshot};
use serde::Serialize;

use crate::context::Context;
use crate::error::{CliError, CliResult};
use crate::output::{emit, Outcome, Refusal};

/// `evaluate --baseline <name> --patch <file>`: the whole pipeline, under a
/// deadline.
pub async fn evaluate(
    ctx: &Context,
    baseline: &str,
    patch: &Path,
    deadline_ms: Option<u64>,
) -> CliResult<Outcome> {
    let text = std::fs::read_to_string(patch)?;
    let patch: Patch = serde_json::from_str(&text)
        .map_err(|e| CliError::InvalidInput(format!("{}: {e}", patch.display())))?;
    let deadline = Duration::from_millis(deadline_ms.unwrap_or(ctx.settings.deadline_ms));

    let gate = Arc::new(ctx.gate()?);
    let decision = gate.evaluate_with_deadline(baseline, patch, deadline).await?;
    let blocked = decision.is_blocked();
    emit(&decision, blocked)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Promoted<'a> {
    baseline: &'a str,
    by: &'a str,
    snapshot: &'a Snapshot,
}

/// `baseline promote <name> --snapshot <file> --actor <actor>`.
pub fn promote(ctx: &Context, name: &str, snapshot: &Path, actor: &str) -> CliResult<Outcome> {
    let text = std::fs::read_to_string(snapshot)?;
    let parsed = Snapshot::from_json_str(&text)
        .map_err(|e| CliError::InvalidInput(format!("{}: {e}", snapshot.display())))?;
    if !parsed.warnings.is_empty() {
        let reasons: Vec<_> = parsed.warnings.iter().map(|w| w.message.as_str()).collect();
        return Err(CliError::InvalidInput(format!(
            "refusing to promote a malformed snapshot: {}",
            reasons.join("; ")
        )));
    }

    let policy = ctx.policy()?;
    let registry = ctx.baselines()?;
    match registry.promote(name, parsed.snapshot, &Actor::new(actor), &policy) {
        Ok(snapshot) => emit(
            &Promoted {
                baseline: name,
                by: actor,
                snapshot: &snapshot,
            },
            false,
        ),
        Err(e @ GateError::NotAuthorized { .. }) => emit(&Refusal::new("not_authorized", e), true),
        Err(e) => Err(e.into()),
    }
}
