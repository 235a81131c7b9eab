//! Invariant commands

use std::path::Path;

use bulwark_gate::GateError;
use bulwark_invariants::InvariantEngine;
use bulwark_types::{CheckReport, FindingKind, Snapshot, Subject, Warning};
use serde::Serialize;
use tracing::warn;

use crate::context::Context;
use crate::error::{CliError, CliResult};
use crate::output::{emit, Outcome};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InvariantRun<'a> {
    baseline: &'a str,
    passed: bool,
    report: CheckReport,
    /// Whether constitutional findings were reported to the suspend manager.
    suspended: bool,
}

/// `run-invariant-check --baseline <name> --current <file>`.
///
/// A missing baseline downgrades to a `no_baseline` warning. Constitutional
/// violations suspend the system unless `dry_run`.
pub fn run_invariant_check(
    ctx: &Context,
    baseline: &str,
    current: &Path,
    dry_run: bool,
) -> CliResult<Outcome> {
    let text = std::fs::read_to_string(current)?;
    let parsed = Snapshot::from_json_str(&text)
        .map_err(|e| CliError::InvalidInput(format!("{}: {e}", current.display())))?;

    let report = match ctx.baselines()?.get(baseline) {
        Ok(snapshot) => InvariantEngine::new().evaluate_parsed(&snapshot, &parsed),
        Err(GateError::BaselineNotFound(_)) => {
            warn!(baseline, "baseline not found; invariant check skipped");
            let mut report = CheckReport::skipped(Warning::new(
                "invariants",
                FindingKind::NoBaseline,
                Subject::Check {
                    check: "invariants".into(),
                },
                format!("baseline '{baseline}' not found; checks skipped"),
            ));
            report.warnings.extend(parsed.warnings);
            report
        }
        Err(e) => return Err(e.into()),
    };

    let blocked = report.has_constitutional();
    let mut suspended = false;
    if blocked && !dry_run {
        suspended = ctx
            .suspend()
            .report_violations(&report.violations, None)?
            .is_some();
    }
    emit(
        &InvariantRun {
            baseline,
            passed: !blocked,
            report,
            suspended,
        },
        blocked,
    )
}
