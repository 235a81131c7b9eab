//! Risk commands

use bulwark_risk::{assess, check_files, BudgetStatus, PathClassification, RiskAssessment};
use bulwark_types::{Patch, VersionedStore};
use serde::Serialize;

use crate::context::Context;
use crate::error::CliResult;
use crate::output::{emit, Outcome};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RiskCheck {
    files: Vec<PathClassification>,
    assessment: RiskAssessment,
    budget: BudgetStatus,
}

/// `check-risk <files...>`: classify and score without charging the budget.
pub fn check_risk(
    ctx: &Context,
    files: &[String],
    insertions: u32,
    deletions: u32,
) -> CliResult<Outcome> {
    let policy = ctx.policy()?;
    let classified = check_files(files, &policy)?;

    let window = policy.document().risk.budget.window_seconds;
    let ledger = ctx
        .ledger_store()
        .read()?
        .value
        .at(ctx.clock().now(), window);
    let patch = Patch::new(files.iter().cloned()).with_lines(insertions, deletions);
    let assessment = assess(&patch, &policy, &ledger)?;
    let budget = ctx.risk().status(&policy)?;

    let blocked = !assessment.allowed;
    emit(
        &RiskCheck {
            files: classified,
            assessment,
            budget,
        },
        blocked,
    )
}
