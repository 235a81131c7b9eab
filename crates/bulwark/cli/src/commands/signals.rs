//! External signal commands: dry-run results and health scores.

use bulwark_suspend::SimulationOutcome;
use serde::Serialize;

use crate::context::Context;
use crate::error::CliResult;
use crate::output::{emit, Outcome};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignalResult<T: Serialize> {
    signal: T,
    suspended: bool,
    consecutive_simulate_failures: u32,
}

/// `simulate --passed|--failed`.
pub fn simulate(ctx: &Context, passed: bool) -> CliResult<Outcome> {
    let outcome = if passed {
        SimulationOutcome::Passed
    } else {
        SimulationOutcome::Failed
    };
    let state = ctx.gate()?.record_simulation(outcome)?;
    let suspended = state.is_suspended();
    emit(
        &SignalResult {
            signal: outcome,
            suspended,
            consecutive_simulate_failures: state.consecutive_simulate_failures,
        },
        suspended,
    )
}

/// `health <score>`.
pub fn health(ctx: &Context, score: f64) -> CliResult<Outcome> {
    let gate = ctx.gate()?;
    gate.report_health(score)?;
    let state = gate.suspend().status().state;
    let suspended = state.is_suspended();
    emit(
        &SignalResult {
            signal: score,
            suspended,
            consecutive_simulate_failures: state.consecutive_simulate_failures,
        },
        suspended,
    )
}
