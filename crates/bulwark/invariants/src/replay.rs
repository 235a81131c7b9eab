//! Sandboxed migration replay, run off the gate's critical path.
//!
//! A [`ReplayVerifier`] actually exercises migrations (up, then down) in a
//! sandbox. The gate never waits for it: [`spawn_replay_verification`]
//! starts the verifier as a tokio task with its own timeout, and the result
//! arrives later as a new [`CheckReport`].
//!
//! ```text
//!   spawn ──▶ verify() ──┬─ ok ─────────▶ empty report
//!                        ├─ failure ────▶ replay_failed (major)
//!                        ├─ timeout ────▶ replay_timed_out (warning)
//!                        └─ cancel() ───▶ replay_cancelled (warning)
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bulwark_types::{CheckReport, CheckTier, FindingKind, Severity, Snapshot, Subject, Violation, Warning};
use thiserror::Error;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{info, warn};

pub const RULE: &str = "migration_replay";

/// A failed replay.
#[derive(Debug, Clone, Error)]
#[error("replay failed{}: {reason}", .migration.as_ref().map(|m| format!(" at '{m}'")).unwrap_or_default())]
pub struct ReplayFailure {
    /// Migration that failed, if the verifier could pin it down.
    pub migration: Option<String>,
    pub reason: String,
}

/// Verifies that migrations can be replayed and rolled back.
#[async_trait]
pub trait ReplayVerifier: Send + Sync {
    fn name(&self) -> &str;

    async fn verify(&self, baseline: &Snapshot, current: &Snapshot) -> Result<(), ReplayFailure>;
}

/// Handle to a running replay verification.
#[derive(Debug)]
pub struct ReplayHandle {
    task: JoinHandle<CheckReport>,
    abort: AbortHandle,
    verifier: String,
}

impl ReplayHandle {
    /// Cancel the verification. [`report`](Self::report) then yields a
    /// `replay_cancelled` warning.
    pub fn cancel(&self) {
        self.abort.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the verification's findings.
    pub async fn report(self) -> CheckReport {
        match self.task.await {
            Ok(report) => report,
            Err(e) if e.is_cancelled() => {
                info!(verifier = %self.verifier, "replay verification cancelled");
                CheckReport::skipped(
                    Warning::new(
                        RULE,
                        FindingKind::ReplayCancelled,
                        check_subject(&self.verifier),
                        "replay verification was cancelled",
                    )
                    .at_tier(CheckTier::Tier1),
                )
            }
            Err(e) => {
                warn!(verifier = %self.verifier, error = %e, "replay verifier panicked");
                let mut report = CheckReport::new();
                report.push_violation(
                    Violation::new(
                        RULE,
                        FindingKind::ReplayFailed,
                        check_subject(&self.verifier),
                        Severity::Major,
                        format!("replay verifier aborted: {e}"),
                    )
                    .at_tier(CheckTier::Tier1),
                );
                report
            }
        }
    }
}

/// Start `verifier` on the current runtime, bounded by `timeout`.
pub fn spawn_replay_verification(
    verifier: Arc<dyn ReplayVerifier>,
    baseline: Arc<Snapshot>,
    current: Arc<Snapshot>,
    timeout: Duration,
) -> ReplayHandle {
    let name = verifier.name().to_string();
    let task_name = name.clone();
    let task = tokio::spawn(async move {
        let outcome = tokio::time::timeout(timeout, verifier.verify(&baseline, &current)).await;
        let mut report = CheckReport::new();
        match outcome {
            Ok(Ok(())) => {
                info!(verifier = %task_name, "replay verification passed");
            }
            Ok(Err(failure)) => {
                warn!(verifier = %task_name, error = %failure, "replay verification failed");
                let subject = match &failure.migration {
                    Some(migration) => Subject::Migration {
                        migration: migration.clone(),
                    },
                    None => check_subject(&task_name),
                };
                report.push_violation(
                    Violation::new(
                        RULE,
                        FindingKind::ReplayFailed,
                        subject,
                        Severity::Major,
                        failure.to_string(),
                    )
                    .at_tier(CheckTier::Tier1),
                );
            }
            Err(_) => {
                warn!(verifier = %task_name, timeout_ms = timeout.as_millis() as u64, "replay verification timed out");
                report.push_warning(
                    Warning::new(
                        RULE,
                        FindingKind::ReplayTimedOut,
                        check_subject(&task_name),
                        format!("replay verification exceeded {}ms", timeout.as_millis()),
                    )
                    .at_tier(CheckTier::Tier1),
                );
            }
        }
        report
    });
    let abort = task.abort_handle();
    ReplayHandle {
        task,
        abort,
        verifier: name,
    }
}

fn check_subject(verifier: &str) -> Subject {
    Subject::Check {
        check: verifier.to_string(),
    }
}
