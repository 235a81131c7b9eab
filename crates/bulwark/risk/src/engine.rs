//! Risk engine: scoring plus the shared budget ledger.
//!
//! Acceptance is read → assess → compare-and-swap. When another writer
//! commits first the whole assessment is redone against the fresh ledger,
//! so two concurrent acceptances can never both see the same budget.

use std::sync::Arc;

use bulwark_policy::Policy;
use bulwark_types::{CasOutcome, Clock, InMemoryStore, Patch, SystemClock, VersionedStore};
use tracing::{debug, info, warn};

use crate::assess::{assess_with, RiskAssessment};
use crate::error::{RiskError, RiskResult};
use crate::ledger::{BudgetLedger, BudgetStatus};
use crate::matcher::ProtectedPathMatcher;

const MAX_CAS_ATTEMPTS: usize = 64;

pub struct RiskEngine {
    ledger: Arc<dyn VersionedStore<BudgetLedger>>,
    clock: Arc<dyn Clock>,
}

impl RiskEngine {
    pub fn new(ledger: Arc<dyn VersionedStore<BudgetLedger>>, clock: Arc<dyn Clock>) -> Self {
        Self { ledger, clock }
    }

    /// In-memory ledger and the system clock.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryStore::<BudgetLedger>::default()),
            Arc::new(SystemClock),
        )
    }

    /// Assess `patch`; on acceptance, charge its score to the ledger.
    pub fn assess(&self, patch: &Patch, policy: &Policy) -> RiskResult<RiskAssessment> {
        let matcher = ProtectedPathMatcher::from_policy(policy)?;
        let risk = &policy.document().risk;
        let window = risk.budget.window_seconds;

        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let current = self.ledger.read()?;
            let now = self.clock.now();
            let ledger = current.value.at(now, window);
            let assessment = assess_with(&matcher, patch, risk, &ledger);

            if !assessment.allowed {
                info!(
                    patch = %patch.id,
                    score = assessment.score,
                    threshold = assessment.threshold,
                    reason = %assessment.reason,
                    "patch rejected by risk assessment"
                );
                return Ok(assessment);
            }

            let charged = ledger.with_consumed(assessment.score);
            match self.ledger.compare_and_swap(current.version, charged.clone())? {
                CasOutcome::Committed { version } => {
                    info!(
                        patch = %patch.id,
                        score = assessment.score,
                        threshold = assessment.threshold,
                        consumed = charged.consumed,
                        version,
                        "patch accepted by risk assessment"
                    );
                    return Ok(assessment);
                }
                CasOutcome::Conflict { current } => {
                    debug!(attempt, current, "risk ledger changed underneath; reassessing");
                }
            }
        }

        warn!(patch = %patch.id, "risk ledger contention; giving up");
        Err(RiskError::Contention(MAX_CAS_ATTEMPTS))
    }

    /// The ledger as of now, rolled over if its window ended.
    pub fn status(&self, policy: &Policy) -> RiskResult<BudgetStatus> {
        let budget = policy.document().risk.budget;
        let ledger = self
            .ledger
            .read()?
            .value
            .at(self.clock.now(), budget.window_seconds);
        Ok(BudgetStatus {
            window_start: ledger.window_start,
            window_end: ledger.window_end(budget.window_seconds),
            consumed: ledger.consumed,
            max: budget.max,
            fraction: ledger.consumed_fraction(budget.max),
        })
    }

    pub fn consumed_fraction(&self, policy: &Policy) -> RiskResult<f64> {
        Ok(self.status(policy)?.fraction)
    }
}
