//! Invariant check engine: runs every registered check over a
//! baseline/current pair.

use bulwark_types::{CheckContext, CheckRegistry, CheckReport, GateCheck, ParsedSnapshot, Snapshot};
use tracing::{info, warn};

use crate::migrations::MigrationReversibility;
use crate::schema::EventSchemaImmutability;
use crate::state_machine::StateMachineMonotonicity;

/// The three Tier-0 checks, in run order.
pub fn default_checks() -> CheckRegistry {
    CheckRegistry::new()
        .with_check(EventSchemaImmutability)
        .with_check(StateMachineMonotonicity)
        .with_check(MigrationReversibility)
}

/// Drives a [`CheckRegistry`].
///
/// Evaluation is a pure function of its inputs; one engine can serve many
/// concurrent evaluations.
#[derive(Debug)]
pub struct InvariantEngine {
    registry: CheckRegistry,
}

impl InvariantEngine {
    /// Engine with the default Tier-0 checks.
    pub fn new() -> Self {
        Self {
            registry: default_checks(),
        }
    }

    pub fn with_registry(registry: CheckRegistry) -> Self {
        Self { registry }
    }

    /// Add a check after the existing ones.
    pub fn register(&mut self, check: Box<dyn GateCheck>) {
        self.registry.register(check);
    }

    pub fn check_names(&self) -> Vec<&str> {
        self.registry.names()
    }

    /// Run all checks and concatenate their findings.
    pub fn evaluate(&self, baseline: &Snapshot, current: &Snapshot) -> CheckReport {
        let report = self.registry.run(&CheckContext::new(baseline, current));
        let constitutional = report.constitutional().count();
        if constitutional > 0 {
            warn!(
                violations = report.violations.len(),
                constitutional,
                warnings = report.warnings.len(),
                "invariant check found constitutional violations"
            );
        } else {
            info!(
                violations = report.violations.len(),
                warnings = report.warnings.len(),
                "invariant check complete"
            );
        }
        report
    }

    /// Like [`evaluate`](Self::evaluate), with the current snapshot's parse
    /// warnings placed ahead of the check findings.
    pub fn evaluate_parsed(&self, baseline: &Snapshot, current: &ParsedSnapshot) -> CheckReport {
        let mut report = CheckReport::new();
        report.warnings.extend(current.warnings.iter().cloned());
        report.extend(self.evaluate(baseline, &current.snapshot));
        report
    }
}

impl Default for InvariantEngine {
    fn default() -> Self {
        Self::new()
    }
}
