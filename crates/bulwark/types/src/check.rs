//! The check capability and the registry that runs checks in order.

use tracing::debug;

use crate::finding::{CheckReport, CheckTier};
use crate::snapshot::Snapshot;

/// Inputs every invariant check sees: the recorded baseline and the
/// current (or projected) snapshot.
#[derive(Clone, Copy, Debug)]
pub struct CheckContext<'a> {
    pub baseline: &'a Snapshot,
    pub current: &'a Snapshot,
}

impl<'a> CheckContext<'a> {
    pub fn new(baseline: &'a Snapshot, current: &'a Snapshot) -> Self {
        Self { baseline, current }
    }
}

/// A check that inspects a baseline/current pair and reports findings.
///
/// Implementations must be pure functions of the context; the registry may
/// call them concurrently from several evaluations.
pub trait GateCheck: Send + Sync {
    /// Rule name attached to every finding the check emits.
    fn name(&self) -> &str;

    /// Tier the check belongs to.
    fn tier(&self) -> CheckTier {
        CheckTier::Tier0
    }

    /// Run the check.
    fn evaluate(&self, ctx: &CheckContext<'_>) -> CheckReport;
}

/// Ordered list of checks. Findings come out in registration order.
#[derive(Default)]
pub struct CheckRegistry {
    checks: Vec<Box<dyn GateCheck>>,
}

impl CheckRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a check.
    pub fn register(&mut self, check: Box<dyn GateCheck>) {
        self.checks.push(check);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_check(mut self, check: impl GateCheck + 'static) -> Self {
        self.register(Box::new(check));
        self
    }

    /// Names of registered checks, in run order.
    pub fn names(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run every check and concatenate the reports.
    pub fn run(&self, ctx: &CheckContext<'_>) -> CheckReport {
        let mut report = CheckReport::new();
        for check in &self.checks {
            let partial = check.evaluate(ctx);
            debug!(
                check = check.name(),
                violations = partial.violations.len(),
                warnings = partial.warnings.len(),
                "check evaluated"
            );
            report.extend(partial);
        }
        report
    }
}

impl std::fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckRegistry")
            .field("checks", &self.names())
            .finish()
    }
}
