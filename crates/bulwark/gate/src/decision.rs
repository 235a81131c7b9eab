//! What the gate hands back.

use std::fmt;

use bulwark_risk::RiskAssessment;
use bulwark_suspend::SuspendStatus;
use bulwark_types::{CheckReport, GateTier, PatchId};
use serde::Serialize;

/// Machine-readable reason a patch was not allowed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    /// The system is suspended; nothing was evaluated.
    Suspended,
    /// The active policy could not be applied.
    PolicyInvalid,
    RiskExceeded,
    /// The patch touches a constitutionally protected path.
    ConstitutionalPath,
    /// The invariant engine found a constitutional violation.
    ConstitutionalViolation,
    BaselineMissing,
    /// The patch carried no projected snapshot to check invariants against.
    ProjectionMissing,
    /// Evaluation did not finish before its deadline.
    TimedOut,
}

impl BlockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Suspended => "suspended",
            Self::PolicyInvalid => "policy_invalid",
            Self::RiskExceeded => "risk_exceeded",
            Self::ConstitutionalPath => "constitutional_path",
            Self::ConstitutionalViolation => "constitutional_violation",
            Self::BaselineMissing => "baseline_missing",
            Self::ProjectionMissing => "projection_missing",
            Self::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one patch evaluation.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateDecision {
    pub patch: PatchId,
    pub baseline: String,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<BlockReason>,
    pub message: String,
    /// Absent when evaluation stopped before risk scoring.
    pub risk: Option<RiskAssessment>,
    pub report: CheckReport,
    /// Suspend status after any feedback from this evaluation.
    pub suspend: SuspendStatus,
}

impl GateDecision {
    pub(crate) fn blocked(
        patch: PatchId,
        baseline: &str,
        reason: BlockReason,
        message: impl Into<String>,
        suspend: SuspendStatus,
    ) -> Self {
        Self {
            patch,
            baseline: baseline.to_string(),
            allowed: false,
            block: Some(reason),
            message: message.into(),
            risk: None,
            report: CheckReport::new(),
            suspend,
        }
    }

    pub fn is_blocked(&self) -> bool {
        !self.allowed
    }
}

/// Whether an automatic remediation may run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemediationDecision {
    pub error_class: String,
    pub tier: GateTier,
    pub allowed: bool,
    /// Lowest tier the class is listed at, if any.
    pub min_gate_tier: Option<GateTier>,
    pub reason: String,
}
