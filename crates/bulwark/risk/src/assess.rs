//! Pure risk scoring.
//!
//! ```text
//!   score = Σ weight(winning match per file)
//!         + size contribution (highest threshold with minLines ≤ lines)
//!         + many-files penalty
//!   clamped to [0, 1]
//!
//!   threshold = baseThreshold × (1 − consumed fraction)
//!   allowed   = no constitutional match ∧ score < threshold
//! ```

use bulwark_policy::{Policy, RiskPolicy};
use bulwark_types::{
    CheckReport, CheckTier, FindingKind, Patch, Severity, Subject, Violation, Warning,
};
use serde::{Deserialize, Serialize};

use crate::error::RiskResult;
use crate::ledger::BudgetLedger;
use crate::matcher::{PathMatch, ProtectedPathMatcher};

pub const PATH_RULE: &str = "protected_paths";
pub const BUDGET_RULE: &str = "risk_budget";

/// Score contributions, for audit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub paths: f64,
    pub size: f64,
    pub many_files: f64,
}

/// Outcome of scoring one patch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    /// Normalized score in `[0, 1]`.
    pub score: f64,
    pub reason: String,
    pub allowed: bool,
    /// Threshold the score was compared against.
    pub threshold: f64,
    /// Budget fraction already consumed when the patch was scored.
    pub budget_consumed: f64,
    pub breakdown: ScoreBreakdown,
    /// Winning protected-path matches, one per matched file.
    pub matches: Vec<PathMatch>,
    pub report: CheckReport,
}

impl RiskAssessment {
    pub fn constitutional_matches(&self) -> impl Iterator<Item = &PathMatch> {
        self.matches
            .iter()
            .filter(|m| m.severity == Severity::Constitutional)
    }

    pub fn has_constitutional_match(&self) -> bool {
        self.constitutional_matches().next().is_some()
    }
}

/// Score `patch` against `policy` given the current window's ledger.
pub fn assess(patch: &Patch, policy: &Policy, ledger: &BudgetLedger) -> RiskResult<RiskAssessment> {
    let matcher = ProtectedPathMatcher::from_policy(policy)?;
    Ok(assess_with(&matcher, patch, &policy.document().risk, ledger))
}

/// [`assess`] with a pre-compiled matcher.
pub fn assess_with(
    matcher: &ProtectedPathMatcher,
    patch: &Patch,
    risk: &RiskPolicy,
    ledger: &BudgetLedger,
) -> RiskAssessment {
    let matches: Vec<PathMatch> = patch
        .files
        .iter()
        .filter_map(|f| matcher.classify(f))
        .collect();

    let paths: f64 = matches
        .iter()
        .map(|m| risk.weights.weight(m.severity))
        .sum();

    let lines = patch.diff_stats.lines_changed();
    let size = risk
        .size_thresholds
        .iter()
        .filter(|t| t.min_lines <= lines)
        .max_by_key(|t| t.min_lines)
        .map(|t| t.score)
        .unwrap_or(0.0);

    let file_count = (patch.files.len() as u32).max(patch.diff_stats.files_changed);
    let many_files = if file_count > risk.many_files_threshold {
        risk.many_files_penalty
    } else {
        0.0
    };

    let score = (paths + size + many_files).clamp(0.0, 1.0);
    let budget_consumed = ledger.consumed_fraction(risk.budget.max);
    let threshold = risk.base_threshold * (1.0 - budget_consumed);

    let mut report = CheckReport::new();
    for m in &matches {
        let subject = Subject::Path {
            path: m.path.clone(),
            rule: m.rule.clone(),
        };
        if m.severity == Severity::Constitutional {
            report.push_violation(
                Violation::constitutional(
                    PATH_RULE,
                    FindingKind::ProtectedPath,
                    subject,
                    format!("'{}' is constitutionally protected by rule '{}'", m.path, m.rule),
                )
                .at_tier(CheckTier::Tier1),
            );
        } else {
            report.push_warning(
                Warning::new(
                    PATH_RULE,
                    FindingKind::ProtectedPath,
                    subject,
                    format!("'{}' matched {} rule '{}'", m.path, m.severity, m.rule),
                )
                .at_tier(CheckTier::Tier1),
            );
        }
    }

    let constitutional: Vec<&PathMatch> = matches
        .iter()
        .filter(|m| m.severity == Severity::Constitutional)
        .collect();

    let (allowed, reason) = if !constitutional.is_empty() {
        let named: Vec<String> = constitutional
            .iter()
            .map(|m| format!("{} (rule '{}')", m.path, m.rule))
            .collect();
        (
            false,
            format!("constitutional path touched: {}", named.join(", ")),
        )
    } else if score < threshold {
        (
            true,
            format!("score {score:.3} below threshold {threshold:.3}"),
        )
    } else {
        report.push_violation(
            Violation::new(
                BUDGET_RULE,
                FindingKind::RiskExceeded,
                Subject::Check {
                    check: BUDGET_RULE.to_string(),
                },
                Severity::Major,
                format!("score {score:.3} reaches threshold {threshold:.3}"),
            )
            .at_tier(CheckTier::Tier1),
        );
        (
            false,
            format!(
                "score {score:.3} reaches threshold {threshold:.3} ({:.0}% of budget consumed)",
                budget_consumed * 100.0
            ),
        )
    };

    RiskAssessment {
        score,
        reason,
        allowed,
        threshold,
        budget_consumed,
        breakdown: ScoreBreakdown {
            paths,
            size,
            many_files,
        },
        matches,
        report,
    }
}
