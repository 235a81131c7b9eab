//! Findings: violations, warnings, and the reports that carry them.
//!
//! Finding kinds are a closed enum so every consumer (reporting, suspend
//! trigger evaluation, the CLI) has to handle a new kind explicitly.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Severity ────────────────────────────────────────────────────────────

/// Severity of a violation. Ordered `Warning < Major < Constitutional`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Recorded, never blocks.
    Warning,
    /// Recorded for review, does not block on its own.
    Major,
    /// Unconditionally blocks and triggers suspension.
    Constitutional,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Major => write!(f, "major"),
            Self::Constitutional => write!(f, "constitutional"),
        }
    }
}

// ── Check Tier ──────────────────────────────────────────────────────────

/// Invariant tier a finding was produced at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CheckTier {
    /// Constitutional invariant checks.
    #[serde(rename = "tier0")]
    Tier0,
    /// Policy-level checks (risk, replay verification).
    #[serde(rename = "tier1")]
    Tier1,
}

// ── Finding Kind ────────────────────────────────────────────────────────

/// Closed set of finding kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    EventRemoved,
    EventAdded,
    FieldRemoved,
    FieldAdded,
    FieldTypeChanged,
    StateRemoved,
    StateAdded,
    StateUnmapped,
    BackwardTransition,
    UnorderedTransition,
    MigrationRemoved,
    NewMigrationDetected,
    MigrationTrackingDisabled,
    /// Check skipped because the baseline has nothing recorded.
    NoBaseline,
    /// A snapshot section could not be read and was ignored.
    MalformedSnapshot,
    /// The patch carried no projected snapshot.
    ProjectionMissing,
    ProtectedPath,
    RiskExceeded,
    ReplayFailed,
    ReplayTimedOut,
    ReplayCancelled,
}

impl FindingKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EventRemoved => "event_removed",
            Self::EventAdded => "event_added",
            Self::FieldRemoved => "field_removed",
            Self::FieldAdded => "field_added",
            Self::FieldTypeChanged => "field_type_changed",
            Self::StateRemoved => "state_removed",
            Self::StateAdded => "state_added",
            Self::StateUnmapped => "state_unmapped",
            Self::BackwardTransition => "backward_transition",
            Self::UnorderedTransition => "unordered_transition",
            Self::MigrationRemoved => "migration_removed",
            Self::NewMigrationDetected => "new_migration_detected",
            Self::MigrationTrackingDisabled => "migration_tracking_disabled",
            Self::NoBaseline => "no_baseline",
            Self::MalformedSnapshot => "malformed_snapshot",
            Self::ProjectionMissing => "projection_missing",
            Self::ProtectedPath => "protected_path",
            Self::RiskExceeded => "risk_exceeded",
            Self::ReplayFailed => "replay_failed",
            Self::ReplayTimedOut => "replay_timed_out",
            Self::ReplayCancelled => "replay_cancelled",
        }
    }

    /// Whether this kind means a check was skipped rather than evaluated.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Self::NoBaseline | Self::MigrationTrackingDisabled | Self::ProjectionMissing
        )
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Subject ─────────────────────────────────────────────────────────────

/// Exact identifiers of what a finding is about.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "subject", rename_all = "snake_case")]
pub enum Subject {
    Event { event: String },
    Field { event: String, field: String },
    State { state: String },
    Transition { from: String, to: String },
    Migration { migration: String },
    Path { path: String, rule: String },
    /// A snapshot section (`events`, `states`, ...).
    Section { section: String },
    /// A whole check.
    Check { check: String },
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event { event } => write!(f, "event '{event}'"),
            Self::Field { event, field } => write!(f, "field '{event}.{field}'"),
            Self::State { state } => write!(f, "state '{state}'"),
            Self::Transition { from, to } => write!(f, "transition '{from}' -> '{to}'"),
            Self::Migration { migration } => write!(f, "migration '{migration}'"),
            Self::Path { path, rule } => write!(f, "path '{path}' (rule '{rule}')"),
            Self::Section { section } => write!(f, "section '{section}'"),
            Self::Check { check } => write!(f, "check '{check}'"),
        }
    }
}

// ── Violation / Warning ─────────────────────────────────────────────────

/// A rule violation with severity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub tier: CheckTier,
    /// Name of the rule or check that produced it.
    pub rule: String,
    pub kind: FindingKind,
    #[serde(flatten)]
    pub subject: Subject,
    pub severity: Severity,
    pub message: String,
}

impl Violation {
    /// Create a Tier-0 violation.
    pub fn new(
        rule: impl Into<String>,
        kind: FindingKind,
        subject: Subject,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tier: CheckTier::Tier0,
            rule: rule.into(),
            kind,
            subject,
            severity,
            message: message.into(),
        }
    }

    /// Create a constitutional Tier-0 violation.
    pub fn constitutional(
        rule: impl Into<String>,
        kind: FindingKind,
        subject: Subject,
        message: impl Into<String>,
    ) -> Self {
        Self::new(rule, kind, subject, Severity::Constitutional, message)
    }

    /// Re-tag the violation with a different tier.
    pub fn at_tier(mut self, tier: CheckTier) -> Self {
        self.tier = tier;
        self
    }

    /// Whether this violation is constitutional.
    pub fn is_constitutional(&self) -> bool {
        self.severity == Severity::Constitutional
    }
}

/// A non-blocking finding. Same shape as [`Violation`] minus severity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub tier: CheckTier,
    pub rule: String,
    pub kind: FindingKind,
    #[serde(flatten)]
    pub subject: Subject,
    pub message: String,
}

impl Warning {
    /// Create a Tier-0 warning.
    pub fn new(
        rule: impl Into<String>,
        kind: FindingKind,
        subject: Subject,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tier: CheckTier::Tier0,
            rule: rule.into(),
            kind,
            subject,
            message: message.into(),
        }
    }

    /// Re-tag the warning with a different tier.
    pub fn at_tier(mut self, tier: CheckTier) -> Self {
        self.tier = tier;
        self
    }
}

// ── Check Report ────────────────────────────────────────────────────────

/// Violations and warnings produced by one or more checks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    pub violations: Vec<Violation>,
    pub warnings: Vec<Warning>,
}

impl CheckReport {
    /// An empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// A report holding a single skip warning.
    pub fn skipped(warning: Warning) -> Self {
        Self {
            violations: vec![],
            warnings: vec![warning],
        }
    }

    pub fn push_violation(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub fn push_warning(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    /// Append another report's findings after this one's.
    pub fn extend(&mut self, other: CheckReport) {
        self.violations.extend(other.violations);
        self.warnings.extend(other.warnings);
    }

    /// No violations of any severity.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Constitutional violations only.
    pub fn constitutional(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.is_constitutional())
    }

    pub fn has_constitutional(&self) -> bool {
        self.constitutional().next().is_some()
    }

    /// Highest violation severity, if any.
    pub fn max_severity(&self) -> Option<Severity> {
        self.violations.iter().map(|v| v.severity).max()
    }

    /// Number of violations of `kind`.
    pub fn violation_count(&self, kind: FindingKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }

    /// Number of warnings of `kind`.
    pub fn warning_count(&self, kind: FindingKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }
}
