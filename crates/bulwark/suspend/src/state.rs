//! The persisted suspend record.

use std::fmt;

use bulwark_types::{Actor, FindingKind, Subject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether autonomous changes may proceed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuspendStatus {
    Active,
    Suspended,
}

impl fmt::Display for SuspendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Suspended => write!(f, "suspended"),
        }
    }
}

/// How much authority an unlock needs. `Standard < Critical`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspendSeverity {
    Standard,
    Critical,
}

impl fmt::Display for SuspendSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// What caused a suspension.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// The invariant engine reported a constitutional violation.
    ConstitutionalViolation {
        rule: String,
        kind: FindingKind,
        subject: Subject,
    },
    /// The risk budget crossed its trip fraction. A non-finite fraction is
    /// stored as `None`; JSON has no encoding for it.
    BudgetExceeded { fraction: Option<f64>, limit: f64 },
    /// Too many dry runs failed in a row.
    SimulateFailures { consecutive: u32, limit: u32 },
    /// The external health feed dropped below the floor. `score` is `None`
    /// when the feed sent a non-finite value.
    HealthBelowFloor { score: Option<f64>, floor: f64 },
    /// An authorized actor suspended by hand.
    Manual,
}

impl Trigger {
    /// Unlock severity this trigger demands.
    pub fn severity(&self) -> SuspendSeverity {
        match self {
            Self::ConstitutionalViolation { .. } => SuspendSeverity::Critical,
            _ => SuspendSeverity::Standard,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ConstitutionalViolation { .. } => "constitutional_violation",
            Self::BudgetExceeded { .. } => "budget_exceeded",
            Self::SimulateFailures { .. } => "simulate_failures",
            Self::HealthBelowFloor { .. } => "health_below_floor",
            Self::Manual => "manual",
        }
    }
}

/// One append-only history record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HistoryEntry {
    Trigger {
        id: Uuid,
        trigger: Trigger,
        reason: String,
        at: DateTime<Utc>,
        by: Option<Actor>,
    },
    Unlock {
        id: Uuid,
        at: DateTime<Utc>,
        by: Actor,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        co_signer: Option<Actor>,
        /// Severity of the suspension that was lifted.
        severity: SuspendSeverity,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
}

impl HistoryEntry {
    pub fn is_trigger(&self) -> bool {
        matches!(self, Self::Trigger { .. })
    }

    pub fn is_unlock(&self) -> bool {
        matches!(self, Self::Unlock { .. })
    }
}

/// The singleton suspend record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspendState {
    pub status: SuspendStatus,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub triggered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub triggered_by: Option<Actor>,
    /// Severity of the current suspension; `None` while active.
    #[serde(default)]
    pub severity: Option<SuspendSeverity>,
    #[serde(default)]
    pub consecutive_simulate_failures: u32,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl Default for SuspendState {
    fn default() -> Self {
        Self {
            status: SuspendStatus::Active,
            reason: None,
            triggered_at: None,
            triggered_by: None,
            severity: None,
            consecutive_simulate_failures: 0,
            history: Vec::new(),
        }
    }
}

impl SuspendState {
    pub fn is_suspended(&self) -> bool {
        self.status == SuspendStatus::Suspended
    }

    /// Apply a trigger. The first trigger sets reason / time / actor; later
    /// ones are recorded and can only raise the severity.
    pub(crate) fn apply_trigger(
        &mut self,
        trigger: Trigger,
        reason: String,
        at: DateTime<Utc>,
        by: Option<Actor>,
    ) {
        let severity = trigger.severity();
        if self.is_suspended() {
            self.severity = self.severity.max(Some(severity));
        } else {
            self.status = SuspendStatus::Suspended;
            self.reason = Some(reason.clone());
            self.triggered_at = Some(at);
            self.triggered_by = by.clone();
            self.severity = Some(severity);
        }
        self.history.push(HistoryEntry::Trigger {
            id: Uuid::new_v4(),
            trigger,
            reason,
            at,
            by,
        });
    }

    pub(crate) fn apply_unlock(
        &mut self,
        at: DateTime<Utc>,
        by: Actor,
        co_signer: Option<Actor>,
        note: Option<String>,
    ) {
        let severity = self.severity.unwrap_or(SuspendSeverity::Standard);
        self.status = SuspendStatus::Active;
        self.reason = None;
        self.triggered_at = None;
        self.triggered_by = None;
        self.severity = None;
        self.consecutive_simulate_failures = 0;
        self.history.push(HistoryEntry::Unlock {
            id: Uuid::new_v4(),
            at,
            by,
            co_signer,
            severity,
            note,
        });
    }
}
