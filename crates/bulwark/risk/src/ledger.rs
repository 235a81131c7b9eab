//! Rolling risk budget ledger.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Accepted risk accumulated in the current window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLedger {
    pub window_start: DateTime<Utc>,
    pub consumed: f64,
}

impl Default for BudgetLedger {
    /// An epoch-anchored empty ledger; the first read rolls it over.
    fn default() -> Self {
        Self {
            window_start: DateTime::<Utc>::UNIX_EPOCH,
            consumed: 0.0,
        }
    }
}

impl BudgetLedger {
    pub fn starting_at(window_start: DateTime<Utc>) -> Self {
        Self {
            window_start,
            consumed: 0.0,
        }
    }

    pub fn window_end(&self, window_seconds: u64) -> DateTime<Utc> {
        let secs = i64::try_from(window_seconds).unwrap_or(i64::MAX);
        Duration::try_seconds(secs)
            .and_then(|d| self.window_start.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether `now` is past the end of this ledger's window.
    pub fn is_expired(&self, now: DateTime<Utc>, window_seconds: u64) -> bool {
        now >= self.window_end(window_seconds)
    }

    /// The ledger as seen at `now`: a fresh window if this one expired.
    pub fn at(&self, now: DateTime<Utc>, window_seconds: u64) -> Self {
        if self.is_expired(now, window_seconds) {
            Self::starting_at(now)
        } else {
            self.clone()
        }
    }

    /// Consumed share of `max`, clamped to `[0, 1]`.
    pub fn consumed_fraction(&self, max: f64) -> f64 {
        if max <= 0.0 {
            return 1.0;
        }
        (self.consumed / max).clamp(0.0, 1.0)
    }

    pub fn with_consumed(mut self, amount: f64) -> Self {
        self.consumed += amount;
        self
    }
}

/// Read-only budget view for reporting.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub consumed: f64,
    pub max: f64,
    pub fraction: f64,
}
