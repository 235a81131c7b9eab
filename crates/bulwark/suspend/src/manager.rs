//! Suspend manager: the system-wide circuit breaker.
//!
//! ```text
//!            constitutional violation │ budget > trip fraction
//!            simulate failures > max  │ health < floor │ manual
//!   ┌────────┐ ───────────────────────┴──────────────▶ ┌───────────┐
//!   │ Active │                                         │ Suspended │
//!   └────────┘ ◀────────────────────────────────────── └───────────┘
//!                    unlock (signers satisfy policy)
//! ```
//!
//! Every transition is read → modify → compare-and-swap on the versioned
//! record. Triggers retry until recorded; unlock re-checks authorization
//! against the freshly read record on every retry, so a trigger that lands
//! mid-unlock and raises the severity is honored.

use std::sync::Arc;

use bulwark_policy::{Policy, RoleResolver, SuspendThresholds};
use bulwark_types::{
    actions, Actor, CasOutcome, Clock, InMemoryStore, SystemClock, Violation, VersionedStore,
};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{SuspendError, SuspendResult};
use crate::state::{SuspendSeverity, SuspendState, SuspendStatus, Trigger};

const MAX_CAS_ATTEMPTS: usize = 128;

/// Result of a dry-run evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationOutcome {
    Passed,
    Failed,
}

/// A request to lift the suspension.
#[derive(Clone, Debug)]
pub struct UnlockRequest {
    pub actor: Actor,
    pub co_signer: Option<Actor>,
    pub note: Option<String>,
}

impl UnlockRequest {
    pub fn new(actor: impl Into<Actor>) -> Self {
        Self {
            actor: actor.into(),
            co_signer: None,
            note: None,
        }
    }

    pub fn with_co_signer(mut self, co_signer: impl Into<Actor>) -> Self {
        self.co_signer = Some(co_signer.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    fn signers(&self) -> Vec<&Actor> {
        std::iter::once(&self.actor)
            .chain(self.co_signer.as_ref())
            .collect()
    }
}

/// What `status()` returns: the record, or a fail-safe stand-in.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspendView {
    #[serde(flatten)]
    pub state: SuspendState,
    /// Record version; `None` when the store could not be read.
    pub version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_error: Option<String>,
}

impl SuspendView {
    pub fn is_suspended(&self) -> bool {
        self.state.is_suspended()
    }
}

/// Owns the singleton suspend record.
pub struct SuspendManager {
    store: Arc<dyn VersionedStore<SuspendState>>,
    clock: Arc<dyn Clock>,
}

impl SuspendManager {
    pub fn new(store: Arc<dyn VersionedStore<SuspendState>>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// In-memory record and the system clock.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryStore::<SuspendState>::default()),
            Arc::new(SystemClock),
        )
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Current state plus full history.
    ///
    /// An unreadable or corrupt store reports `Suspended` with critical
    /// severity; it never falls back to `Active`.
    pub fn status(&self) -> SuspendView {
        match self.store.read() {
            Ok(record) => SuspendView {
                state: record.value,
                version: Some(record.version),
                store_error: None,
            },
            Err(e) => {
                error!(error = %e, "suspend store unreadable; reporting suspended");
                SuspendView {
                    state: SuspendState {
                        status: SuspendStatus::Suspended,
                        reason: Some(format!("suspend state unavailable: {e}")),
                        severity: Some(SuspendSeverity::Critical),
                        ..SuspendState::default()
                    },
                    version: None,
                    store_error: Some(e.to_string()),
                }
            }
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.status().is_suspended()
    }

    // ── Triggers ────────────────────────────────────────────────────

    /// Record `trigger`, suspending if active.
    pub fn trigger(
        &self,
        trigger: Trigger,
        reason: impl Into<String>,
        by: Option<&Actor>,
    ) -> SuspendResult<SuspendState> {
        let reason = reason.into();
        let name = trigger.name();
        let state = self.commit(|state, now| {
            state.apply_trigger(trigger.clone(), reason.clone(), now, by.cloned());
            Ok(true)
        })?;
        warn!(
            trigger = name,
            reason = %reason,
            by = ?by.map(Actor::as_str),
            severity = ?state.severity,
            "suspend triggered"
        );
        Ok(state)
    }

    /// Manual suspension by an actor holding `trigger_suspend`.
    pub fn manual_suspend(
        &self,
        reason: impl Into<String>,
        actor: &Actor,
        policy: &Policy,
    ) -> SuspendResult<SuspendState> {
        if !policy.actor_can(actor, actions::TRIGGER_SUSPEND) {
            warn!(%actor, "manual suspend denied");
            return Err(SuspendError::NotAuthorized {
                actor: actor.to_string(),
                action: actions::TRIGGER_SUSPEND.to_string(),
            });
        }
        self.trigger(Trigger::Manual, reason, Some(actor))
    }

    /// Suspend on the first constitutional violation in `violations`.
    pub fn report_violations(
        &self,
        violations: &[Violation],
        by: Option<&Actor>,
    ) -> SuspendResult<Option<SuspendState>> {
        let Some(v) = violations.iter().find(|v| v.is_constitutional()) else {
            return Ok(None);
        };
        let total = violations.iter().filter(|v| v.is_constitutional()).count();
        let reason = if total > 1 {
            format!("{} (+{} more constitutional violations)", v.message, total - 1)
        } else {
            v.message.clone()
        };
        let trigger = Trigger::ConstitutionalViolation {
            rule: v.rule.clone(),
            kind: v.kind,
            subject: v.subject.clone(),
        };
        self.trigger(trigger, reason, by).map(Some)
    }

    /// Suspend when the budget's consumed fraction exceeds the trip fraction.
    pub fn report_budget(
        &self,
        fraction: f64,
        thresholds: &SuspendThresholds,
    ) -> SuspendResult<Option<SuspendState>> {
        if fraction <= thresholds.budget_trip_fraction {
            return Ok(None);
        }
        let trigger = Trigger::BudgetExceeded {
            fraction: fraction.is_finite().then_some(fraction),
            limit: thresholds.budget_trip_fraction,
        };
        let reason = format!(
            "risk budget {:.0}% consumed (limit {:.0}%)",
            fraction * 100.0,
            thresholds.budget_trip_fraction * 100.0
        );
        self.trigger(trigger, reason, None).map(Some)
    }

    /// Suspend when a health score falls below the floor.
    pub fn report_health(
        &self,
        score: f64,
        thresholds: &SuspendThresholds,
    ) -> SuspendResult<Option<SuspendState>> {
        // NaN from a broken feed counts as unhealthy.
        if score >= thresholds.health_floor {
            debug!(score, "health report within bounds");
            return Ok(None);
        }
        let trigger = Trigger::HealthBelowFloor {
            score: score.is_finite().then_some(score),
            floor: thresholds.health_floor,
        };
        let reason = format!(
            "health score {score} below floor {}",
            thresholds.health_floor
        );
        self.trigger(trigger, reason, None).map(Some)
    }

    /// Record a dry-run result. A pass resets the failure streak; a failure
    /// that pushes the streak past the limit suspends.
    pub fn record_simulation(
        &self,
        outcome: SimulationOutcome,
        thresholds: &SuspendThresholds,
    ) -> SuspendResult<SuspendState> {
        let limit = thresholds.max_consecutive_simulate_failures;
        let state = self.commit(|state, now| match outcome {
            SimulationOutcome::Passed => {
                let changed = state.consecutive_simulate_failures != 0;
                state.consecutive_simulate_failures = 0;
                Ok(changed)
            }
            SimulationOutcome::Failed => {
                state.consecutive_simulate_failures += 1;
                let consecutive = state.consecutive_simulate_failures;
                if consecutive > limit {
                    state.apply_trigger(
                        Trigger::SimulateFailures { consecutive, limit },
                        format!("{consecutive} consecutive dry-run failures (limit {limit})"),
                        now,
                        None,
                    );
                }
                Ok(true)
            }
        })?;
        debug!(
            ?outcome,
            consecutive = state.consecutive_simulate_failures,
            status = %state.status,
            "simulation recorded"
        );
        Ok(state)
    }

    // ── Unlock ──────────────────────────────────────────────────────

    /// Lift the suspension.
    ///
    /// Every signer must hold the `unlock` action, and together their roles
    /// must satisfy the policy's requirement for the suspension's severity.
    /// Having triggered the suspension confers nothing. On failure the
    /// record is left untouched.
    pub fn unlock(
        &self,
        request: &UnlockRequest,
        policy: &Policy,
        resolver: &dyn RoleResolver,
    ) -> SuspendResult<SuspendState> {
        if request.co_signer.as_ref() == Some(&request.actor) {
            return Err(SuspendError::DuplicateSigner);
        }
        let signers = request.signers();
        for signer in &signers {
            if !policy.actor_can(signer, actions::UNLOCK) {
                warn!(actor = %signer, "unlock denied: action not granted");
                return Err(SuspendError::NotAuthorized {
                    actor: signer.to_string(),
                    action: actions::UNLOCK.to_string(),
                });
            }
        }
        let signer_roles: Vec<_> = signers.iter().map(|a| resolver.roles_of(a)).collect();
        let requirements = &policy.document().suspend.unlock_requires;

        let state = self.commit(|state, now| {
            if !state.is_suspended() {
                return Err(SuspendError::NotSuspended);
            }
            let severity = state.severity.unwrap_or(SuspendSeverity::Standard);
            let required = match severity {
                SuspendSeverity::Standard => &requirements.standard,
                SuspendSeverity::Critical => &requirements.critical,
            };
            if !required.is_satisfied_by(&signer_roles) {
                return Err(SuspendError::InsufficientUnlockAuthority { severity });
            }
            state.apply_unlock(
                now,
                request.actor.clone(),
                request.co_signer.clone(),
                request.note.clone(),
            );
            Ok(true)
        });

        match &state {
            Ok(_) => info!(
                actor = %request.actor,
                co_signer = ?request.co_signer.as_ref().map(Actor::as_str),
                "suspension lifted"
            ),
            Err(e) => warn!(actor = %request.actor, error = %e, "unlock refused"),
        }
        state
    }

    // ── Internals ───────────────────────────────────────────────────

    /// Read → mutate → compare-and-swap until committed. `mutate` returns
    /// `false` for a no-op, which skips the write.
    fn commit<F>(&self, mut mutate: F) -> SuspendResult<SuspendState>
    where
        F: FnMut(&mut SuspendState, chrono::DateTime<chrono::Utc>) -> SuspendResult<bool>,
    {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let record = self.store.read()?;
            let mut state = record.value;
            if !mutate(&mut state, self.clock.now())? {
                return Ok(state);
            }
            match self.store.compare_and_swap(record.version, state.clone())? {
                CasOutcome::Committed { version } => {
                    debug!(version, "suspend record committed");
                    return Ok(state);
                }
                CasOutcome::Conflict { current } => {
                    debug!(attempt, current, "suspend record changed underneath; retrying");
                }
            }
        }
        Err(SuspendError::Contention(MAX_CAS_ATTEMPTS))
    }
}
