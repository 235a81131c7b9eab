//! The patch gate: one control-flow driver over every component.
//!
//! ```text
//!   policy ─▶ suspend? ─▶ baseline ─▶ risk ─▶ invariants ─▶ decision
//!               │            │          │          │
//!               ▼            ▼          ▼          ▼
//!           suspended    baseline   risk_exceeded  constitutional_violation
//!                        _missing   constitutional_path      │
//!                                       │                    │
//!                     budget fraction ──┴──▶ SuspendManager ◀┘
//! ```
//!
//! Risk acceptance charges the budget before invariants run, so a patch
//! later blocked by an invariant still counts against the window. A patch
//! with no projected snapshot is charged, then blocked as
//! `projection_missing`.

use std::sync::Arc;
use std::time::Duration;

use bulwark_invariants::{spawn_replay_verification, InvariantEngine, ReplayHandle, ReplayVerifier};
use bulwark_policy::{Policy, PolicyStore};
use bulwark_risk::{RiskEngine, RiskError};
use bulwark_suspend::{SimulationOutcome, SuspendManager, SuspendState, SuspendStatus};
use bulwark_types::{Actor, CheckReport, FindingKind, GateTier, Patch, Subject, Warning};
use bulwark_whitelist::WhitelistManager;
use tracing::{debug, error, info, warn};

use crate::baseline::BaselineRegistry;
use crate::decision::{BlockReason, GateDecision, RemediationDecision};
use crate::error::{GateError, GateResult};

pub const RULE: &str = "gate";

pub struct PatchGate {
    policy: Arc<PolicyStore>,
    baselines: Arc<BaselineRegistry>,
    invariants: InvariantEngine,
    risk: RiskEngine,
    suspend: SuspendManager,
    whitelist: WhitelistManager,
    replay: Option<Arc<dyn ReplayVerifier>>,
}

impl PatchGate {
    pub fn new(
        policy: Arc<PolicyStore>,
        baselines: Arc<BaselineRegistry>,
        risk: RiskEngine,
        suspend: SuspendManager,
        whitelist: WhitelistManager,
    ) -> Self {
        Self {
            policy,
            baselines,
            invariants: InvariantEngine::new(),
            risk,
            suspend,
            whitelist,
            replay: None,
        }
    }

    /// Every shared record in memory.
    pub fn in_memory(policy: Policy, baselines: BaselineRegistry) -> Self {
        let whitelist = WhitelistManager::in_memory(&policy);
        Self::new(
            Arc::new(PolicyStore::new(policy)),
            Arc::new(baselines),
            RiskEngine::in_memory(),
            SuspendManager::in_memory(),
            whitelist,
        )
    }

    /// Replace the invariant engine (extra checks, custom registry).
    pub fn with_invariants(mut self, invariants: InvariantEngine) -> Self {
        self.invariants = invariants;
        self
    }

    pub fn with_replay_verifier(mut self, verifier: Arc<dyn ReplayVerifier>) -> Self {
        self.replay = Some(verifier);
        self
    }

    pub fn policy(&self) -> &PolicyStore {
        &self.policy
    }

    pub fn baselines(&self) -> &BaselineRegistry {
        &self.baselines
    }

    pub fn risk(&self) -> &RiskEngine {
        &self.risk
    }

    pub fn suspend(&self) -> &SuspendManager {
        &self.suspend
    }

    /// The whitelist, synced to the active policy's tiers.
    pub fn whitelist(&self) -> &WhitelistManager {
        self.whitelist.sync_policy(&self.policy.current());
        &self.whitelist
    }

    // ── Evaluation ──────────────────────────────────────────────────

    /// Decide whether `patch` may be applied on top of `baseline_name`.
    ///
    /// Blocking outcomes come back as a decision; only store and I/O
    /// failures are errors.
    pub fn evaluate(&self, baseline_name: &str, patch: &Patch) -> GateResult<GateDecision> {
        let policy = self.policy.current();

        let view = self.suspend.status();
        if view.is_suspended() {
            let reason = view.state.reason.clone().unwrap_or_default();
            info!(patch = %patch.id, reason = %reason, "evaluation short-circuited: system suspended");
            return Ok(GateDecision::blocked(
                patch.id,
                baseline_name,
                BlockReason::Suspended,
                format!("system is suspended: {reason}"),
                SuspendStatus::Suspended,
            ));
        }

        let baseline = match self.baselines.get(baseline_name) {
            Ok(b) => b,
            Err(GateError::BaselineNotFound(_)) => {
                warn!(patch = %patch.id, baseline = baseline_name, "no such baseline");
                return Ok(GateDecision::blocked(
                    patch.id,
                    baseline_name,
                    BlockReason::BaselineMissing,
                    format!("baseline '{baseline_name}' not found"),
                    SuspendStatus::Active,
                ));
            }
            Err(e) => return Err(e),
        };

        let risk = match self.risk.assess(patch, &policy) {
            Ok(r) => r,
            Err(e @ RiskError::Glob { .. }) => {
                error!(patch = %patch.id, error = %e, "active policy cannot be applied");
                return Ok(GateDecision::blocked(
                    patch.id,
                    baseline_name,
                    BlockReason::PolicyInvalid,
                    e.to_string(),
                    SuspendStatus::Active,
                ));
            }
            Err(e) => return Err(e.into()),
        };
        let mut report = risk.report.clone();

        if !risk.allowed {
            let block = if risk.has_constitutional_match() {
                BlockReason::ConstitutionalPath
            } else {
                BlockReason::RiskExceeded
            };
            return Ok(self.finish(patch, baseline_name, Some(block), risk.reason.clone(), Some(risk), report));
        }

        // Accepted by risk, so the ledger was charged.
        self.feed_budget(&policy);

        let Some(current) = &patch.projected else {
            let message = "patch carries no projected snapshot; invariant checks cannot run";
            warn!(patch = %patch.id, "no projected snapshot; blocking");
            report.push_warning(Warning::new(
                RULE,
                FindingKind::ProjectionMissing,
                Subject::Check {
                    check: "invariants".into(),
                },
                message,
            ));
            return Ok(self.finish(
                patch,
                baseline_name,
                Some(BlockReason::ProjectionMissing),
                message.to_string(),
                Some(risk),
                report,
            ));
        };

        let findings = self.invariants.evaluate(&baseline, current);
        let constitutional = findings.has_constitutional();
        if constitutional {
            self.feed_violations(&findings);
        }
        report.extend(findings);
        let block = constitutional.then_some(BlockReason::ConstitutionalViolation);

        let message = match block {
            Some(_) => {
                let v = report.constitutional().next();
                v.map(|v| v.message.clone()).unwrap_or_default()
            }
            None => risk.reason.clone(),
        };
        Ok(self.finish(patch, baseline_name, block, message, Some(risk), report))
    }

    /// [`evaluate`](Self::evaluate) on the blocking pool under a deadline.
    /// A missed deadline is a block.
    pub async fn evaluate_with_deadline(
        self: &Arc<Self>,
        baseline_name: &str,
        patch: Patch,
        deadline: Duration,
    ) -> GateResult<GateDecision> {
        let gate = Arc::clone(self);
        let name = baseline_name.to_string();
        let patch_id = patch.id;
        let task = tokio::task::spawn_blocking(move || gate.evaluate(&name, &patch));

        match tokio::time::timeout(deadline, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(GateError::TaskFailed(join.to_string())),
            Err(_) => {
                warn!(patch = %patch_id, ?deadline, "evaluation deadline exceeded; blocking");
                Ok(GateDecision::blocked(
                    patch_id,
                    baseline_name,
                    BlockReason::TimedOut,
                    format!("evaluation exceeded {}ms deadline", deadline.as_millis()),
                    self.suspend.status().state.status,
                ))
            }
        }
    }

    /// Start sandboxed migration replay for `patch`, if a verifier is set
    /// and the patch carries a projection. Must run inside a tokio runtime.
    pub fn start_replay(
        &self,
        baseline_name: &str,
        patch: &Patch,
        timeout: Duration,
    ) -> GateResult<Option<ReplayHandle>> {
        let (Some(verifier), Some(current)) = (&self.replay, &patch.projected) else {
            return Ok(None);
        };
        let baseline = self.baselines.get(baseline_name)?;
        debug!(patch = %patch.id, verifier = verifier.name(), "replay verification started");
        Ok(Some(spawn_replay_verification(
            Arc::clone(verifier),
            baseline,
            Arc::new(current.clone()),
            timeout,
        )))
    }

    // ── Signals ─────────────────────────────────────────────────────

    pub fn record_simulation(&self, outcome: SimulationOutcome) -> GateResult<SuspendState> {
        let policy = self.policy.current();
        Ok(self
            .suspend
            .record_simulation(outcome, &policy.document().suspend.thresholds)?)
    }

    pub fn report_health(&self, score: f64) -> GateResult<Option<SuspendState>> {
        let policy = self.policy.current();
        Ok(self
            .suspend
            .report_health(score, &policy.document().suspend.thresholds)?)
    }

    /// Whether an automatic fix for `error_class` may run at `tier`.
    pub fn propose_remediation(&self, error_class: &str, tier: GateTier) -> RemediationDecision {
        self.whitelist.sync_policy(&self.policy.current());
        let min_gate_tier = self.whitelist.min_tier(error_class);
        let (allowed, reason) = if self.suspend.is_suspended() {
            (false, "system is suspended".to_string())
        } else if self.whitelist.is_whitelisted(error_class, tier) {
            (true, format!("'{error_class}' is whitelisted at tier {tier}"))
        } else {
            let reason = match min_gate_tier {
                None => format!("'{error_class}' is not whitelisted at any tier"),
                Some(min) if min > tier => {
                    format!("'{error_class}' requires tier {min} or above")
                }
                Some(_) => format!("'{error_class}' is awaiting approval"),
            };
            (false, reason)
        };
        info!(error_class, %tier, allowed, reason = %reason, "remediation proposal");
        RemediationDecision {
            error_class: error_class.to_string(),
            tier,
            allowed,
            min_gate_tier,
            reason,
        }
    }

    /// Manual suspension via the active policy.
    pub fn manual_suspend(&self, reason: &str, actor: &Actor) -> GateResult<SuspendState> {
        let policy = self.policy.current();
        Ok(self.suspend.manual_suspend(reason, actor, &policy)?)
    }

    // ── Internals ───────────────────────────────────────────────────

    fn finish(
        &self,
        patch: &Patch,
        baseline: &str,
        block: Option<BlockReason>,
        message: String,
        risk: Option<bulwark_risk::RiskAssessment>,
        report: CheckReport,
    ) -> GateDecision {
        let decision = GateDecision {
            patch: patch.id,
            baseline: baseline.to_string(),
            allowed: block.is_none(),
            block,
            message,
            risk,
            report,
            suspend: self.suspend.status().state.status,
        };
        info!(
            patch = %patch.id,
            baseline,
            allowed = decision.allowed,
            block = ?decision.block,
            violations = decision.report.violations.len(),
            warnings = decision.report.warnings.len(),
            "gate decision"
        );
        decision
    }

    fn feed_violations(&self, report: &CheckReport) {
        if let Err(e) = self.suspend.report_violations(&report.violations, None) {
            error!(error = %e, "could not record constitutional violation");
        }
    }

    fn feed_budget(&self, policy: &Policy) {
        let fraction = match self.risk.consumed_fraction(policy) {
            Ok(f) => f,
            Err(e) => {
                error!(error = %e, "could not read risk budget");
                return;
            }
        };
        let thresholds = &policy.document().suspend.thresholds;
        if let Err(e) = self.suspend.report_budget(fraction, thresholds) {
            error!(error = %e, fraction, "could not record budget trip");
        }
    }
}
