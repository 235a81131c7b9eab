//! Typed policy document.
//!
//! Every section carries serde defaults so a partially written document
//! still deserializes; completeness is enforced by validation, which looks
//! at the raw document to tell an absent section from a defaulted one.

use std::collections::{BTreeMap, BTreeSet};

use bulwark_types::{Action, Actor, GateTier, Role, Severity};
use serde::{Deserialize, Serialize};

/// The authorization and threshold document consumed by every component.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDocument {
    /// Declared role names.
    #[serde(default)]
    pub roles: BTreeSet<Role>,
    #[serde(default)]
    pub actor_roles: BTreeMap<Actor, BTreeSet<Role>>,
    #[serde(default)]
    pub actor_permissions: BTreeMap<Actor, BTreeSet<Action>>,
    /// Evaluated in document order; order breaks severity ties.
    #[serde(default)]
    pub protected_paths: Vec<ProtectedPathRule>,
    #[serde(default)]
    pub risk: RiskPolicy,
    /// Absent means the built-in whitelist table applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_tiers: Option<GateTiers>,
    #[serde(default)]
    pub suspend: SuspendPolicy,
}

impl PolicyDocument {
    // ── Builders ────────────────────────────────────────────────────

    pub fn with_role(mut self, role: &str) -> Self {
        self.roles.insert(Role::new(role));
        self
    }

    /// Register an actor with its roles and granted actions.
    pub fn with_actor(mut self, actor: &str, roles: &[&str], actions: &[&str]) -> Self {
        let actor = Actor::new(actor);
        self.actor_roles
            .insert(actor.clone(), roles.iter().map(|r| Role::new(*r)).collect());
        self.actor_permissions
            .insert(actor, actions.iter().map(|a| Action::new(*a)).collect());
        self
    }

    pub fn with_protected_path(mut self, glob: &str, severity: Severity, rule: &str) -> Self {
        self.protected_paths.push(ProtectedPathRule {
            glob: glob.to_string(),
            severity,
            rule: rule.to_string(),
        });
        self
    }

    pub fn with_risk(mut self, risk: RiskPolicy) -> Self {
        self.risk = risk;
        self
    }

    pub fn with_gate_tiers(mut self, tiers: GateTiers) -> Self {
        self.gate_tiers = Some(tiers);
        self
    }

    pub fn with_unlock_requirements(
        mut self,
        standard: UnlockRequirement,
        critical: UnlockRequirement,
    ) -> Self {
        self.suspend.unlock_requires = UnlockRequires { standard, critical };
        self
    }

    pub fn with_suspend_thresholds(mut self, thresholds: SuspendThresholds) -> Self {
        self.suspend.thresholds = thresholds;
        self
    }
}

// ── Protected paths ─────────────────────────────────────────────────────

/// A glob over repository paths with the severity of touching it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedPathRule {
    pub glob: String,
    pub severity: Severity,
    /// Rule name reported on a match.
    pub rule: String,
}

// ── Risk ────────────────────────────────────────────────────────────────

/// Risk scoring parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskPolicy {
    pub budget: RiskBudget,
    /// Threshold when the budget is untouched; shrinks as it is consumed.
    pub base_threshold: f64,
    pub weights: SeverityWeights,
    pub size_thresholds: Vec<SizeThreshold>,
    /// Patches touching more files than this pay `many_files_penalty`.
    pub many_files_threshold: u32,
    pub many_files_penalty: f64,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            budget: RiskBudget::default(),
            base_threshold: 0.7,
            weights: SeverityWeights::default(),
            size_thresholds: vec![
                SizeThreshold::new(10, 0.02),
                SizeThreshold::new(100, 0.05),
                SizeThreshold::new(500, 0.15),
                SizeThreshold::new(1000, 0.3),
            ],
            many_files_threshold: 20,
            many_files_penalty: 0.1,
        }
    }
}

/// Rolling risk budget.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskBudget {
    /// Cumulative accepted score allowed per window.
    pub max: f64,
    pub window_seconds: u64,
}

impl Default for RiskBudget {
    fn default() -> Self {
        Self {
            max: 2.0,
            window_seconds: 86_400,
        }
    }
}

/// Score added per file for its winning protected-path match.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityWeights {
    pub warning: f64,
    pub major: f64,
    pub constitutional: f64,
}

impl SeverityWeights {
    pub fn weight(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Warning => self.warning,
            Severity::Major => self.major,
            Severity::Constitutional => self.constitutional,
        }
    }
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            warning: 0.05,
            major: 0.25,
            constitutional: 1.0,
        }
    }
}

/// Score contributed once a patch touches at least `min_lines` lines.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeThreshold {
    pub min_lines: u64,
    pub score: f64,
}

impl SizeThreshold {
    pub fn new(min_lines: u64, score: f64) -> Self {
        Self { min_lines, score }
    }
}

// ── Gate tiers ──────────────────────────────────────────────────────────

/// Whitelist membership and escalation per gate tier.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GateTiers {
    #[serde(rename = "A", default)]
    pub a: TierPolicy,
    #[serde(rename = "B", default)]
    pub b: TierPolicy,
    #[serde(rename = "C", default)]
    pub c: TierPolicy,
}

impl GateTiers {
    pub fn tier(&self, tier: GateTier) -> &TierPolicy {
        match tier {
            GateTier::A => &self.a,
            GateTier::B => &self.b,
            GateTier::C => &self.c,
        }
    }

    pub fn tier_mut(&mut self, tier: GateTier) -> &mut TierPolicy {
        match tier {
            GateTier::A => &mut self.a,
            GateTier::B => &mut self.b,
            GateTier::C => &mut self.c,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierPolicy {
    /// Error classes this tier may remediate automatically.
    pub whitelist: Vec<String>,
    pub escalation: Escalation,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Escalation {
    /// Entries introduced at this tier need a recorded approval.
    pub requires_human_approval: bool,
    pub min_approvers: u32,
}

// ── Suspend ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuspendPolicy {
    pub unlock_requires: UnlockRequires,
    pub thresholds: SuspendThresholds,
}

/// Unlock requirement per suspension severity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnlockRequires {
    pub standard: UnlockRequirement,
    pub critical: UnlockRequirement,
}

/// Roles the unlocking signers must jointly hold.
///
/// Satisfied when at least `min_signers` distinct signers take part, one of
/// them holds a role from `any_role` (if non-empty), and every role in
/// `all_roles` is held by some signer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnlockRequirement {
    pub any_role: BTreeSet<Role>,
    pub all_roles: BTreeSet<Role>,
    pub min_signers: u32,
}

impl UnlockRequirement {
    /// One signer holding any of `roles`.
    pub fn any_of(roles: &[&str]) -> Self {
        Self {
            any_role: roles.iter().map(|r| Role::new(*r)).collect(),
            ..Self::default()
        }
    }

    /// Signers jointly holding every role in `roles`.
    pub fn all_of(roles: &[&str], min_signers: u32) -> Self {
        Self {
            all_roles: roles.iter().map(|r| Role::new(*r)).collect(),
            min_signers,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.any_role.is_empty() && self.all_roles.is_empty()
    }

    /// Every role this requirement mentions.
    pub fn referenced_roles(&self) -> impl Iterator<Item = &Role> {
        self.any_role.iter().chain(self.all_roles.iter())
    }

    /// Whether the union of signer role sets satisfies the requirement.
    pub fn is_satisfied_by(&self, signer_roles: &[BTreeSet<Role>]) -> bool {
        if self.is_empty() || (signer_roles.len() as u32) < self.min_signers {
            return false;
        }
        let any_ok = self.any_role.is_empty()
            || signer_roles
                .iter()
                .any(|roles| roles.iter().any(|r| self.any_role.contains(r)));
        let all_ok = self
            .all_roles
            .iter()
            .all(|required| signer_roles.iter().any(|roles| roles.contains(required)));
        any_ok && all_ok
    }
}

impl Default for UnlockRequirement {
    fn default() -> Self {
        Self {
            any_role: BTreeSet::new(),
            all_roles: BTreeSet::new(),
            min_signers: 1,
        }
    }
}

/// Trigger thresholds for automatic suspension.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuspendThresholds {
    /// Suspend once consumed / max exceeds this fraction.
    pub budget_trip_fraction: f64,
    /// Suspend once consecutive simulate failures exceed this count.
    pub max_consecutive_simulate_failures: u32,
    /// Suspend when a health score falls below this floor.
    pub health_floor: f64,
}

impl Default for SuspendThresholds {
    fn default() -> Self {
        Self {
            budget_trip_fraction: 0.8,
            max_consecutive_simulate_failures: 2,
            health_floor: 60.0,
        }
    }
}
