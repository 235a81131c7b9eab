//! Identity types: actors, roles, actions, and gate tiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Actor ───────────────────────────────────────────────────────────────

/// An identity that can request actions (human operator or automation).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(String);

impl Actor {
    /// Create an actor from its identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Actor {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Actor {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ── Role ────────────────────────────────────────────────────────────────

/// A named role an actor can hold (e.g. `sre`, `security`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Create a role from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The role name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ── Action ──────────────────────────────────────────────────────────────

/// Well-known action names referenced by the engine.
pub mod actions {
    /// Manually suspend autonomous changes.
    pub const TRIGGER_SUSPEND: &str = "trigger_suspend";
    /// Lift a suspension.
    pub const UNLOCK: &str = "unlock";
    /// Replace a named baseline snapshot.
    pub const UPDATE_BASELINE: &str = "update_baseline";
    /// Record human approval for a top-tier whitelist entry.
    pub const APPROVE_WHITELIST: &str = "approve_whitelist";
    /// Submit patches for evaluation.
    pub const PROPOSE_PATCH: &str = "propose_patch";
    /// Report dry-run outcomes and health scores.
    pub const REPORT_SIGNALS: &str = "report_signals";

    /// Every action the policy document may grant.
    pub const ALL: &[&str] = &[
        TRIGGER_SUSPEND,
        UNLOCK,
        UPDATE_BASELINE,
        APPROVE_WHITELIST,
        PROPOSE_PATCH,
        REPORT_SIGNALS,
    ];
}

/// An action an actor may be permitted to perform.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action(String);

impl Action {
    /// Create an action from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The action name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is one of the actions in [`actions::ALL`].
    pub fn is_known(&self) -> bool {
        actions::ALL.contains(&self.0.as_str())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Action {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ── Gate Tier ───────────────────────────────────────────────────────────

/// Escalating tiers of autonomous-fix authority.
///
/// Totally ordered `A < B < C`; whitelists widen monotonically with the tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GateTier {
    /// Minimal fixed set of remediations.
    A,
    /// Adds narrowly-scoped classes.
    B,
    /// Widest tier; newly introduced entries need human approval.
    C,
}

impl GateTier {
    /// All tiers in ascending order.
    pub const ALL: [GateTier; 3] = [GateTier::A, GateTier::B, GateTier::C];

    /// Tiers from `A` up to and including `self`.
    pub fn and_below(self) -> impl Iterator<Item = GateTier> {
        Self::ALL.into_iter().filter(move |t| *t <= self)
    }
}

impl fmt::Display for GateTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
            Self::C => write!(f, "C"),
        }
    }
}

/// Error parsing a [`GateTier`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown gate tier '{0}' (expected A, B or C)")]
pub struct ParseGateTierError(pub String);

impl FromStr for GateTier {
    type Err = ParseGateTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Self::A),
            "B" | "b" => Ok(Self::B),
            "C" | "c" => Ok(Self::C),
            other => Err(ParseGateTierError(other.to_string())),
        }
    }
}
