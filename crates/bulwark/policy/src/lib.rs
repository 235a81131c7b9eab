//! # bulwark-policy
//!
//! Policy store for the Bulwark governance engine.
//!
//! The policy document is the single source of authorization and thresholds:
//! who may do what, which paths are protected, how risk is scored and
//! budgeted, which error classes each gate tier may remediate, and what it
//! takes to lift a suspension.
//!
//! Documents are YAML or JSON. A document that fails validation is never
//! activated; [`PolicyStore`] keeps the previous valid policy in effect.

#![deny(unsafe_code)]

pub mod document;
pub mod error;
pub mod loader;
pub mod lookup;
pub mod resolver;
pub mod store;
pub mod validate;

pub use document::{
    Escalation, GateTiers, PolicyDocument, ProtectedPathRule, RiskBudget, RiskPolicy,
    SeverityWeights, SizeThreshold, SuspendPolicy, SuspendThresholds, TierPolicy,
    UnlockRequirement, UnlockRequires,
};
pub use error::{PolicyError, PolicyResult, SchemaError};
pub use loader::{load_path, parse_str, LoadedPolicy, PolicyFormat};
pub use lookup::get_path;
pub use resolver::{RoleResolver, StaticRoles};
pub use store::{Policy, PolicyStore};
pub use validate::validate;
