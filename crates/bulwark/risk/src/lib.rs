//! # bulwark-risk
//!
//! Risk assessment for proposed patches.
//!
//! - [`check_files`]: protected-path classification only, for pre-flight
//!   queries.
//! - [`assess`]: pure scoring against the policy and a budget ledger.
//! - [`RiskEngine`]: scoring plus the shared rolling budget, charged with
//!   compare-and-swap on acceptance.

#![deny(unsafe_code)]

pub mod assess;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod matcher;

pub use assess::{assess, assess_with, RiskAssessment, ScoreBreakdown};
pub use engine::RiskEngine;
pub use error::{RiskError, RiskResult};
pub use ledger::{BudgetLedger, BudgetStatus};
pub use matcher::{check_files, PathClassification, PathMatch, ProtectedPathMatcher};
