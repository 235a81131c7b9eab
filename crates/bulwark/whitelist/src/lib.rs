//! # bulwark-whitelist
//!
//! Maps error classes to the minimum gate tier allowed to remediate them
//! automatically.
//!
//! ```text
//!   A ⊆ B ⊆ C
//!   lint_failure            ──▶ A B C
//!   config_typo             ──▶   B C
//!   feature_flag_rollback   ──▶     C  (after approval)
//! ```

#![deny(unsafe_code)]

pub mod error;
pub mod manager;
pub mod table;

pub use error::{WhitelistError, WhitelistResult};
pub use manager::{Approval, ApprovalLedger, ApprovalRecord, WhitelistEntry, WhitelistManager};
pub use table::builtin_tiers;
