//! # bulwark-suspend
//!
//! The singleton Active/Suspended record that halts autonomous changes.
//!
//! Every other component, and every autonomous-change proposer, checks
//! [`SuspendManager::status`] before acting. Unreadable state reports
//! `Suspended`.

#![deny(unsafe_code)]

pub mod error;
pub mod manager;
pub mod state;

pub use error::{SuspendError, SuspendResult};
pub use manager::{SimulationOutcome, SuspendManager, SuspendView, UnlockRequest};
pub use state::{HistoryEntry, SuspendSeverity, SuspendState, SuspendStatus, Trigger};
