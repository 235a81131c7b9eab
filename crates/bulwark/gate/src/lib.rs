//! # bulwark-gate
//!
//! Drives a patch proposal through the Bulwark components and renders a
//! single allow / block decision with structured reasoning.
//!
//! - [`PatchGate`]: the control-flow driver, remediation gating, and the
//!   simulation / health signal inputs.
//! - [`BaselineRegistry`]: named, atomically replaced baselines.
//! - [`GateDecision`] / [`BlockReason`]: what callers act on.

#![deny(unsafe_code)]

pub mod baseline;
pub mod decision;
pub mod error;
pub mod gate;

pub use baseline::BaselineRegistry;
pub use decision::{BlockReason, GateDecision, RemediationDecision};
pub use error::{GateError, GateResult};
pub use gate::PatchGate;
