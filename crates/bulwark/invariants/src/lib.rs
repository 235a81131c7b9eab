//! # bulwark-invariants
//!
//! Tier-0 invariant checks over a baseline and a current snapshot.
//!
//! ```text
//!   baseline ─┐
//!             ├─▶ event_schema_immutability  ─┐
//!   current  ─┤─▶ state_machine_monotonicity ─┼─▶ CheckReport
//!             └─▶ migration_reversibility    ─┘
//! ```
//!
//! Each check runs independently; a malformed or missing section only
//! downgrades its own check to a skip warning. Sandboxed migration replay
//! runs asynchronously and reports later (see [`replay`]).

#![deny(unsafe_code)]

pub mod engine;
pub mod migrations;
pub mod replay;
pub mod schema;
pub mod state_machine;

pub use engine::{default_checks, InvariantEngine};
pub use migrations::MigrationReversibility;
pub use replay::{spawn_replay_verification, ReplayFailure, ReplayHandle, ReplayVerifier};
pub use schema::EventSchemaImmutability;
pub use state_machine::StateMachineMonotonicity;
