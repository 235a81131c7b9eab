//! # bulwark-types
//!
//! Shared model for the Bulwark governance engine.
//!
//! Every other Bulwark crate speaks in these types:
//!
//! - **Snapshots**: the schema / state-machine / migration facts a baseline
//!   records and a patch projects ([`Snapshot`]).
//! - **Patches**: ephemeral change proposals ([`Patch`], [`DiffStats`]).
//! - **Findings**: closed-kind violations and warnings ([`Violation`],
//!   [`Warning`], [`FindingKind`], [`CheckReport`]).
//! - **Checks**: the single capability every invariant check implements,
//!   plus the registry that drives them ([`GateCheck`], [`CheckRegistry`]).
//! - **Versioned stores**: read + compare-and-swap persistence for the
//!   shared mutable records ([`VersionedStore`]).
//! - **Identities**: actors, roles, actions and gate tiers.
//!
//! ## Shared mutable state
//!
//! ```text
//! ┌──────────────────────┐   read()            ┌─────────────┐
//! │ SuspendManager /     │ ──────────────────▶ │ Versioned<T>│
//! │ RiskLedger           │ ◀────────────────── │ { version } │
//! │                      │   compare_and_swap  └─────────────┘
//! └──────────────────────┘   (expected version)
//! ```

#![deny(unsafe_code)]

pub mod check;
pub mod clock;
pub mod error;
pub mod finding;
pub mod ids;
pub mod patch;
pub mod snapshot;
pub mod store;

pub use check::{CheckContext, CheckRegistry, GateCheck};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{StoreError, StoreResult};
pub use finding::{CheckReport, CheckTier, FindingKind, Severity, Subject, Violation, Warning};
pub use ids::{actions, Action, Actor, GateTier, ParseGateTierError, Role};
pub use patch::{DiffStats, Patch, PatchId};
pub use snapshot::{ParsedSnapshot, Snapshot, SnapshotError};
pub use store::{CasOutcome, InMemoryStore, JsonFileStore, Versioned, VersionedStore};
