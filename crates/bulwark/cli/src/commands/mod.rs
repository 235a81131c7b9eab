//! Command implementations

pub mod gate;
pub mod invariants;
pub mod policy;
pub mod risk;
pub mod signals;
pub mod suspend;
pub mod whitelist;
