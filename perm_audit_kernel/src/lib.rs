#![forbid(unsafe_code)]

//! Permission audit kernel.
//!
//! Pure and deterministic: turns ordered, decoded AccessControl and
//! AccessManager events into snapshots. No I/O lives here.

/// Version of the canonical snapshot serialization.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

pub mod domain;
pub mod engine;
pub mod error;
pub mod events;
pub mod hashing;
pub mod invariants;
pub mod roles;
pub mod state;
pub mod transitions;
