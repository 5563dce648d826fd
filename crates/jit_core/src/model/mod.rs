//! Domain values, record contracts and logistics entities.
//!
//! # Responsibility
//! - Define the value shape captured into snapshots.
//! - Declare per-record field descriptors at compile time.
//!
//! # Invariants
//! - Every snapshot-able record lists its fields explicitly; no runtime
//!   introspection is used.

pub mod entities;
pub mod record;
pub mod value;
