//! Derived-field aggregation over child record collections.
//!
//! # Responsibility
//! - Reduce a list of child snapshots into one derived parent field.
//! - Enforce per-processor accepted value kinds before reducing.
//!
//! # Invariants
//! - Processors are immutable once built and carry their configuration as data.
//! - An empty child list yields the reduction identity, never an error.

pub mod processor;

pub use processor::{AggregateError, AggregateRule, FieldAggregator, Rounding};
