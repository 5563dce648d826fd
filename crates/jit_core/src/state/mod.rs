//! Record state capture and change detection.
//!
//! # Responsibility
//! - Capture a record (and optionally its aggregated children) into a flat
//!   ordered [`Snapshot`].
//! - Compute the field-level [`Diff`] between two snapshots.
//!
//! # Invariants
//! - Capture is deterministic: two snapshots of an unmutated record are equal.
//! - Capture never performs storage I/O unless a child source is passed in
//!   explicitly.

pub mod diff;
pub mod snapshot;

pub use diff::{compute_diff, Diff, FieldChange};
pub use snapshot::{
    capture_children, capture_snapshot, capture_snapshot_with_relation, ChildSource, Snapshot,
    SnapshotError, RELATED_OBJECTS_KEY,
};
