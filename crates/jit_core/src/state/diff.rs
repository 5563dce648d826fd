//! Field-level difference between two snapshots.

use crate::model::value::Value;
use crate::state::snapshot::Snapshot;
use serde::{Deserialize, Serialize};

/// One changed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old: Value,
    pub new: Value,
}

/// Ordered set of changed fields.
///
/// Order: new-snapshot keys first, then keys only present in the old snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diff {
    changes: Vec<FieldChange>,
}

impl Diff {
    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.changes.iter().find(|change| change.field == field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Drops one field from the diff, returning it when present.
    pub fn remove(&mut self, field: &str) -> Option<FieldChange> {
        let index = self.changes.iter().position(|change| change.field == field)?;
        Some(self.changes.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldChange> {
        self.changes.iter()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(|change| change.field.as_str())
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Old value of `field` if it changed, else `None`.
    pub fn old_value(&self, field: &str) -> Option<&Value> {
        self.get(field).map(|change| &change.old)
    }
}

impl IntoIterator for Diff {
    type Item = FieldChange;
    type IntoIter = std::vec::IntoIter<FieldChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

/// Computes fields whose values differ between `old` and `new`.
///
/// A key missing from one side compares as `Value::Null`.
pub fn compute_diff(old: &Snapshot, new: &Snapshot) -> Diff {
    let mut changes = Vec::new();

    for (key, new_value) in new.iter() {
        let old_value = old.get(key).unwrap_or(&Value::Null);
        if old_value != new_value {
            changes.push(FieldChange {
                field: key.to_string(),
                old: old_value.clone(),
                new: new_value.clone(),
            });
        }
    }

    for (key, old_value) in old.iter() {
        if new.contains_key(key) {
            continue;
        }
        if *old_value != Value::Null {
            changes.push(FieldChange {
                field: key.to_string(),
                old: old_value.clone(),
                new: Value::Null,
            });
        }
    }

    Diff { changes }
}
