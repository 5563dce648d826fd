//! Ordered field snapshots.

use crate::aggregate::AggregateError;
use crate::model::record::Record;
use crate::model::value::Value;
use crate::repo::RepoError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Placeholder key holding child identities until aggregators replace it.
pub const RELATED_OBJECTS_KEY: &str = "related_objects";

/// Snapshot capture errors.
#[derive(Debug)]
pub enum SnapshotError {
    Aggregate(AggregateError),
    Repo(RepoError),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aggregate(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Aggregate(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<AggregateError> for SnapshotError {
    fn from(value: AggregateError) -> Self {
        Self::Aggregate(value)
    }
}

impl From<RepoError> for SnapshotError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Ordered mapping from field name to value.
///
/// Re-inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    entries: Vec<(String, Value)>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Inserts or replaces `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(name, _)| *name == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(name, _)| name == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Value)> for Snapshot {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut snapshot = Self::new();
        for (key, value) in iter {
            snapshot.insert(key, value);
        }
        snapshot
    }
}

/// Loads a record's child collection for a named relation.
pub trait ChildSource<R: Record> {
    fn load_children(&self, record: &R, relation: &str) -> Result<Vec<Snapshot>, RepoError>;
}

/// Captures every declared field of `record`.
///
/// When `children` is supplied, the child identities are stored under
/// [`RELATED_OBJECTS_KEY`]; if the record declares aggregators, that
/// placeholder is replaced by one entry per derived field.
///
/// # Errors
/// - `Aggregate` when a child field fails the aggregator's type check.
pub fn capture_snapshot<R: Record>(
    record: &R,
    children: Option<&[Snapshot]>,
) -> Result<Snapshot, SnapshotError> {
    let mut snapshot: Snapshot = R::fields()
        .iter()
        .map(|field| (field.name.to_string(), (field.extract)(record)))
        .collect();

    let Some(children) = children else {
        return Ok(snapshot);
    };

    let child_ids = children
        .iter()
        .map(|child| child.get("id").cloned().unwrap_or(Value::Null))
        .collect();
    snapshot.insert(RELATED_OBJECTS_KEY, Value::List(child_ids));

    let aggregators = R::aggregators();
    if aggregators.is_empty() {
        return Ok(snapshot);
    }

    snapshot.remove(RELATED_OBJECTS_KEY);
    for aggregator in &aggregators {
        let (name, value) = aggregator.compute(children)?;
        snapshot.insert(name, value);
    }
    debug!(
        "event=snapshot_capture module=state status=ok fields={} children={} aggregators={}",
        snapshot.len(),
        children.len(),
        aggregators.len()
    );

    Ok(snapshot)
}

/// Captures each child record without nested children.
pub fn capture_children<C: Record>(children: &[C]) -> Vec<Snapshot> {
    children
        .iter()
        .map(|child| {
            C::fields()
                .iter()
                .map(|field| (field.name.to_string(), (field.extract)(child)))
                .collect()
        })
        .collect()
}

/// Captures `record` with its children resolved through `source`.
///
/// Unsaved records (no identity yet) use an empty child collection and
/// never touch `source`.
pub fn capture_snapshot_with_relation<R, S>(
    record: &R,
    source: &S,
    relation: &str,
) -> Result<Snapshot, SnapshotError>
where
    R: Record,
    S: ChildSource<R> + ?Sized,
{
    let children = if record.record_id().is_some() {
        source.load_children(record, relation)?
    } else {
        Vec::new()
    };
    capture_snapshot(record, Some(&children))
}
