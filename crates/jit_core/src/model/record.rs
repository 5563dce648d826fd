//! Compile-time record field descriptors.

use crate::aggregate::FieldAggregator;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Display rule applied when a changed value is humanized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleaningRule {
    /// Infer from the value kind.
    Auto,
    /// Referenced record -> its display string.
    Relation,
    /// Numeric -> up to two decimals, whole numbers without a fraction.
    Number,
    /// Timestamp/date -> `DD.MM.YYYY[ HH:MM:SS]`.
    Temporal,
    /// Falsy -> `-`, else string form.
    Text,
}

/// Extracts one field value from a record.
pub type FieldExtractor<R> = fn(&R) -> crate::model::value::Value;

/// Declares one snapshot field of record type `R`.
pub struct FieldDescriptor<R> {
    pub name: &'static str,
    pub label: &'static str,
    pub extract: FieldExtractor<R>,
    pub rule: CleaningRule,
}

/// A record that can be captured into a snapshot.
pub trait Record: Sized + 'static {
    /// Persisted identity; `None` for records not saved yet.
    fn record_id(&self) -> Option<Uuid>;

    /// Ordered field list captured by snapshots.
    fn fields() -> &'static [FieldDescriptor<Self>];

    /// Derived fields computed from the child collection.
    fn aggregators() -> Vec<FieldAggregator> {
        Vec::new()
    }

    /// Field name -> display label.
    fn label_map() -> BTreeMap<String, String> {
        Self::fields()
            .iter()
            .map(|field| (field.name.to_string(), field.label.to_string()))
            .collect()
    }

    /// Field name -> cleaning rule.
    fn cleaning_rules() -> BTreeMap<String, CleaningRule> {
        Self::fields()
            .iter()
            .map(|field| (field.name.to_string(), field.rule))
            .collect()
    }
}
