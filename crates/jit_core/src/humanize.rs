//! Display projection of diffs.
//!
//! # Responsibility
//! - Turn raw old/new values into labeled display strings.
//! - Produce table-ready rows for change notifications.
//!
//! # Invariants
//! - Output order equals diff order.
//! - Unknown fields fall back to the raw field key as label and `Auto` cleaning.

use crate::model::record::{CleaningRule, Record};
use crate::model::value::{Value, EMPTY_DISPLAY};
use crate::state::diff::Diff;
use std::collections::BTreeMap;

/// One display-ready change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanizedChange {
    pub label: String,
    pub old: String,
    pub new: String,
}

impl HumanizedChange {
    /// `[label, old, new]` as table cell values.
    pub fn into_row(self) -> Vec<Value> {
        vec![
            Value::Text(self.label),
            Value::Text(self.old),
            Value::Text(self.new),
        ]
    }
}

/// Maps every diff entry through labels and cleaning rules.
pub fn humanize(
    diff: &Diff,
    labels: &BTreeMap<String, String>,
    rules: &BTreeMap<String, CleaningRule>,
) -> Vec<HumanizedChange> {
    diff.iter()
        .map(|change| {
            let rule = rules
                .get(&change.field)
                .copied()
                .unwrap_or(CleaningRule::Auto);
            HumanizedChange {
                label: labels
                    .get(&change.field)
                    .cloned()
                    .unwrap_or_else(|| change.field.clone()),
                old: clean_value(&change.old, rule),
                new: clean_value(&change.new, rule),
            }
        })
        .collect()
}

/// Humanizes using the labels and rules declared by record type `R`.
pub fn humanize_record<R: Record>(diff: &Diff) -> Vec<HumanizedChange> {
    humanize(diff, &R::label_map(), &R::cleaning_rules())
}

/// Flattens changes into `[label, old, new]` rows for a table block.
pub fn flatten(changes: Vec<HumanizedChange>) -> Vec<Vec<Value>> {
    changes.into_iter().map(HumanizedChange::into_row).collect()
}

/// Display string of one value under `rule`.
pub fn clean_value(value: &Value, rule: CleaningRule) -> String {
    match (rule, value) {
        (_, Value::Null) => EMPTY_DISPLAY.to_string(),
        (CleaningRule::Relation, Value::Ref(reference)) => reference.display.clone(),
        (CleaningRule::Number | CleaningRule::Auto, Value::Int(number)) => number.to_string(),
        (CleaningRule::Number | CleaningRule::Auto, Value::Float(number)) => {
            format_number(*number)
        }
        (CleaningRule::Temporal | CleaningRule::Auto, Value::Date(_) | Value::DateTime(_)) => {
            value.display()
        }
        (CleaningRule::Auto, Value::Bool(true)) => "yes".to_string(),
        (CleaningRule::Auto, Value::Bool(false)) => "no".to_string(),
        (_, other) if other.is_falsy() => EMPTY_DISPLAY.to_string(),
        (_, other) => other.display(),
    }
}

/// Up to two decimals; whole numbers render without a fraction.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value.fract() == 0.0 {
        return format!("{value:.0}");
    }
    format!("{value:.2}")
}
