//! Field value model shared by snapshots, aggregation and rendering.
//!
//! # Responsibility
//! - Represent every scalar a record field can hold without runtime reflection.
//! - Provide the canonical display form used by table cells.
//!
//! # Invariants
//! - Equality is value equality; `Null == Null`.
//! - `Int` and `Float` compare numerically (`Int(2) == Float(2.0)`).
//! - Two `NaN` floats are equal, so a snapshot always equals its own copy.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Display placeholder for null/empty values.
pub const EMPTY_DISPLAY: &str = "-";

const DATETIME_DISPLAY_FORMAT: &str = "%d.%m.%Y %H:%M:%S";
const DATE_DISPLAY_FORMAT: &str = "%d.%m.%Y";

/// Reference to another record: its identity plus a ready display string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub id: Uuid,
    pub display: String,
}

impl RecordRef {
    pub fn new(id: Uuid, display: impl Into<String>) -> Self {
        Self {
            id,
            display: display.into(),
        }
    }
}

impl Display for RecordRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display)
    }
}

/// One captured field value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Id(Uuid),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Ref(RecordRef),
    List(Vec<Value>),
}

/// Runtime kind tag of a [`Value`], used for aggregation type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Text,
    Id,
    DateTime,
    Date,
    Ref,
    List,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
            Self::Id => "id",
            Self::DateTime => "datetime",
            Self::Date => "date",
            Self::Ref => "ref",
            Self::List => "list",
        }
    }
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Text(_) => ValueKind::Text,
            Self::Id(_) => ValueKind::Id,
            Self::DateTime(_) => ValueKind::DateTime,
            Self::Date(_) => ValueKind::Date,
            Self::Ref(_) => ValueKind::Ref,
            Self::List(_) => ValueKind::List,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns whether the value counts as "empty" for display purposes.
    pub fn is_falsy(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(value) => !value,
            Self::Text(value) => value.is_empty(),
            Self::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Numeric view for `Int`/`Float`, `None` otherwise.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Canonical cell display string.
    ///
    /// - `Null` and empty text -> `-`
    /// - timestamps -> `DD.MM.YYYY HH:MM:SS`, dates -> `DD.MM.YYYY`
    /// - identifiers and references -> their string form
    pub fn display(&self) -> String {
        match self {
            Self::Null => EMPTY_DISPLAY.to_string(),
            Self::Text(value) if value.is_empty() => EMPTY_DISPLAY.to_string(),
            Self::Text(value) => value.clone(),
            Self::Bool(value) => value.to_string(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Id(value) => value.to_string(),
            Self::DateTime(value) => value.format(DATETIME_DISPLAY_FORMAT).to_string(),
            Self::Date(value) => value.format(DATE_DISPLAY_FORMAT).to_string(),
            Self::Ref(value) => value.display.clone(),
            Self::List(items) => items
                .iter()
                .map(Value::display)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => *a as f64 == *b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Id(a), Self::Id(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Ref(a), Self::Ref(b)) => a.id == b.id,
            (Self::List(a), Self::List(b)) => a == b,
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Self::Id(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<RecordRef> for Value {
    fn from(value: RecordRef) -> Self {
        Self::Ref(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::{RecordRef, Value, ValueKind};
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[test]
    fn nan_equals_nan_but_not_numbers() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Float(f64::NAN), Value::Float(0.0));
        assert_ne!(Value::Float(f64::NAN), Value::Int(0));
    }

    #[test]
    fn display_normalizes_null_and_empty_text() {
        assert_eq!(Value::Null.display(), "-");
        assert_eq!(Value::from("").display(), "-");
        assert_eq!(Value::from("abc").display(), "abc");
    }

    #[test]
    fn display_formats_temporal_values() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let datetime = date.and_hms_opt(9, 5, 1).unwrap();
        assert_eq!(Value::Date(date).display(), "07.03.2024");
        assert_eq!(Value::DateTime(datetime).display(), "07.03.2024 09:05:01");
    }

    #[test]
    fn display_uses_reference_string_form() {
        let id = Uuid::new_v4();
        assert_eq!(Value::Id(id).display(), id.to_string());
        assert_eq!(Value::Ref(RecordRef::new(id, "ACME")).display(), "ACME");
    }

    #[test]
    fn null_equals_null_and_option_maps_to_null() {
        assert_eq!(Value::Null, Value::Null);
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3_i64)).kind(), ValueKind::Int);
    }

    #[test]
    fn numbers_compare_across_int_and_float() {
        assert_eq!(Value::Int(2), Value::Float(2.0));
        assert_ne!(Value::Int(2), Value::Float(2.5));
        assert_ne!(Value::Int(0), Value::Null);
        assert_ne!(Value::from("2"), Value::Int(2));
    }

    #[test]
    fn references_compare_by_identity() {
        let id = Uuid::new_v4();
        assert_eq!(
            Value::Ref(RecordRef::new(id, "old name")),
            Value::Ref(RecordRef::new(id, "new name"))
        );
    }
}
