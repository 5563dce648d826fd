//! Numeric and text field aggregators.

use crate::model::value::{Value, ValueKind};
use crate::state::snapshot::Snapshot;
use std::error::Error;
use std::fmt::{Display, Formatter};

const NUMERIC_KINDS: &[ValueKind] = &[ValueKind::Int, ValueKind::Float];
const TEXT_KINDS: &[ValueKind] = &[ValueKind::Text];

const DEFAULT_VALUE_DELIMITER: &str = " ";
const DEFAULT_LIST_DELIMITER: &str = ", ";

/// Aggregation construction and computation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateError {
    /// Output field name is blank.
    EmptyOutputField,
    /// Processor has no source fields, or one of them is blank.
    EmptyFields { output_field: String },
    /// A child field holds a value outside the accepted kind set.
    TypeMismatch {
        field: String,
        value: String,
        found: ValueKind,
        expected: &'static [ValueKind],
    },
}

impl Display for AggregateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyOutputField => write!(f, "aggregator output field must not be empty"),
            Self::EmptyFields { output_field } => write!(
                f,
                "aggregator `{output_field}` requires a non-empty list of source fields"
            ),
            Self::TypeMismatch {
                field,
                value,
                found,
                expected,
            } => {
                let expected = expected
                    .iter()
                    .map(|kind| kind.as_str())
                    .collect::<Vec<_>>()
                    .join("|");
                write!(
                    f,
                    "type of `{value}` ({found}) in field `{field}` is not in [{expected}]"
                )
            }
        }
    }
}

impl Error for AggregateError {}

/// Float rounding policy for numeric aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Round to N decimal places.
    Decimals(u32),
    /// Round to the nearest integer; the aggregate becomes `Value::Int`.
    Nearest,
}

/// Reduction rule carried by an aggregator.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateRule {
    /// Per child: product of fields. Across children: sum, then scaling and rounding.
    Numeric {
        coefficient: Option<f64>,
        unit_divisor: Option<f64>,
        rounding: Option<Rounding>,
    },
    /// Per child: fields joined by `value_delimiter`. Across children: joined by `list_delimiter`.
    Text {
        value_delimiter: String,
        list_delimiter: String,
    },
}

/// One derived-field processor.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAggregator {
    output_field: String,
    fields: Vec<String>,
    rule: AggregateRule,
}

impl FieldAggregator {
    /// Builds a product-then-sum aggregator.
    ///
    /// # Errors
    /// - `EmptyOutputField` / `EmptyFields` for blank configuration.
    pub fn numeric<I, S>(output_field: &str, fields: I) -> Result<Self, AggregateError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(
            output_field,
            fields,
            AggregateRule::Numeric {
                coefficient: None,
                unit_divisor: None,
                rounding: None,
            },
        )
    }

    /// Numeric aggregator over literal field names that need no validation.
    pub(crate) fn numeric_preset(output_field: &'static str, fields: &[&'static str]) -> Self {
        debug_assert!(
            !output_field.trim().is_empty()
                && !fields.is_empty()
                && fields.iter().all(|field| !field.trim().is_empty()),
            "numeric preset `{output_field}` has blank configuration"
        );
        Self {
            output_field: output_field.to_string(),
            fields: fields.iter().map(|field| field.to_string()).collect(),
            rule: AggregateRule::Numeric {
                coefficient: None,
                unit_divisor: None,
                rounding: None,
            },
        }
    }

    /// Builds a delimiter-join aggregator with default delimiters (`" "`, `", "`).
    pub fn text<I, S>(output_field: &str, fields: I) -> Result<Self, AggregateError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(
            output_field,
            fields,
            AggregateRule::Text {
                value_delimiter: DEFAULT_VALUE_DELIMITER.to_string(),
                list_delimiter: DEFAULT_LIST_DELIMITER.to_string(),
            },
        )
    }

    fn build<I, S>(output_field: &str, fields: I, rule: AggregateRule) -> Result<Self, AggregateError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let output_field = output_field.trim();
        if output_field.is_empty() {
            return Err(AggregateError::EmptyOutputField);
        }
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() || fields.iter().any(|field| field.trim().is_empty()) {
            return Err(AggregateError::EmptyFields {
                output_field: output_field.to_string(),
            });
        }

        Ok(Self {
            output_field: output_field.to_string(),
            fields,
            rule,
        })
    }

    /// Sets the rounding mode. No effect on text aggregators.
    pub fn with_rounding(mut self, mode: Rounding) -> Self {
        if let AggregateRule::Numeric { rounding, .. } = &mut self.rule {
            *rounding = Some(mode);
        }
        self
    }

    /// Sets a coefficient applied to the summed value. Zero is ignored.
    pub fn with_coefficient(mut self, value: f64) -> Self {
        if let AggregateRule::Numeric { coefficient, .. } = &mut self.rule {
            *coefficient = Some(value);
        }
        self
    }

    /// Sets a fixed unit divisor applied to the summed value (e.g. cm³ -> m³).
    pub fn with_unit_divisor(mut self, value: f64) -> Self {
        if let AggregateRule::Numeric { unit_divisor, .. } = &mut self.rule {
            *unit_divisor = Some(value);
        }
        self
    }

    /// Overrides text delimiters. No effect on numeric aggregators.
    pub fn with_delimiters(mut self, value: &str, list: &str) -> Self {
        if let AggregateRule::Text {
            value_delimiter,
            list_delimiter,
        } = &mut self.rule
        {
            *value_delimiter = value.to_string();
            *list_delimiter = list.to_string();
        }
        self
    }

    pub fn output_field(&self) -> &str {
        &self.output_field
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn rule(&self) -> &AggregateRule {
        &self.rule
    }

    /// Value kinds accepted for every source field.
    pub fn accepted_kinds(&self) -> &'static [ValueKind] {
        match self.rule {
            AggregateRule::Numeric { .. } => NUMERIC_KINDS,
            AggregateRule::Text { .. } => TEXT_KINDS,
        }
    }

    /// Reduces `children` into `(output_field, aggregate)`.
    ///
    /// # Errors
    /// - `TypeMismatch` when any source field is missing or of an unaccepted kind.
    pub fn compute(&self, children: &[Snapshot]) -> Result<(String, Value), AggregateError> {
        let value = match &self.rule {
            AggregateRule::Numeric {
                coefficient,
                unit_divisor,
                rounding,
            } => {
                let mut total = Number::Int(0);
                for child in children {
                    let mut product = Number::Int(1);
                    for value in self.checked_values(child)? {
                        product = product.mul(Number::from_value(value));
                    }
                    total = total.add(product);
                }
                finish_numeric(total, *coefficient, *unit_divisor, *rounding)
            }
            AggregateRule::Text {
                value_delimiter,
                list_delimiter,
            } => {
                let mut per_child = Vec::with_capacity(children.len());
                for child in children {
                    let parts = self
                        .checked_values(child)?
                        .into_iter()
                        .map(|value| match value {
                            Value::Text(text) => text.as_str(),
                            _ => "",
                        })
                        .collect::<Vec<_>>();
                    per_child.push(parts.join(value_delimiter.as_str()));
                }
                Value::Text(per_child.join(list_delimiter.as_str()))
            }
        };

        Ok((self.output_field.clone(), value))
    }

    fn checked_values<'a>(&self, child: &'a Snapshot) -> Result<Vec<&'a Value>, AggregateError> {
        let accepted = self.accepted_kinds();
        let mut values = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = child.get(field).unwrap_or(&Value::Null);
            let kind = value.kind();
            if !accepted.contains(&kind) {
                return Err(AggregateError::TypeMismatch {
                    field: field.clone(),
                    value: format!("{value:?}"),
                    found: kind,
                    expected: accepted,
                });
            }
            values.push(value);
        }
        Ok(values)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Int(value) => Self::Int(*value),
            Value::Float(value) => Self::Float(*value),
            _ => Self::Int(0),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Self::Int(value) => value as f64,
            Self::Float(value) => value,
        }
    }

    fn mul(self, other: Self) -> Self {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a
                .checked_mul(b)
                .map_or_else(|| Self::Float(a as f64 * b as f64), Self::Int),
            (a, b) => Self::Float(a.as_f64() * b.as_f64()),
        }
    }

    fn add(self, other: Self) -> Self {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a
                .checked_add(b)
                .map_or_else(|| Self::Float(a as f64 + b as f64), Self::Int),
            (a, b) => Self::Float(a.as_f64() + b.as_f64()),
        }
    }
}

fn finish_numeric(
    total: Number,
    coefficient: Option<f64>,
    unit_divisor: Option<f64>,
    rounding: Option<Rounding>,
) -> Value {
    let mut total = total;
    if let Some(coefficient) = coefficient.filter(|value| *value != 0.0) {
        total = total.mul(float_or_int(coefficient));
    }
    if let Some(divisor) = unit_divisor.filter(|value| *value != 0.0) {
        total = Number::Float(total.as_f64() / divisor);
    }

    match (total, rounding) {
        (Number::Float(value), Some(Rounding::Decimals(places))) => {
            Value::Float(round_to(value, places))
        }
        (Number::Float(value), Some(Rounding::Nearest)) => Value::Int(value.round() as i64),
        (Number::Float(value), None) => Value::Float(value),
        (Number::Int(value), _) => Value::Int(value),
    }
}

fn float_or_int(value: f64) -> Number {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Number::Int(value as i64)
    } else {
        Number::Float(value)
    }
}

fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10_f64.powi(places as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::{AggregateError, FieldAggregator, Rounding};
    use crate::model::value::{Value, ValueKind};
    use crate::state::snapshot::Snapshot;

    fn child(pairs: &[(&str, Value)]) -> Snapshot {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn preset_matches_validated_builder() {
        assert_eq!(
            FieldAggregator::numeric_preset("sum_weight", &["weight", "quantity"]),
            FieldAggregator::numeric("sum_weight", ["weight", "quantity"]).unwrap()
        );
    }

    #[test]
    fn numeric_multiplies_per_child_and_sums() {
        let aggregator = FieldAggregator::numeric("sum_weight", ["weight", "quantity"]).unwrap();
        let children = vec![
            child(&[("weight", Value::Int(5)), ("quantity", Value::Int(2))]),
            child(&[("weight", Value::Int(3)), ("quantity", Value::Int(4))]),
        ];

        let (name, value) = aggregator.compute(&children).unwrap();
        assert_eq!(name, "sum_weight");
        assert_eq!(value, Value::Int(22));
    }

    #[test]
    fn numeric_applies_unit_divisor_then_rounding() {
        let aggregator =
            FieldAggregator::numeric("sum_volume", ["length", "width", "height", "quantity"])
                .unwrap()
                .with_unit_divisor(1_000_000.0)
                .with_rounding(Rounding::Decimals(3));
        let children = vec![child(&[
            ("length", Value::Int(100)),
            ("width", Value::Int(50)),
            ("height", Value::Int(40)),
            ("quantity", Value::Int(1)),
        ])];

        let (_, value) = aggregator.compute(&children).unwrap();
        assert_eq!(value, Value::Float(0.2));
    }

    #[test]
    fn numeric_nearest_rounding_returns_integer() {
        let aggregator = FieldAggregator::numeric("total", ["weight"])
            .unwrap()
            .with_rounding(Rounding::Nearest);
        let children = vec![child(&[("weight", Value::Float(2.6))])];

        assert_eq!(aggregator.compute(&children).unwrap().1, Value::Int(3));
    }

    #[test]
    fn numeric_integer_aggregate_is_not_rounded() {
        let aggregator = FieldAggregator::numeric("total", ["quantity"])
            .unwrap()
            .with_rounding(Rounding::Decimals(2));
        let children = vec![child(&[("quantity", Value::Int(7))])];

        assert_eq!(aggregator.compute(&children).unwrap().1, Value::Int(7));
    }

    #[test]
    fn numeric_coefficient_scales_sum() {
        let aggregator = FieldAggregator::numeric("total", ["quantity"])
            .unwrap()
            .with_coefficient(1.5)
            .with_rounding(Rounding::Decimals(1));
        let children = vec![child(&[("quantity", Value::Int(3))])];

        assert_eq!(aggregator.compute(&children).unwrap().1, Value::Float(4.5));
    }

    #[test]
    fn empty_children_yield_identities() {
        let numeric = FieldAggregator::numeric("total", ["quantity"]).unwrap();
        let text = FieldAggregator::text("marks", ["mark"]).unwrap();

        assert_eq!(numeric.compute(&[]).unwrap().1, Value::Int(0));
        assert_eq!(text.compute(&[]).unwrap().1, Value::Text(String::new()));
    }

    #[test]
    fn text_joins_fields_and_children() {
        let aggregator = FieldAggregator::text("labels", ["mark", "package"]).unwrap();
        let children = vec![
            child(&[("mark", Value::from("A1")), ("package", Value::from("box"))]),
            child(&[("mark", Value::from("B2")), ("package", Value::from("pallet"))]),
        ];

        assert_eq!(
            aggregator.compute(&children).unwrap().1,
            Value::from("A1 box, B2 pallet")
        );

        let custom = aggregator.with_delimiters("/", "; ");
        assert_eq!(
            custom.compute(&children).unwrap().1,
            Value::from("A1/box; B2/pallet")
        );
    }

    #[test]
    fn type_mismatch_names_value_and_expected_kinds() {
        let aggregator = FieldAggregator::numeric("total", ["weight"]).unwrap();
        let children = vec![child(&[("weight", Value::from("heavy"))])];

        let err = aggregator.compute(&children).unwrap_err();
        match &err {
            AggregateError::TypeMismatch {
                field,
                found,
                expected,
                ..
            } => {
                assert_eq!(field, "weight");
                assert_eq!(*found, ValueKind::Text);
                assert_eq!(*expected, &[ValueKind::Int, ValueKind::Float][..]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("int|float"));
    }

    #[test]
    fn missing_and_null_fields_are_type_mismatches() {
        let aggregator = FieldAggregator::numeric("total", ["weight"]).unwrap();
        let children = vec![child(&[("quantity", Value::Int(1))])];

        assert!(matches!(
            aggregator.compute(&children),
            Err(AggregateError::TypeMismatch {
                found: ValueKind::Null,
                ..
            })
        ));
    }

    #[test]
    fn construction_rejects_blank_configuration() {
        assert_eq!(
            FieldAggregator::numeric(" ", ["a"]).unwrap_err(),
            AggregateError::EmptyOutputField
        );
        assert!(matches!(
            FieldAggregator::text("x", Vec::<String>::new()),
            Err(AggregateError::EmptyFields { .. })
        ));
        assert!(matches!(
            FieldAggregator::text("x", ["a", ""]),
            Err(AggregateError::EmptyFields { .. })
        ));
    }
}
