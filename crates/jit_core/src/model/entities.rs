//! Logistics entities consumed by the notification pipeline.
//!
//! # Responsibility
//! - Mirror the persisted shape of orders, cargo lines, organisations and users.
//! - Declare snapshot fields and order-level derived fields.
//!
//! # Invariants
//! - `Order.sum_*` fields are replaced by cargo aggregates when a snapshot is
//!   taken with the cargo collection.

use crate::aggregate::{FieldAggregator, Rounding};
use crate::model::record::{CleaningRule, FieldDescriptor, Record};
use crate::model::value::{RecordRef, Value};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Relation name of an order's cargo lines.
pub const CARGOS_RELATION: &str = "cargos";

/// Cargo dimensions are stored in centimetres; order volume is cubic metres.
const CUBIC_CENTIMETRES_PER_CUBIC_METRE: f64 = 1_000_000.0;

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    New,
    Prepare,
    InProgress,
    Delivered,
    DocsReceived,
    Complete,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Prepare => "prepare",
            Self::InProgress => "in_progress",
            Self::Delivered => "delivered",
            Self::DocsReceived => "docs_received",
            Self::Complete => "complete",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(Self::New),
            "prepare" => Some(Self::Prepare),
            "in_progress" => Some(Self::InProgress),
            "delivered" => Some(Self::Delivered),
            "docs_received" => Some(Self::DocsReceived),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Prepare => "Preparing for shipment",
            Self::InProgress => "In transit",
            Self::Delivered => "Delivered",
            Self::DocsReceived => "Documents received",
            Self::Complete => "Complete",
        }
    }
}

/// Legal entity: client, consignor/consignee or the expeditor itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organisation {
    pub id: Uuid,
    pub name: String,
    pub legal_name: String,
    pub email: Option<String>,
    pub is_client: bool,
    pub is_expeditor: bool,
}

impl Organisation {
    pub fn to_record_ref(&self) -> RecordRef {
        RecordRef::new(self.id, self.name.clone())
    }
}

/// Portal user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub last_name: String,
    pub first_name: String,
    pub second_name: String,
    pub email: Option<String>,
    pub organisation_id: Uuid,
    pub main_manager_id: Option<Uuid>,
}

impl User {
    /// `Last First [Second]`, each word capitalized.
    pub fn full_name(&self) -> String {
        [&self.last_name, &self.first_name, &self.second_name]
            .into_iter()
            .map(|word| capitalize(word.trim()))
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Full name, falling back to the login when no name is set.
    pub fn display_name(&self) -> String {
        let full_name = self.full_name();
        if full_name.is_empty() {
            self.username.clone()
        } else {
            full_name
        }
    }

    pub fn to_record_ref(&self) -> RecordRef {
        RecordRef::new(self.id, self.display_name())
    }
}

const ORGANISATION_FIELDS: &[FieldDescriptor<Organisation>] = &[
    FieldDescriptor {
        name: "name",
        label: "Name",
        extract: |organisation| Value::from(organisation.name.clone()),
        rule: CleaningRule::Text,
    },
    FieldDescriptor {
        name: "legal_name",
        label: "Legal name",
        extract: |organisation| Value::from(organisation.legal_name.clone()),
        rule: CleaningRule::Text,
    },
    FieldDescriptor {
        name: "email",
        label: "Email",
        extract: |organisation| text_or_null(&organisation.email),
        rule: CleaningRule::Text,
    },
    FieldDescriptor {
        name: "is_client",
        label: "Client",
        extract: |organisation| Value::Bool(organisation.is_client),
        rule: CleaningRule::Auto,
    },
    FieldDescriptor {
        name: "is_expeditor",
        label: "Expeditor",
        extract: |organisation| Value::Bool(organisation.is_expeditor),
        rule: CleaningRule::Auto,
    },
];

impl Record for Organisation {
    fn record_id(&self) -> Option<Uuid> {
        Some(self.id)
    }

    fn fields() -> &'static [FieldDescriptor<Self>] {
        ORGANISATION_FIELDS
    }
}

const USER_FIELDS: &[FieldDescriptor<User>] = &[
    FieldDescriptor {
        name: "username",
        label: "Login",
        extract: |user| Value::from(user.username.clone()),
        rule: CleaningRule::Text,
    },
    FieldDescriptor {
        name: "last_name",
        label: "Last name",
        extract: |user| Value::from(user.last_name.clone()),
        rule: CleaningRule::Text,
    },
    FieldDescriptor {
        name: "first_name",
        label: "First name",
        extract: |user| Value::from(user.first_name.clone()),
        rule: CleaningRule::Text,
    },
    FieldDescriptor {
        name: "second_name",
        label: "Middle name",
        extract: |user| Value::from(user.second_name.clone()),
        rule: CleaningRule::Text,
    },
    FieldDescriptor {
        name: "email",
        label: "Email",
        extract: |user| text_or_null(&user.email),
        rule: CleaningRule::Text,
    },
    FieldDescriptor {
        name: "organisation",
        label: "Organisation",
        extract: |user| Value::Id(user.organisation_id),
        rule: CleaningRule::Auto,
    },
    FieldDescriptor {
        name: "main_manager",
        label: "Main manager",
        extract: |user| Value::from(user.main_manager_id),
        rule: CleaningRule::Auto,
    },
];

impl Record for User {
    fn record_id(&self) -> Option<Uuid> {
        Some(self.id)
    }

    fn fields() -> &'static [FieldDescriptor<Self>] {
        USER_FIELDS
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Shipment order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Option<Uuid>,
    pub number: String,
    pub client_number: String,
    pub date: Option<NaiveDate>,
    pub client: Option<RecordRef>,
    pub contract: Option<RecordRef>,
    pub client_employee: Option<RecordRef>,
    pub manager: Option<RecordRef>,
    pub cargo_name: String,
    pub cargo_value: f64,
    pub insurance_needed: bool,
    pub insurance_premium: f64,
    pub price: Option<f64>,
    pub from_address: String,
    pub from_date_plan: Option<NaiveDate>,
    pub from_date_fact: Option<NaiveDate>,
    pub to_address: String,
    pub to_date_plan: Option<NaiveDate>,
    pub to_date_fact: Option<NaiveDate>,
    pub status: OrderStatus,
    pub tracking_url: Option<String>,
    pub comment: Option<String>,
    pub service_marks: Option<String>,
    pub sum_weight: Option<f64>,
    pub sum_volume: Option<f64>,
    pub sum_quantity: Option<i64>,
}

impl Order {
    /// Unsaved order with the given number.
    pub fn draft(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            ..Self::default()
        }
    }

    /// `Order #<number> of DD.MM.YYYY`.
    pub fn display_name(&self) -> String {
        match self.date {
            Some(date) => format!("Order #{} of {}", self.number, date.format("%d.%m.%Y")),
            None => format!("Order #{}", self.number),
        }
    }

    /// Client number when set, else the internal number.
    pub fn effective_client_number(&self) -> &str {
        if self.client_number.is_empty() {
            &self.number
        } else {
            &self.client_number
        }
    }
}

fn text_or_null(value: &Option<String>) -> Value {
    value.clone().into()
}

const ORDER_FIELDS: &[FieldDescriptor<Order>] = &[
    FieldDescriptor {
        name: "number",
        label: "Order number",
        extract: |order| Value::from(order.number.clone()),
        rule: CleaningRule::Text,
    },
    FieldDescriptor {
        name: "client_number",
        label: "Client number",
        extract: |order| Value::from(order.client_number.clone()),
        rule: CleaningRule::Text,
    },
    FieldDescriptor {
        name: "date",
        label: "Order date",
        extract: |order| Value::from(order.date),
        rule: CleaningRule::Temporal,
    },
    FieldDescriptor {
        name: "client",
        label: "Client",
        extract: |order| Value::from(order.client.clone()),
        rule: CleaningRule::Relation,
    },
    FieldDescriptor {
        name: "contract",
        label: "Contract",
        extract: |order| Value::from(order.contract.clone()),
        rule: CleaningRule::Relation,
    },
    FieldDescriptor {
        name: "client_employee",
        label: "Client employee",
        extract: |order| Value::from(order.client_employee.clone()),
        rule: CleaningRule::Relation,
    },
    FieldDescriptor {
        name: "manager",
        label: "Manager",
        extract: |order| Value::from(order.manager.clone()),
        rule: CleaningRule::Relation,
    },
    FieldDescriptor {
        name: "cargo_name",
        label: "Cargo name",
        extract: |order| Value::from(order.cargo_name.clone()),
        rule: CleaningRule::Text,
    },
    FieldDescriptor {
        name: "cargo_value",
        label: "Declared cargo value",
        extract: |order| Value::Float(order.cargo_value),
        rule: CleaningRule::Number,
    },
    FieldDescriptor {
        name: "insurance_needed",
        label: "Insurance required",
        extract: |order| Value::Bool(order.insurance_needed),
        rule: CleaningRule::Auto,
    },
    FieldDescriptor {
        name: "insurance_premium",
        label: "Insurance premium",
        extract: |order| Value::Float(order.insurance_premium),
        rule: CleaningRule::Number,
    },
    FieldDescriptor {
        name: "price",
        label: "Rate",
        extract: |order| Value::from(order.price),
        rule: CleaningRule::Number,
    },
    FieldDescriptor {
        name: "from_address",
        label: "Pickup address",
        extract: |order| Value::from(order.from_address.clone()),
        rule: CleaningRule::Text,
    },
    FieldDescriptor {
        name: "from_date_plan",
        label: "Pickup date (plan)",
        extract: |order| Value::from(order.from_date_plan),
        rule: CleaningRule::Temporal,
    },
    FieldDescriptor {
        name: "from_date_fact",
        label: "Pickup date (fact)",
        extract: |order| Value::from(order.from_date_fact),
        rule: CleaningRule::Temporal,
    },
    FieldDescriptor {
        name: "to_address",
        label: "Delivery address",
        extract: |order| Value::from(order.to_address.clone()),
        rule: CleaningRule::Text,
    },
    FieldDescriptor {
        name: "to_date_plan",
        label: "Delivery date (plan)",
        extract: |order| Value::from(order.to_date_plan),
        rule: CleaningRule::Temporal,
    },
    FieldDescriptor {
        name: "to_date_fact",
        label: "Delivery date (fact)",
        extract: |order| Value::from(order.to_date_fact),
        rule: CleaningRule::Temporal,
    },
    FieldDescriptor {
        name: "status",
        label: "Status",
        extract: |order| Value::from(order.status.label()),
        rule: CleaningRule::Text,
    },
    FieldDescriptor {
        name: "tracking_url",
        label: "Tracking link",
        extract: |order| text_or_null(&order.tracking_url),
        rule: CleaningRule::Text,
    },
    FieldDescriptor {
        name: "comment",
        label: "Comment",
        extract: |order| text_or_null(&order.comment),
        rule: CleaningRule::Text,
    },
    FieldDescriptor {
        name: "service_marks",
        label: "Service marks",
        extract: |order| text_or_null(&order.service_marks),
        rule: CleaningRule::Text,
    },
    FieldDescriptor {
        name: "sum_weight",
        label: "Total gross weight, kg",
        extract: |order| Value::from(order.sum_weight),
        rule: CleaningRule::Number,
    },
    FieldDescriptor {
        name: "sum_volume",
        label: "Total volume, m3",
        extract: |order| Value::from(order.sum_volume),
        rule: CleaningRule::Number,
    },
    FieldDescriptor {
        name: "sum_quantity",
        label: "Total packages",
        extract: |order| Value::from(order.sum_quantity),
        rule: CleaningRule::Number,
    },
];

impl Record for Order {
    fn record_id(&self) -> Option<Uuid> {
        self.id
    }

    fn fields() -> &'static [FieldDescriptor<Self>] {
        ORDER_FIELDS
    }

    fn aggregators() -> Vec<FieldAggregator> {
        order_aggregators()
    }
}

/// Derived order totals over cargo lines.
pub fn order_aggregators() -> Vec<FieldAggregator> {
    vec![
        FieldAggregator::numeric_preset("sum_weight", &["weight", "quantity"])
            .with_rounding(Rounding::Decimals(2)),
        FieldAggregator::numeric_preset("sum_volume", &["length", "width", "height", "quantity"])
            .with_unit_divisor(CUBIC_CENTIMETRES_PER_CUBIC_METRE)
            .with_rounding(Rounding::Decimals(3)),
        FieldAggregator::numeric_preset("sum_quantity", &["quantity"]),
    ]
}

/// One cargo line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cargo {
    pub id: Uuid,
    pub order_id: Uuid,
    pub mark: Option<String>,
    pub package: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
    pub quantity: i64,
}

const CARGO_FIELDS: &[FieldDescriptor<Cargo>] = &[
    FieldDescriptor {
        name: "id",
        label: "ID",
        extract: |cargo| Value::Id(cargo.id),
        rule: CleaningRule::Text,
    },
    FieldDescriptor {
        name: "mark",
        label: "Marking",
        extract: |cargo| text_or_null(&cargo.mark),
        rule: CleaningRule::Text,
    },
    FieldDescriptor {
        name: "package",
        label: "Package type",
        extract: |cargo| Value::from(cargo.package.clone()),
        rule: CleaningRule::Text,
    },
    FieldDescriptor {
        name: "length",
        label: "Length, cm",
        extract: |cargo| Value::Float(cargo.length),
        rule: CleaningRule::Number,
    },
    FieldDescriptor {
        name: "width",
        label: "Width, cm",
        extract: |cargo| Value::Float(cargo.width),
        rule: CleaningRule::Number,
    },
    FieldDescriptor {
        name: "height",
        label: "Height, cm",
        extract: |cargo| Value::Float(cargo.height),
        rule: CleaningRule::Number,
    },
    FieldDescriptor {
        name: "weight",
        label: "Weight per package, kg",
        extract: |cargo| Value::Float(cargo.weight),
        rule: CleaningRule::Number,
    },
    FieldDescriptor {
        name: "quantity",
        label: "Packages",
        extract: |cargo| Value::Int(cargo.quantity),
        rule: CleaningRule::Number,
    },
];

impl Record for Cargo {
    fn record_id(&self) -> Option<Uuid> {
        Some(self.id)
    }

    fn fields() -> &'static [FieldDescriptor<Self>] {
        CARGO_FIELDS
    }
}

#[cfg(test)]
mod tests {
    use super::{order_aggregators, Organisation, OrderStatus, User};
    use crate::model::record::Record;
    use crate::model::value::Value;
    use crate::state::snapshot::capture_snapshot;
    use uuid::Uuid;

    #[test]
    fn order_declares_three_totals() {
        let names = order_aggregators()
            .iter()
            .map(|aggregator| aggregator.output_field().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["sum_weight", "sum_volume", "sum_quantity"]);
    }

    #[test]
    fn status_round_trips_through_storage_code() {
        for status in [
            OrderStatus::New,
            OrderStatus::Prepare,
            OrderStatus::InProgress,
            OrderStatus::Delivered,
            OrderStatus::DocsReceived,
            OrderStatus::Complete,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("lost"), None);
    }

    #[test]
    fn user_display_name_capitalizes_and_falls_back_to_login() {
        let mut user = User {
            id: Uuid::new_v4(),
            username: "ivan@example.com".to_string(),
            last_name: "IVANOV".to_string(),
            first_name: "ivan".to_string(),
            second_name: String::new(),
            email: None,
            organisation_id: Uuid::new_v4(),
            main_manager_id: None,
        };
        assert_eq!(user.display_name(), "Ivanov Ivan");

        user.last_name.clear();
        user.first_name.clear();
        assert_eq!(user.display_name(), "ivan@example.com");
    }

    #[test]
    fn organisation_declares_verbose_labels() {
        let labels = Organisation::label_map();
        assert_eq!(labels.get("legal_name").map(String::as_str), Some("Legal name"));
        assert_eq!(labels.get("is_expeditor").map(String::as_str), Some("Expeditor"));
        assert_eq!(labels.len(), 5);
    }

    #[test]
    fn user_snapshot_captures_declared_fields() {
        let manager_id = Uuid::new_v4();
        let user = User {
            id: Uuid::new_v4(),
            username: "petrova".to_string(),
            last_name: "Petrova".to_string(),
            first_name: "Anna".to_string(),
            second_name: String::new(),
            email: None,
            organisation_id: Uuid::new_v4(),
            main_manager_id: Some(manager_id),
        };

        let snapshot = capture_snapshot(&user, None).unwrap();

        assert_eq!(snapshot.get("email"), Some(&Value::Null));
        assert_eq!(snapshot.get("main_manager"), Some(&Value::Id(manager_id)));
        assert_eq!(User::label_map().get("second_name").map(String::as_str), Some("Middle name"));
    }
}
