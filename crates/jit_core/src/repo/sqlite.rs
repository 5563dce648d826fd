//! SQLite-backed record repository.
//!
//! # Invariants
//! - Read paths reject invalid persisted state instead of masking it.
//! - Relation columns are resolved into `RecordRef` display strings on read.

use crate::model::entities::{Cargo, Order, OrderStatus, Organisation, User};
use crate::model::value::RecordRef;
use crate::repo::{RecordRepository, RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const DATE_STORAGE_FORMAT: &str = "%Y-%m-%d";

const ORDER_SELECT_SQL: &str = "SELECT
    uuid, number, client_number, date, client_uuid, contract_uuid,
    client_employee_uuid, manager_uuid, cargo_name, cargo_value,
    insurance_needed, insurance_premium, price, from_address,
    from_date_plan, from_date_fact, to_address, to_date_plan, to_date_fact,
    status, tracking_url, comment, service_marks,
    sum_weight, sum_volume, sum_quantity
FROM orders";

const USER_SELECT_SQL: &str = "SELECT
    uuid, username, last_name, first_name, second_name, email,
    organisation_uuid, main_manager_uuid
FROM users";

const ORGANISATION_SELECT_SQL: &str = "SELECT
    uuid, name, legal_name, email, is_client, is_expeditor
FROM organisations";

/// Read-only repository over the logistics schema.
pub struct SqliteRecordRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn organisation_ref(&self, id: Uuid) -> RepoResult<RecordRef> {
        self.load_organisation(id)
            .map(|organisation| organisation.to_record_ref())
    }

    fn user_ref(&self, id: Uuid) -> RepoResult<RecordRef> {
        self.load_user(id).map(|user| user.to_record_ref())
    }

    fn contract_ref(&self, id: Uuid) -> RepoResult<RecordRef> {
        let number: Option<String> = self
            .conn
            .query_row(
                "SELECT number FROM contracts WHERE uuid = ?1;",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        number
            .map(|number| RecordRef::new(id, number))
            .ok_or(RepoError::NotFound {
                kind: "contract",
                id,
            })
    }

    fn resolve(
        &self,
        id: Option<Uuid>,
        lookup: impl Fn(&Self, Uuid) -> RepoResult<RecordRef>,
    ) -> RepoResult<Option<RecordRef>> {
        id.map(|id| lookup(self, id)).transpose()
    }
}

impl RecordRepository for SqliteRecordRepository<'_> {
    fn load_order(&self, id: Uuid) -> RepoResult<Order> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ORDER_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        let Some(row) = rows.next()? else {
            return Err(RepoError::NotFound { kind: "order", id });
        };

        let status_text: String = row.get("status")?;
        let status = OrderStatus::parse(&status_text).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid order status `{status_text}` in orders.status"))
        })?;
        let client_id = parse_optional_uuid(row, "client_uuid")?;
        let contract_id = parse_optional_uuid(row, "contract_uuid")?;
        let client_employee_id = parse_optional_uuid(row, "client_employee_uuid")?;
        let manager_id = parse_optional_uuid(row, "manager_uuid")?;

        let order = Order {
            id: Some(parse_uuid(row, "uuid")?),
            number: row.get("number")?,
            client_number: row.get("client_number")?,
            date: parse_optional_date(row, "date")?,
            client: None,
            contract: None,
            client_employee: None,
            manager: None,
            cargo_name: row.get("cargo_name")?,
            cargo_value: row.get("cargo_value")?,
            insurance_needed: parse_bool(row, "insurance_needed")?,
            insurance_premium: row.get("insurance_premium")?,
            price: row.get("price")?,
            from_address: row.get("from_address")?,
            from_date_plan: parse_optional_date(row, "from_date_plan")?,
            from_date_fact: parse_optional_date(row, "from_date_fact")?,
            to_address: row.get("to_address")?,
            to_date_plan: parse_optional_date(row, "to_date_plan")?,
            to_date_fact: parse_optional_date(row, "to_date_fact")?,
            status,
            tracking_url: row.get("tracking_url")?,
            comment: row.get("comment")?,
            service_marks: row.get("service_marks")?,
            sum_weight: row.get("sum_weight")?,
            sum_volume: row.get("sum_volume")?,
            sum_quantity: row.get("sum_quantity")?,
        };
        drop(rows);

        Ok(Order {
            client: self.resolve(client_id, Self::organisation_ref)?,
            contract: self.resolve(contract_id, Self::contract_ref)?,
            client_employee: self.resolve(client_employee_id, Self::user_ref)?,
            manager: self.resolve(manager_id, Self::user_ref)?,
            ..order
        })
    }

    fn load_cargos(&self, order_id: Uuid) -> RepoResult<Vec<Cargo>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, order_uuid, mark, package, length, width, height, weight, quantity
             FROM cargos
             WHERE order_uuid = ?1
             ORDER BY created_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([order_id.to_string()])?;
        let mut cargos = Vec::new();
        while let Some(row) = rows.next()? {
            cargos.push(Cargo {
                id: parse_uuid(row, "uuid")?,
                order_id: parse_uuid(row, "order_uuid")?,
                mark: row.get("mark")?,
                package: row.get("package")?,
                length: row.get("length")?,
                width: row.get("width")?,
                height: row.get("height")?,
                weight: row.get("weight")?,
                quantity: row.get("quantity")?,
            });
        }
        Ok(cargos)
    }

    fn load_user(&self, id: Uuid) -> RepoResult<User> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => parse_user_row(row),
            None => Err(RepoError::NotFound { kind: "user", id }),
        }
    }

    fn load_organisation(&self, id: Uuid) -> RepoResult<Organisation> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ORGANISATION_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => parse_organisation_row(row),
            None => Err(RepoError::NotFound {
                kind: "organisation",
                id,
            }),
        }
    }

    fn expeditor(&self) -> RepoResult<Organisation> {
        let mut stmt = self.conn.prepare(&format!(
            "{ORGANISATION_SELECT_SQL} WHERE is_expeditor = 1 ORDER BY uuid LIMIT 1;"
        ))?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => parse_organisation_row(row),
            None => Err(RepoError::NoExpeditor),
        }
    }

    fn organisation_user_emails(&self, organisation_id: Uuid) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT email FROM users
             WHERE organisation_uuid = ?1
               AND email IS NOT NULL
               AND trim(email) <> ''
             ORDER BY username ASC;",
        )?;
        let emails = stmt
            .query_map(params![organisation_id.to_string()], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(emails)
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        id: parse_uuid(row, "uuid")?,
        username: row.get("username")?,
        last_name: row.get("last_name")?,
        first_name: row.get("first_name")?,
        second_name: row.get("second_name")?,
        email: row.get("email")?,
        organisation_id: parse_uuid(row, "organisation_uuid")?,
        main_manager_id: parse_optional_uuid(row, "main_manager_uuid")?,
    })
}

fn parse_organisation_row(row: &Row<'_>) -> RepoResult<Organisation> {
    Ok(Organisation {
        id: parse_uuid(row, "uuid")?,
        name: row.get("name")?,
        legal_name: row.get("legal_name")?,
        email: row.get("email")?,
        is_client: parse_bool(row, "is_client")?,
        is_expeditor: parse_bool(row, "is_expeditor")?,
    })
}

fn parse_uuid(row: &Row<'_>, column: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {column}")))
}

fn parse_optional_uuid(row: &Row<'_>, column: &str) -> RepoResult<Option<Uuid>> {
    match row.get::<_, Option<String>>(column)? {
        Some(text) => Uuid::parse_str(&text).map(Some).map_err(|_| {
            RepoError::InvalidData(format!("invalid uuid value `{text}` in {column}"))
        }),
        None => Ok(None),
    }
}

fn parse_optional_date(row: &Row<'_>, column: &str) -> RepoResult<Option<NaiveDate>> {
    match row.get::<_, Option<String>>(column)? {
        Some(text) => NaiveDate::parse_from_str(&text, DATE_STORAGE_FORMAT)
            .map(Some)
            .map_err(|_| RepoError::InvalidData(format!("invalid date `{text}` in {column}"))),
        None => Ok(None),
    }
}

fn parse_bool(row: &Row<'_>, column: &str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}
