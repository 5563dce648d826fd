//! Record repository contracts and adapters.
//!
//! # Responsibility
//! - Define the read-only record access the notification pipeline consumes.
//! - Resolve named child relations for snapshot capture.
//!
//! # Invariants
//! - Repositories never write; persistence belongs to the caller.
//! - Lookups of missing records return `NotFound`, not `None`.

pub mod memory;
pub mod sqlite;

use crate::db::DbError;
use crate::model::entities::{Cargo, Order, Organisation, User, CARGOS_RELATION};
use crate::model::record::Record;
use crate::state::snapshot::{capture_children, ChildSource, Snapshot};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub use memory::InMemoryRecordRepository;
pub use sqlite::SqliteRecordRepository;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository lookup and decoding errors.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound { kind: &'static str, id: Uuid },
    NoExpeditor,
    UnknownRelation(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::NoExpeditor => write!(f, "expeditor organisation is not configured"),
            Self::UnknownRelation(name) => write!(f, "unknown child relation `{name}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Read access to logistics records.
pub trait RecordRepository {
    fn load_order(&self, id: Uuid) -> RepoResult<Order>;
    /// Cargo lines of one order in creation order.
    fn load_cargos(&self, order_id: Uuid) -> RepoResult<Vec<Cargo>>;
    fn load_user(&self, id: Uuid) -> RepoResult<User>;
    fn load_organisation(&self, id: Uuid) -> RepoResult<Organisation>;
    /// The single organisation flagged as expeditor.
    fn expeditor(&self) -> RepoResult<Organisation>;
    /// Non-empty e-mail addresses of an organisation's users.
    fn organisation_user_emails(&self, organisation_id: Uuid) -> RepoResult<Vec<String>>;
}

impl<T: RecordRepository + ?Sized> ChildSource<Order> for T {
    fn load_children(&self, record: &Order, relation: &str) -> RepoResult<Vec<Snapshot>> {
        if relation != CARGOS_RELATION {
            return Err(RepoError::UnknownRelation(relation.to_string()));
        }
        match record.record_id() {
            Some(order_id) => Ok(capture_children(&self.load_cargos(order_id)?)),
            None => Ok(Vec::new()),
        }
    }
}
