//! Core logic for JIT order change notifications.
//! Snapshot, diff, humanize, render and deliver; storage stays with the caller.

pub mod aggregate;
pub mod config;
pub mod db;
pub mod humanize;
pub mod logging;
pub mod model;
pub mod notify;
pub mod render;
pub mod repo;
pub mod state;

pub use aggregate::{AggregateError, AggregateRule, FieldAggregator, Rounding};
pub use config::{ConfigError, JitConfig, LoggingConfig, MailConfig, SiteConfig};
pub use humanize::{clean_value, flatten, humanize, humanize_record, HumanizedChange};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entities::{Cargo, Order, OrderStatus, Organisation, User};
pub use model::record::{CleaningRule, FieldDescriptor, Record};
pub use model::value::{RecordRef, Value, ValueKind};
pub use notify::{
    ChannelError, DeliveryChannel, DeliveryOutcome, Dispatcher, Notification, NotificationTask, NotifyError,
    OutgoingMessage, TaskQueue,
};
pub use render::{Document, DocumentTheme, RenderedDocument, TableError};
pub use repo::{
    InMemoryRecordRepository, RecordRepository, RepoError, RepoResult, SqliteRecordRepository,
};
pub use state::{
    capture_snapshot, capture_snapshot_with_relation, compute_diff, Diff, FieldChange, Snapshot,
    SnapshotError,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
