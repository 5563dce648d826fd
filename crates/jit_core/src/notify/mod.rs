//! Delivery of rendered documents to recipients.
//!
//! # Responsibility
//! - Wrap documents into addressed notifications.
//! - Hand them to an external delivery channel and log every outcome.
//! - Build order change notifications and queue them as tasks.
//!
//! # Invariants
//! - Channel failures become a [`DeliveryOutcome`], never an error or panic.
//! - An empty recipient list never reaches the channel.

pub mod channel;
pub mod dispatcher;
pub mod notification;
pub mod order;
pub mod task;

use crate::render::block::TableError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use channel::{ChannelError, DeliveryChannel, OutgoingMessage};
pub use dispatcher::{DeliveryOutcome, Dispatcher};
pub use notification::Notification;
pub use order::{
    notify_client_of_order_update, notify_manager_of_order_update,
    order_update_client_notification, order_update_manager_notification,
    CLIENT_EXCLUDED_FIELDS,
};
pub use task::{
    run_task, submit_order_changes, InlineQueue, NotificationTask, QueueError, TaskQueue,
};

/// Failures while preparing a notification, before delivery is attempted.
#[derive(Debug)]
pub enum NotifyError {
    Repo(RepoError),
    Table(TableError),
    Queue(QueueError),
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Table(err) => write!(f, "{err}"),
            Self::Queue(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NotifyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Table(err) => Some(err),
            Self::Queue(err) => Some(err),
        }
    }
}

impl From<RepoError> for NotifyError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<TableError> for NotifyError {
    fn from(value: TableError) -> Self {
        Self::Table(value)
    }
}

impl From<QueueError> for NotifyError {
    fn from(value: QueueError) -> Self {
        Self::Queue(value)
    }
}
