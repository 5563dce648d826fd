//! Notification tasks and the queue boundary that runs them.
//!
//! # Responsibility
//! - Describe queued work as serializable data.
//! - Run one task against a repository and dispatcher.
//!
//! # Invariants
//! - Tasks carry ids and the diff, never loaded records.
//! - The core only enqueues; retry policy belongs to the queue.

use crate::config::SiteConfig;
use crate::notify::dispatcher::{DeliveryOutcome, Dispatcher};
use crate::notify::order::{notify_client_of_order_update, notify_manager_of_order_update};
use crate::notify::NotifyError;
use crate::repo::RecordRepository;
use crate::state::diff::Diff;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Queued notification work: a task name plus JSON arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", content = "args", rename_all = "snake_case")]
pub enum NotificationTask {
    OrderUpdateClientNotification {
        order_id: Uuid,
        author_id: Uuid,
        changes: Diff,
    },
    OrderUpdateManagerNotification {
        order_id: Uuid,
        author_id: Uuid,
        changes: Diff,
    },
}

impl NotificationTask {
    pub fn name(&self) -> &'static str {
        match self {
            Self::OrderUpdateClientNotification { .. } => "order_update_client_notification",
            Self::OrderUpdateManagerNotification { .. } => "order_update_manager_notification",
        }
    }

    pub fn to_json(&self) -> Result<String, QueueError> {
        serde_json::to_string(self).map_err(QueueError::Serialize)
    }

    pub fn from_json(payload: &str) -> Result<Self, QueueError> {
        serde_json::from_str(payload).map_err(QueueError::Serialize)
    }
}

/// Task submission failures.
#[derive(Debug)]
pub enum QueueError {
    Serialize(serde_json::Error),
    Rejected(String),
}

impl Display for QueueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serialize(err) => write!(f, "task payload is not valid json: {err}"),
            Self::Rejected(message) => write!(f, "task queue rejected task: {message}"),
        }
    }
}

impl Error for QueueError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialize(err) => Some(err),
            Self::Rejected(_) => None,
        }
    }
}

/// External task queue with at-least-once delivery.
pub trait TaskQueue {
    fn enqueue(&self, task: NotificationTask) -> Result<(), QueueError>;
}

/// Executes one task to completion.
///
/// # Errors
/// - Preparation failures (missing records, malformed table); delivery
///   failures are reported through the returned outcome instead.
pub fn run_task<R: RecordRepository + ?Sized>(
    task: NotificationTask,
    repo: &R,
    dispatcher: &Dispatcher<'_>,
    site: &SiteConfig,
) -> Result<DeliveryOutcome, NotifyError> {
    debug!(
        "event=task_run module=notify status=start task={}",
        task.name()
    );
    match task {
        NotificationTask::OrderUpdateClientNotification {
            order_id,
            author_id,
            changes,
        } => notify_client_of_order_update(repo, dispatcher, site, order_id, author_id, changes),
        NotificationTask::OrderUpdateManagerNotification {
            order_id,
            author_id,
            changes,
        } => notify_manager_of_order_update(repo, dispatcher, site, order_id, author_id, changes),
    }
}

/// Enqueues client and manager notifications for one order change.
///
/// Returns how many tasks were submitted; an empty diff submits none.
pub fn submit_order_changes(
    queue: &dyn TaskQueue,
    order_id: Uuid,
    author_id: Uuid,
    changes: Diff,
) -> Result<usize, QueueError> {
    if changes.is_empty() {
        return Ok(0);
    }
    queue.enqueue(NotificationTask::OrderUpdateClientNotification {
        order_id,
        author_id,
        changes: changes.clone(),
    })?;
    queue.enqueue(NotificationTask::OrderUpdateManagerNotification {
        order_id,
        author_id,
        changes,
    })?;
    Ok(2)
}

/// Queue that runs each task immediately in the calling thread.
///
/// Tasks pass through their JSON form first, the same boundary a broker adds.
pub struct InlineQueue<'a, R: RecordRepository + ?Sized> {
    repo: &'a R,
    dispatcher: &'a Dispatcher<'a>,
    site: SiteConfig,
    outcomes: RefCell<Vec<DeliveryOutcome>>,
}

impl<'a, R: RecordRepository + ?Sized> InlineQueue<'a, R> {
    pub fn new(repo: &'a R, dispatcher: &'a Dispatcher<'a>, site: &SiteConfig) -> Self {
        Self {
            repo,
            dispatcher,
            site: site.clone(),
            outcomes: RefCell::new(Vec::new()),
        }
    }

    /// Outcomes of every task run so far, in run order.
    pub fn outcomes(&self) -> Vec<DeliveryOutcome> {
        self.outcomes.borrow().clone()
    }
}

impl<R: RecordRepository + ?Sized> TaskQueue for InlineQueue<'_, R> {
    fn enqueue(&self, task: NotificationTask) -> Result<(), QueueError> {
        let task = NotificationTask::from_json(&task.to_json()?)?;
        let name = task.name();
        match run_task(task, self.repo, self.dispatcher, &self.site) {
            Ok(outcome) => {
                self.outcomes.borrow_mut().push(outcome);
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=task_run module=notify status=error task={} error={}",
                    name, err
                );
                Err(QueueError::Rejected(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{submit_order_changes, NotificationTask, QueueError, TaskQueue};
    use crate::model::value::Value;
    use crate::state::diff::{compute_diff, Diff};
    use crate::state::snapshot::Snapshot;
    use std::cell::RefCell;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingQueue {
        tasks: RefCell<Vec<NotificationTask>>,
    }

    impl TaskQueue for RecordingQueue {
        fn enqueue(&self, task: NotificationTask) -> Result<(), QueueError> {
            self.tasks.borrow_mut().push(task);
            Ok(())
        }
    }

    fn status_diff() -> Diff {
        let old: Snapshot = [("status".to_string(), Value::from("New"))]
            .into_iter()
            .collect();
        let new: Snapshot = [("status".to_string(), Value::from("Delivered"))]
            .into_iter()
            .collect();
        compute_diff(&old, &new)
    }

    #[test]
    fn empty_diff_submits_nothing() {
        let queue = RecordingQueue::default();
        let submitted =
            submit_order_changes(&queue, Uuid::new_v4(), Uuid::new_v4(), Diff::default())
                .expect("submit should succeed");
        assert_eq!(submitted, 0);
        assert!(queue.tasks.borrow().is_empty());
    }

    #[test]
    fn change_submits_client_then_manager_task() {
        let queue = RecordingQueue::default();
        let submitted = submit_order_changes(&queue, Uuid::new_v4(), Uuid::new_v4(), status_diff())
            .expect("submit should succeed");

        assert_eq!(submitted, 2);
        let names = queue
            .tasks
            .borrow()
            .iter()
            .map(NotificationTask::name)
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "order_update_client_notification",
                "order_update_manager_notification"
            ]
        );
    }

    #[test]
    fn task_json_carries_name_and_args() {
        let order_id = Uuid::new_v4();
        let task = NotificationTask::OrderUpdateManagerNotification {
            order_id,
            author_id: Uuid::new_v4(),
            changes: status_diff(),
        };

        let payload = task.to_json().expect("task should serialize");
        let json: serde_json::Value = serde_json::from_str(&payload).expect("valid json");
        assert_eq!(json["task"], "order_update_manager_notification");
        assert_eq!(json["args"]["order_id"], order_id.to_string());

        let restored = NotificationTask::from_json(&payload).expect("task should deserialize");
        assert_eq!(restored, task);
    }

    #[test]
    fn malformed_payload_is_a_serialize_error() {
        let error = NotificationTask::from_json("{\"task\":\"unknown\"}")
            .expect_err("unknown task must fail");
        assert!(matches!(error, QueueError::Serialize(_)));
    }
}
