//! Order change notifications for clients and managers.
//!
//! # Responsibility
//! - Turn an order diff into a change table addressed to the right people.
//!
//! # Invariants
//! - Client mails never show internal-only fields.
//! - Subjects quote the order number as it was before the change.
//! - Recipient resolution stops at the first source that yields an address.

use crate::config::SiteConfig;
use crate::humanize::{flatten, humanize_record};
use crate::model::entities::{Order, User};
use crate::model::value::Value;
use crate::notify::dispatcher::{DeliveryOutcome, Dispatcher};
use crate::notify::notification::Notification;
use crate::notify::NotifyError;
use crate::render::block::ListKind;
use crate::repo::{RecordRepository, RepoResult};
use crate::state::diff::Diff;
use log::info;
use uuid::Uuid;

/// Order fields kept out of client-facing mails.
pub const CLIENT_EXCLUDED_FIELDS: &[&str] = &["service_marks"];

const AUTHOR_LABEL: &str = "Author of changes";
const CHANGES_HEADER: [&str; 3] = ["Field", "Was", "Now"];
const LINK_LEAD_IN: &str = "To see the details, follow the link:";

/// Builds the client-facing notification, or `None` when nothing visible changed.
///
/// # Errors
/// - Repository lookups of the order, author or recipients fail.
pub fn order_update_client_notification<R: RecordRepository + ?Sized>(
    repo: &R,
    site: &SiteConfig,
    order_id: Uuid,
    author_id: Uuid,
    mut changes: Diff,
) -> Result<Option<Notification>, NotifyError> {
    for field in CLIENT_EXCLUDED_FIELDS {
        changes.remove(field);
    }
    if changes.is_empty() {
        return Ok(None);
    }

    let order = repo.load_order(order_id)?;
    let author = repo.load_user(author_id)?;
    let client_number = previous_client_number(&changes, &order);

    let mut notification = Notification::new(
        format!("Order No. {client_number} changed"),
        "Order changed",
        site,
    );
    notification.add_text(client_number, None);
    add_change_summary(&mut notification, &author, &changes)?;
    notification.add_inner_link(
        &format!("/orders/{order_id}/"),
        "View on portal",
        LINK_LEAD_IN,
        None,
    );
    notification.add_recipients(client_recipients(repo, &order)?);

    Ok(Some(notification))
}

/// Builds the manager-facing notification, or `None` for an empty diff.
///
/// # Errors
/// - Repository lookups of the order, author or recipients fail.
pub fn order_update_manager_notification<R: RecordRepository + ?Sized>(
    repo: &R,
    site: &SiteConfig,
    order_id: Uuid,
    author_id: Uuid,
    changes: Diff,
) -> Result<Option<Notification>, NotifyError> {
    if changes.is_empty() {
        return Ok(None);
    }

    let order = repo.load_order(order_id)?;
    let author = repo.load_user(author_id)?;
    let number = previous_text(&changes, "number", &order.number);
    let client_number = previous_client_number(&changes, &order);
    let subject = format!("Order No. {number} changed");

    let mut notification = Notification::new(subject.clone(), subject, site);
    if client_number != number {
        notification.add_text(client_number, None);
    }
    add_change_summary(&mut notification, &author, &changes)?;
    notification.add_inner_link(
        &format!("/admin/logistics/order/{order_id}/change/"),
        "View in admin",
        LINK_LEAD_IN,
        None,
    );
    notification.add_recipients(manager_recipients(repo, &order, &author)?);

    Ok(Some(notification))
}

/// Builds and sends the client notification.
pub fn notify_client_of_order_update<R: RecordRepository + ?Sized>(
    repo: &R,
    dispatcher: &Dispatcher<'_>,
    site: &SiteConfig,
    order_id: Uuid,
    author_id: Uuid,
    changes: Diff,
) -> Result<DeliveryOutcome, NotifyError> {
    let notification =
        order_update_client_notification(repo, site, order_id, author_id, changes)?;
    Ok(send_or_skip(notification, dispatcher, "client", order_id))
}

/// Builds and sends the manager notification.
pub fn notify_manager_of_order_update<R: RecordRepository + ?Sized>(
    repo: &R,
    dispatcher: &Dispatcher<'_>,
    site: &SiteConfig,
    order_id: Uuid,
    author_id: Uuid,
    changes: Diff,
) -> Result<DeliveryOutcome, NotifyError> {
    let notification =
        order_update_manager_notification(repo, site, order_id, author_id, changes)?;
    Ok(send_or_skip(notification, dispatcher, "manager", order_id))
}

fn send_or_skip(
    notification: Option<Notification>,
    dispatcher: &Dispatcher<'_>,
    audience: &str,
    order_id: Uuid,
) -> DeliveryOutcome {
    match notification {
        Some(notification) => notification.send(dispatcher),
        None => {
            info!(
                "event=order_notification module=notify status=skipped audience={} order_id={} reason=no_changes",
                audience, order_id
            );
            DeliveryOutcome::Skipped
        }
    }
}

fn add_change_summary(
    notification: &mut Notification,
    author: &User,
    changes: &Diff,
) -> Result<(), NotifyError> {
    notification.add_list(
        vec![vec![AUTHOR_LABEL.to_string(), author.display_name()]],
        ListKind::Unordered,
        None,
    );
    notification.add_table(
        CHANGES_HEADER.iter().map(|title| title.to_string()).collect(),
        flatten(humanize_record::<Order>(changes)),
        None,
    )?;
    Ok(())
}

/// Value of `field` before the change, or `current` when it did not change.
fn previous_text(changes: &Diff, field: &str, current: &str) -> String {
    match changes.old_value(field) {
        Some(Value::Text(text)) => text.clone(),
        Some(value) if value.is_null() => String::new(),
        Some(value) => value.display(),
        None => current.to_string(),
    }
}

fn previous_client_number(changes: &Diff, order: &Order) -> String {
    let client_number = previous_text(changes, "client_number", &order.client_number);
    if client_number.trim().is_empty() {
        order.number.clone()
    } else {
        client_number
    }
}

/// Client employee, then client organisation, then every client user.
fn client_recipients<R: RecordRepository + ?Sized>(
    repo: &R,
    order: &Order,
) -> RepoResult<Vec<String>> {
    if let Some(employee) = &order.client_employee {
        if let Some(email) = non_blank(repo.load_user(employee.id)?.email) {
            return Ok(vec![email]);
        }
    }
    let Some(client) = &order.client else {
        return Ok(Vec::new());
    };
    let organisation = repo.load_organisation(client.id)?;
    if let Some(email) = non_blank(organisation.email) {
        return Ok(vec![email]);
    }
    repo.organisation_user_emails(organisation.id)
}

/// Order manager, then the author's main manager, then the expeditor.
fn manager_recipients<R: RecordRepository + ?Sized>(
    repo: &R,
    order: &Order,
    author: &User,
) -> RepoResult<Vec<String>> {
    if let Some(manager) = &order.manager {
        if let Some(email) = non_blank(repo.load_user(manager.id)?.email) {
            return Ok(vec![email]);
        }
    }
    if let Some(main_manager_id) = author.main_manager_id {
        if let Some(email) = non_blank(repo.load_user(main_manager_id)?.email) {
            return Ok(vec![email]);
        }
    }
    let expeditor = repo.expeditor()?;
    if let Some(email) = non_blank(expeditor.email) {
        return Ok(vec![email]);
    }
    repo.organisation_user_emails(expeditor.id)
}

fn non_blank(email: Option<String>) -> Option<String> {
    email.filter(|email| !email.trim().is_empty())
}
