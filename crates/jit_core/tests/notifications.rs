use jit_core::notify::{
    notify_client_of_order_update, notify_manager_of_order_update,
    order_update_client_notification, order_update_manager_notification, submit_order_changes,
    InlineQueue,
};
use jit_core::{
    capture_snapshot, compute_diff, ChannelError, DeliveryChannel, DeliveryOutcome, Diff,
    Dispatcher, InMemoryRecordRepository, MailConfig, Order, OrderStatus, Organisation,
    OutgoingMessage, RecordRef, RecordRepository, SiteConfig, User,
};
use std::cell::RefCell;
use uuid::Uuid;

#[derive(Default)]
struct RecordingChannel {
    sent: RefCell<Vec<OutgoingMessage>>,
}

impl DeliveryChannel for RecordingChannel {
    fn deliver(&self, message: &OutgoingMessage) -> Result<usize, ChannelError> {
        self.sent.borrow_mut().push(message.clone());
        Ok(1)
    }
}

struct FailingChannel;

impl DeliveryChannel for FailingChannel {
    fn deliver(&self, _message: &OutgoingMessage) -> Result<usize, ChannelError> {
        Err(ChannelError::new("smtp relay unavailable"))
    }
}

struct World {
    repo: InMemoryRecordRepository,
    order_id: Uuid,
    author_id: Uuid,
    client_id: Uuid,
    expeditor_id: Uuid,
}

fn site() -> SiteConfig {
    SiteConfig {
        domain: "jit.example".to_string(),
    }
}

fn organisation(name: &str, email: Option<&str>, is_expeditor: bool) -> Organisation {
    Organisation {
        id: Uuid::new_v4(),
        name: name.to_string(),
        legal_name: format!("{name} LLC"),
        email: email.map(str::to_string),
        is_client: !is_expeditor,
        is_expeditor,
    }
}

fn user(username: &str, email: Option<&str>, organisation_id: Uuid) -> User {
    User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        last_name: String::new(),
        first_name: String::new(),
        second_name: String::new(),
        email: email.map(str::to_string),
        organisation_id,
        main_manager_id: None,
    }
}

fn world() -> World {
    let mut repo = InMemoryRecordRepository::new();
    let expeditor = organisation("JIT", Some("managers@jit.example"), true);
    let client = organisation("Acme", Some("orders@acme.example"), false);
    let mut author = user("operator", Some("operator@jit.example"), expeditor.id);
    author.last_name = "petrova".to_string();
    author.first_name = "anna".to_string();

    let mut order = Order::draft("8593");
    order.client_number = "ACME-77".to_string();
    order.client = Some(client.to_record_ref());

    let author_id = author.id;
    let client_id = client.id;
    let expeditor_id = expeditor.id;
    repo.put_organisation(expeditor);
    repo.put_organisation(client);
    repo.put_user(author);
    let order_id = repo.put_order(order);

    World {
        repo,
        order_id,
        author_id,
        client_id,
        expeditor_id,
    }
}

fn change_order(world: &mut World, mutate: impl FnOnce(&mut Order)) -> Diff {
    let before = world.repo.load_order(world.order_id).unwrap();
    let old = capture_snapshot(&before, None).unwrap();
    let mut after = before.clone();
    mutate(&mut after);
    let new = capture_snapshot(&after, None).unwrap();
    world.repo.put_order(after);
    compute_diff(&old, &new)
}

#[test]
fn client_mail_goes_to_client_organisation_with_change_table() {
    let mut world = world();
    let diff = change_order(&mut world, |order| order.status = OrderStatus::Delivered);

    let notification = order_update_client_notification(
        &world.repo,
        &site(),
        world.order_id,
        world.author_id,
        diff,
    )
    .unwrap()
    .expect("visible change should produce a notification");

    assert_eq!(notification.subject(), "Order No. ACME-77 changed");
    assert_eq!(notification.recipients(), &["orders@acme.example".to_string()]);

    let text = notification.render().text;
    assert!(text.starts_with("Order changed\n\nACME-77"));
    assert!(text.contains("Author of changes: Petrova Anna"));
    assert!(text.contains("Status. Was: New. Now: Delivered"));
    assert!(text.contains(&format!(
        "View on portal: http://jit.example/orders/{}/",
        world.order_id
    )));
}

#[test]
fn client_employee_email_takes_precedence() {
    let mut world = world();
    let employee = user("buyer", Some("buyer@acme.example"), world.client_id);
    let employee_ref = RecordRef::new(employee.id, employee.display_name());
    world.repo.put_user(employee);
    let diff = change_order(&mut world, |order| {
        order.client_employee = Some(employee_ref);
        order.comment = Some("call before delivery".to_string());
    });

    let notification = order_update_client_notification(
        &world.repo,
        &site(),
        world.order_id,
        world.author_id,
        diff,
    )
    .unwrap()
    .unwrap();

    assert_eq!(notification.recipients(), &["buyer@acme.example".to_string()]);
}

#[test]
fn client_without_email_falls_back_to_its_users() {
    let mut world = world();
    let mut client = organisation("Acme", None, false);
    client.id = world.client_id;
    world.repo.put_organisation(client);
    world
        .repo
        .put_user(user("first", Some("first@acme.example"), world.client_id));
    world.repo.put_user(user("silent", None, world.client_id));
    let diff = change_order(&mut world, |order| order.cargo_name = "Valves".to_string());

    let notification = order_update_client_notification(
        &world.repo,
        &site(),
        world.order_id,
        world.author_id,
        diff,
    )
    .unwrap()
    .unwrap();

    assert_eq!(notification.recipients(), &["first@acme.example".to_string()]);
}

#[test]
fn service_marks_never_reach_the_client() {
    let mut world = world();
    let diff = change_order(&mut world, |order| {
        order.service_marks = Some("internal".to_string())
    });
    let channel = RecordingChannel::default();
    let dispatcher = Dispatcher::new(&channel, &MailConfig::default());

    let client_outcome = notify_client_of_order_update(
        &world.repo,
        &dispatcher,
        &site(),
        world.order_id,
        world.author_id,
        diff.clone(),
    )
    .unwrap();
    assert_eq!(client_outcome, DeliveryOutcome::Skipped);
    assert!(channel.sent.borrow().is_empty());

    let manager_outcome = notify_manager_of_order_update(
        &world.repo,
        &dispatcher,
        &site(),
        world.order_id,
        world.author_id,
        diff,
    )
    .unwrap();
    assert_eq!(manager_outcome, DeliveryOutcome::Success);
    let sent = channel.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text_body.contains("Service marks"));
}

#[test]
fn manager_subject_uses_number_before_the_change() {
    let mut world = world();
    let diff = change_order(&mut world, |order| order.number = "8600".to_string());

    let notification = order_update_manager_notification(
        &world.repo,
        &site(),
        world.order_id,
        world.author_id,
        diff,
    )
    .unwrap()
    .unwrap();

    assert_eq!(notification.subject(), "Order No. 8593 changed");
    let text = notification.render().text;
    assert!(text.starts_with("Order No. 8593 changed\n\nACME-77"));
    assert!(text.contains(&format!(
        "View in admin: http://jit.example/admin/logistics/order/{}/change/",
        world.order_id
    )));
}

#[test]
fn manager_recipients_follow_resolution_chain() {
    let mut world = world();

    let diff = change_order(&mut world, |order| order.price = Some(1200.0));
    let notification = order_update_manager_notification(
        &world.repo,
        &site(),
        world.order_id,
        world.author_id,
        diff.clone(),
    )
    .unwrap()
    .unwrap();
    assert_eq!(notification.recipients(), &["managers@jit.example".to_string()]);

    let main_manager = user("lead", Some("lead@jit.example"), world.expeditor_id);
    let main_manager_id = main_manager.id;
    world.repo.put_user(main_manager);
    let mut author = user("operator", Some("operator@jit.example"), world.expeditor_id);
    author.id = world.author_id;
    author.main_manager_id = Some(main_manager_id);
    world.repo.put_user(author);
    let notification = order_update_manager_notification(
        &world.repo,
        &site(),
        world.order_id,
        world.author_id,
        diff.clone(),
    )
    .unwrap()
    .unwrap();
    assert_eq!(notification.recipients(), &["lead@jit.example".to_string()]);

    let manager = user("owner", Some("owner@jit.example"), world.expeditor_id);
    let manager_ref = RecordRef::new(manager.id, manager.display_name());
    world.repo.put_user(manager);
    change_order(&mut world, |order| order.manager = Some(manager_ref));
    let notification = order_update_manager_notification(
        &world.repo,
        &site(),
        world.order_id,
        world.author_id,
        diff,
    )
    .unwrap()
    .unwrap();
    assert_eq!(notification.recipients(), &["owner@jit.example".to_string()]);
}

#[test]
fn failing_channel_yields_error_outcome() {
    let mut world = world();
    let diff = change_order(&mut world, |order| order.status = OrderStatus::Complete);
    let channel = FailingChannel;
    let dispatcher = Dispatcher::new(&channel, &MailConfig::default());

    let outcome = notify_client_of_order_update(
        &world.repo,
        &dispatcher,
        &site(),
        world.order_id,
        world.author_id,
        diff,
    )
    .unwrap();

    assert_eq!(
        outcome,
        DeliveryOutcome::Error("smtp relay unavailable".to_string())
    );
}

#[test]
fn missing_order_is_a_preparation_error() {
    let world = world();
    let diff = {
        let old = capture_snapshot(&Order::draft("1"), None).unwrap();
        let new = capture_snapshot(&Order::draft("2"), None).unwrap();
        compute_diff(&old, &new)
    };

    let result = order_update_manager_notification(
        &world.repo,
        &site(),
        Uuid::new_v4(),
        world.author_id,
        diff,
    );
    assert!(result.is_err());
}

#[test]
fn inline_queue_runs_both_notifications() {
    let mut world = world();
    let diff = change_order(&mut world, |order| order.status = OrderStatus::Prepare);
    let channel = RecordingChannel::default();
    let dispatcher = Dispatcher::new(&channel, &MailConfig::default());
    let queue = InlineQueue::new(&world.repo, &dispatcher, &site());

    let submitted = submit_order_changes(&queue, world.order_id, world.author_id, diff).unwrap();

    assert_eq!(submitted, 2);
    assert_eq!(
        queue.outcomes(),
        vec![DeliveryOutcome::Success, DeliveryOutcome::Success]
    );
    let recipients = channel
        .sent
        .borrow()
        .iter()
        .map(|message| message.recipients.clone())
        .collect::<Vec<_>>();
    assert_eq!(
        recipients,
        vec![
            vec!["orders@acme.example".to_string()],
            vec!["managers@jit.example".to_string()]
        ]
    );
}

#[test]
fn disabled_sending_reports_disabled_without_delivery() {
    let mut world = world();
    let diff = change_order(&mut world, |order| order.status = OrderStatus::Prepare);
    let channel = RecordingChannel::default();
    let mail = MailConfig {
        allow_send: false,
        ..MailConfig::default()
    };
    let dispatcher = Dispatcher::new(&channel, &mail);

    let outcome = notify_manager_of_order_update(
        &world.repo,
        &dispatcher,
        &site(),
        world.order_id,
        world.author_id,
        diff,
    )
    .unwrap();

    assert_eq!(outcome, DeliveryOutcome::Disabled);
    assert!(channel.sent.borrow().is_empty());
}

#[test]
fn client_number_markup_is_escaped_in_mail() {
    let mut world = world();
    let mut order = world.repo.load_order(world.order_id).unwrap();
    order.client_number = "<img src=x onerror=alert(1)>".to_string();
    world.repo.put_order(order);
    let diff = change_order(&mut world, |order| order.status = OrderStatus::Delivered);

    for notification in [
        order_update_client_notification(
            &world.repo,
            &site(),
            world.order_id,
            world.author_id,
            diff.clone(),
        ),
        order_update_manager_notification(
            &world.repo,
            &site(),
            world.order_id,
            world.author_id,
            diff.clone(),
        ),
    ] {
        let rendered = notification.unwrap().expect("status change is visible").render();
        assert!(!rendered.html.contains("<img src=x"));
        assert!(rendered.html.contains("&lt;img src=x onerror=alert(1)&gt;"));
        assert!(rendered.text.contains("<img src=x onerror=alert(1)>"));
    }
}
