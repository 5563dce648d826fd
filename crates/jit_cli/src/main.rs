//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `jit_core` linkage with deterministic probe output.
//! - Run one order change through the full notification pipeline.
//!
//! Usage: `jit_cli [config.toml]`

use jit_core::model::entities::CARGOS_RELATION;
use jit_core::notify::{submit_order_changes, InlineQueue};
use jit_core::{
    capture_snapshot_with_relation, compute_diff, init_logging, Cargo, ChannelError,
    DeliveryChannel, Dispatcher, InMemoryRecordRepository, JitConfig, Order, OrderStatus,
    Organisation, OutgoingMessage, RecordRef, RecordRepository, User,
};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

/// Prints messages instead of sending them.
struct StdoutChannel;

impl DeliveryChannel for StdoutChannel {
    fn deliver(&self, message: &OutgoingMessage) -> Result<usize, ChannelError> {
        println!("--- to: {}", message.recipients.join(", "));
        println!("subject: {}", message.subject);
        println!("{}", message.text_body);
        Ok(message.recipients.len())
    }
}

fn main() -> ExitCode {
    println!("jit_core ping={}", jit_core::ping());
    println!("jit_core version={}", jit_core::core_version());

    match run_demo() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("demo failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_demo() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => JitConfig::load_from(&PathBuf::from(path))?,
        None => JitConfig::default(),
    };
    init_logging(&config.logging)?;

    let (repo, order_id, author_id) = seed_repository();
    let before = repo.load_order(order_id)?;
    let old = capture_snapshot_with_relation(&before, &repo, CARGOS_RELATION)?;

    let mut repo = repo;
    let mut after = before.clone();
    after.status = OrderStatus::InProgress;
    after.to_address = "Kazan, Tatarstan st. 12".to_string();
    repo.put_order(after.clone());
    repo.put_cargo(Cargo {
        id: Uuid::new_v4(),
        order_id,
        mark: Some("B-2".to_string()),
        package: "box".to_string(),
        length: 60.0,
        width: 40.0,
        height: 40.0,
        weight: 12.5,
        quantity: 2,
    });
    let new = capture_snapshot_with_relation(&after, &repo, CARGOS_RELATION)?;
    let changes = compute_diff(&old, &new);
    info!(
        "event=demo_diff module=cli status=ok order_id={} changes={}",
        order_id,
        changes.len()
    );

    let channel = StdoutChannel;
    let dispatcher = Dispatcher::new(&channel, &config.mail);
    let queue = InlineQueue::new(&repo, &dispatcher, &config.site);
    let submitted = submit_order_changes(&queue, order_id, author_id, changes)?;

    println!("tasks submitted={submitted}");
    for outcome in queue.outcomes() {
        println!("outcome={outcome}");
    }
    Ok(())
}

fn seed_repository() -> (InMemoryRecordRepository, Uuid, Uuid) {
    let mut repo = InMemoryRecordRepository::new();

    let expeditor = Organisation {
        id: Uuid::new_v4(),
        name: "JIT Logistics".to_string(),
        legal_name: "JIT Logistics LLC".to_string(),
        email: Some("managers@jit.example".to_string()),
        is_client: false,
        is_expeditor: true,
    };
    let client = Organisation {
        id: Uuid::new_v4(),
        name: "Acme".to_string(),
        legal_name: "Acme Trading LLC".to_string(),
        email: Some("orders@acme.example".to_string()),
        is_client: true,
        is_expeditor: false,
    };
    let author = User {
        id: Uuid::new_v4(),
        username: "operator".to_string(),
        last_name: "petrova".to_string(),
        first_name: "anna".to_string(),
        second_name: String::new(),
        email: Some("operator@jit.example".to_string()),
        organisation_id: expeditor.id,
        main_manager_id: None,
    };

    let mut order = Order::draft("1024");
    order.client_number = "ACME-77".to_string();
    order.client = Some(client.to_record_ref());
    order.from_address = "Moscow, Lenina st. 1".to_string();
    order.to_address = "Kazan".to_string();
    order.manager = Some(RecordRef::new(author.id, author.display_name()));
    let author_id = author.id;

    repo.put_organisation(expeditor);
    repo.put_organisation(client);
    repo.put_user(author);
    let order_id = repo.put_order(order);
    repo.put_cargo(Cargo {
        id: Uuid::new_v4(),
        order_id,
        mark: Some("A-1".to_string()),
        package: "pallet".to_string(),
        length: 120.0,
        width: 80.0,
        height: 100.0,
        weight: 250.0,
        quantity: 1,
    });

    (repo, order_id, author_id)
}
