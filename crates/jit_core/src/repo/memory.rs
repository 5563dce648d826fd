//! In-process record repository.

use crate::model::entities::{Cargo, Order, Organisation, User};
use crate::repo::{RecordRepository, RepoError, RepoResult};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Repository over records held in memory, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordRepository {
    orders: BTreeMap<Uuid, Order>,
    cargos: Vec<Cargo>,
    users: BTreeMap<Uuid, User>,
    organisations: BTreeMap<Uuid, Organisation>,
}

impl InMemoryRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `order`, assigning an id when it has none. Returns the id.
    pub fn put_order(&mut self, mut order: Order) -> Uuid {
        let id = *order.id.get_or_insert_with(Uuid::new_v4);
        self.orders.insert(id, order);
        id
    }

    /// Appends one cargo line; lines keep insertion order.
    pub fn put_cargo(&mut self, cargo: Cargo) {
        self.cargos.retain(|existing| existing.id != cargo.id);
        self.cargos.push(cargo);
    }

    pub fn put_user(&mut self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn put_organisation(&mut self, organisation: Organisation) {
        self.organisations.insert(organisation.id, organisation);
    }
}

impl RecordRepository for InMemoryRecordRepository {
    fn load_order(&self, id: Uuid) -> RepoResult<Order> {
        self.orders
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound { kind: "order", id })
    }

    fn load_cargos(&self, order_id: Uuid) -> RepoResult<Vec<Cargo>> {
        Ok(self
            .cargos
            .iter()
            .filter(|cargo| cargo.order_id == order_id)
            .cloned()
            .collect())
    }

    fn load_user(&self, id: Uuid) -> RepoResult<User> {
        self.users
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound { kind: "user", id })
    }

    fn load_organisation(&self, id: Uuid) -> RepoResult<Organisation> {
        self.organisations
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound {
                kind: "organisation",
                id,
            })
    }

    fn expeditor(&self) -> RepoResult<Organisation> {
        self.organisations
            .values()
            .find(|organisation| organisation.is_expeditor)
            .cloned()
            .ok_or(RepoError::NoExpeditor)
    }

    fn organisation_user_emails(&self, organisation_id: Uuid) -> RepoResult<Vec<String>> {
        Ok(self
            .users
            .values()
            .filter(|user| user.organisation_id == organisation_id)
            .filter_map(|user| user.email.clone())
            .filter(|email| !email.trim().is_empty())
            .collect())
    }
}
