//! InMemoryOrderStore - map-backed order store for testing and development.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use super::{OrderStore, StoreError};
use crate::order::{Order, OrderDraft, OrderId};

struct Storage {
    rows: BTreeMap<OrderId, Order>,
    last_id: OrderId,
}

/// In-memory order store.
///
/// Ids come from a counter that only moves forward, so deleted ids are not
/// handed out again. Clone-friendly via Arc.
#[derive(Clone)]
pub struct InMemoryOrderStore {
    storage: Arc<RwLock<Storage>>,
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryOrderStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(Storage {
                rows: BTreeMap::new(),
                last_id: 0,
            })),
        }
    }

    /// Number of stored orders.
    pub fn len(&self) -> usize {
        self.storage.read().map(|s| s.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OrderStore for InMemoryOrderStore {
    fn insert(&self, draft: OrderDraft, created_at: DateTime<Utc>) -> Result<Order, StoreError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::LockPoisoned("insert"))?;

        storage.last_id += 1;
        let order = draft.into_order(storage.last_id, created_at);
        storage.rows.insert(order.id, order.clone());

        Ok(order)
    }

    fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("get"))?;

        Ok(storage.rows.get(&id).cloned())
    }

    fn all(&self) -> Result<Vec<Order>, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("all"))?;

        Ok(storage.rows.values().cloned().collect())
    }

    fn update(&self, order: &Order) -> Result<Order, StoreError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::LockPoisoned("update"))?;

        let row = storage
            .rows
            .get_mut(&order.id)
            .ok_or(StoreError::NotFound(order.id))?;
        row.customer_name = order.customer_name.clone();
        row.items = order.items.clone();

        Ok(row.clone())
    }

    fn delete(&self, id: OrderId) -> Result<bool, StoreError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::LockPoisoned("delete"))?;

        Ok(storage.rows.remove(&id).is_some())
    }

    fn ping(&self) -> Result<(), StoreError> {
        self.storage
            .read()
            .map(|_| ())
            .map_err(|_| StoreError::LockPoisoned("ping"))
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}
