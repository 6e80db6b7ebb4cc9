//! Order stores - durable, id-addressed storage for orders.
//!
//! A store persists one row per order with the items kept as a single
//! serialized unit. Ids are assigned by the store on insert and never
//! reused.
//!
//! ## Example
//!
//! ```ignore
//! use web_orders::{OrderStore, SqliteOrderStore};
//!
//! let store = SqliteOrderStore::open("Data Source=orders.db")?;
//! let order = store.insert(draft, creation_time())?;
//! let loaded = store.fetch(order.id)?;
//! ```

mod in_memory;
pub mod seed;
mod sqlite;

use chrono::{DateTime, Utc};

use crate::order::{Order, OrderDraft, OrderId};

pub use in_memory::InMemoryOrderStore;
pub use sqlite::SqliteOrderStore;

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No row with this id.
    #[error("order not found: {0}")]
    NotFound(OrderId),
    /// A store lock was poisoned by a panicking writer.
    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),
    /// The items column could not be encoded or decoded.
    #[error("order items serialization error: {0}")]
    Serde(String),
    /// SQLite failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serde(err.to_string())
    }
}

/// Abstract CRUD storage for orders.
pub trait OrderStore: Send + Sync {
    /// Insert a new order and assign it a fresh id.
    fn insert(&self, draft: OrderDraft, created_at: DateTime<Utc>) -> Result<Order, StoreError>;

    /// Get an order by id. Returns `None` if not found.
    fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// All orders, ordered by id.
    fn all(&self) -> Result<Vec<Order>, StoreError>;

    /// Replace the customer name and items of an existing row.
    ///
    /// Fails with [`StoreError::NotFound`] if the row is gone.
    fn update(&self, order: &Order) -> Result<Order, StoreError>;

    /// Delete an order by id. Returns true if it existed.
    fn delete(&self, id: OrderId) -> Result<bool, StoreError>;

    /// Check that the backing storage is reachable.
    fn ping(&self) -> Result<(), StoreError>;

    /// Short label for health output.
    fn kind(&self) -> &'static str;

    /// Get an order by id, failing with [`StoreError::NotFound`] on a miss.
    fn fetch(&self, id: OrderId) -> Result<Order, StoreError> {
        self.get(id)?.ok_or(StoreError::NotFound(id))
    }
}
