//! SqliteOrderStore - SQLite-backed order store.
//!
//! One table, one row per order. `items` is a TEXT column holding the JSON
//! encoding of the item list; it is written and read as a whole.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{OrderStore, StoreError};
use crate::order::{Order, OrderDraft, OrderId, OrderItem};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_name TEXT NOT NULL,
        created_at TEXT NOT NULL,
        items TEXT NOT NULL
    );
";

const SELECT_COLUMNS: &str = "SELECT id, customer_name, created_at, items FROM orders";

/// SQLite order store. Clone-friendly via Arc; clones share the connection.
#[derive(Clone)]
pub struct SqliteOrderStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteOrderStore {
    /// Open (or create) a database file.
    ///
    /// Accepts a plain path or a `Data Source=<path>` connection string.
    pub fn open(source: &str) -> Result<Self, StoreError> {
        let path = data_source_path(source);
        tracing::info!(path = %path, "opening sqlite order store");
        Self::from_connection(Connection::open(Path::new(path))?)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self, operation: &'static str) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::LockPoisoned(operation))
    }
}

/// Strip an optional `Data Source=` prefix from a connection string.
fn data_source_path(source: &str) -> &str {
    let trimmed = source.trim();
    match trimmed.split_once('=') {
        Some((key, value)) if key.trim().eq_ignore_ascii_case("data source") => {
            value.trim().trim_end_matches(';')
        }
        _ => trimmed,
    }
}

/// Raw column values; the items blob is decoded outside the rusqlite closure.
struct OrderRow {
    id: OrderId,
    customer_name: String,
    created_at: DateTime<Utc>,
    items: String,
}

impl OrderRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            customer_name: row.get(1)?,
            created_at: row.get(2)?,
            items: row.get(3)?,
        })
    }

    fn into_order(self) -> Result<Order, StoreError> {
        let items: Vec<OrderItem> = serde_json::from_str(&self.items)?;
        Ok(Order {
            id: self.id,
            customer_name: self.customer_name,
            created_at: self.created_at,
            items,
        })
    }
}

impl OrderStore for SqliteOrderStore {
    fn insert(&self, draft: OrderDraft, created_at: DateTime<Utc>) -> Result<Order, StoreError> {
        let items = serde_json::to_string(&draft.items)?;
        let conn = self.lock("insert")?;

        conn.execute(
            "INSERT INTO orders (customer_name, created_at, items) VALUES (?1, ?2, ?3)",
            params![draft.customer_name, created_at, items],
        )?;
        let id = conn.last_insert_rowid();

        Ok(draft.into_order(id, created_at))
    }

    fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let conn = self.lock("get")?;
        let row = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id],
                OrderRow::read,
            )
            .optional()?;

        row.map(OrderRow::into_order).transpose()
    }

    fn all(&self) -> Result<Vec<Order>, StoreError> {
        let conn = self.lock("all")?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY id"))?;
        let rows = stmt
            .query_map([], OrderRow::read)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }

    fn update(&self, order: &Order) -> Result<Order, StoreError> {
        let items = serde_json::to_string(&order.items)?;
        {
            let conn = self.lock("update")?;
            let changed = conn.execute(
                "UPDATE orders SET customer_name = ?1, items = ?2 WHERE id = ?3",
                params![order.customer_name, items, order.id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(order.id));
            }
        }

        self.fetch(order.id)
    }

    fn delete(&self, id: OrderId) -> Result<bool, StoreError> {
        let conn = self.lock("delete")?;
        let removed = conn.execute("DELETE FROM orders WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    fn ping(&self) -> Result<(), StoreError> {
        let conn = self.lock("ping")?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "sqlite"
    }
}
