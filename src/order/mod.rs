//! Orders - the single persisted entity and its line items.
//!
//! An [`Order`] is identified by a store-assigned [`OrderId`] and carries a
//! customer name, a creation timestamp and an ordered list of
//! [`OrderItem`]s. Writes go through an [`OrderDraft`], which has no id or
//! timestamp: those are always assigned server-side.
//!
//! ## Example
//!
//! ```ignore
//! use rust_decimal::Decimal;
//! use web_orders::{OrderDraft, OrderItem};
//!
//! let draft = OrderDraft::new(
//!     "Ana",
//!     vec![OrderItem::new("A1", "Widget", 2, Decimal::new(999, 2))],
//! );
//! let order = service.create(draft).await?;
//! assert!(order.id > 0);
//! ```

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Store-assigned order identifier.
pub type OrderId = i64;

/// A line entry of an order. Has no identity of its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub sku: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl OrderItem {
    pub fn new(
        sku: impl Into<String>,
        description: impl Into<String>,
        quantity: u32,
        unit_price: Decimal,
    ) -> Self {
        Self {
            sku: sku.into(),
            description: description.into(),
            quantity,
            unit_price,
        }
    }
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Replace the mutable part of the order. `id` and `created_at` are kept.
    pub fn apply(&mut self, draft: OrderDraft) {
        self.customer_name = draft.customer_name;
        self.items = draft.items;
    }
}

/// The writable fields of an order, used for both create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub customer_name: String,
    pub items: Vec<OrderItem>,
}

impl OrderDraft {
    pub fn new(customer_name: impl Into<String>, items: Vec<OrderItem>) -> Self {
        Self {
            customer_name: customer_name.into(),
            items,
        }
    }

    /// Build the order a store persists for this draft.
    pub(crate) fn into_order(self, id: OrderId, created_at: DateTime<Utc>) -> Order {
        Order {
            id,
            customer_name: self.customer_name,
            created_at,
            items: self.items,
        }
    }
}

/// Creation timestamp for a new order.
///
/// Millisecond precision, so the value read back from storage compares equal
/// to the one returned by create.
pub fn creation_time() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
