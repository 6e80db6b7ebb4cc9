//! Sample data loaded into an empty store on startup.

use chrono::{Duration, SubsecRound, Utc};
use rust_decimal::Decimal;

use super::{OrderStore, StoreError};
use crate::order::{OrderDraft, OrderItem};

fn item(sku: &str, description: &str, quantity: u32, cents: i64) -> OrderItem {
    OrderItem::new(sku, description, quantity, Decimal::new(cents, 2))
}

/// The sample orders with their age relative to now.
fn samples() -> Vec<(Duration, OrderDraft)> {
    vec![
        (
            Duration::days(5),
            OrderDraft::new(
                "Juan Pérez",
                vec![
                    item("LAP-001", "Laptop Dell XPS 15", 1, 129999),
                    item("MOU-002", "Mouse Logitech MX Master 3", 1, 9999),
                ],
            ),
        ),
        (
            Duration::days(3),
            OrderDraft::new(
                "María García",
                vec![
                    item("PHN-003", "iPhone 15 Pro", 2, 99900),
                    item("CASE-004", "Case protectora transparente", 2, 2999),
                ],
            ),
        ),
        (
            Duration::days(1),
            OrderDraft::new(
                "Carlos Rodríguez",
                vec![
                    item("TAB-005", "iPad Air 11 pulgadas", 1, 59900),
                    item("PEN-006", "Apple Pencil (2da generación)", 1, 12900),
                    item("KEY-007", "Magic Keyboard para iPad", 1, 29900),
                ],
            ),
        ),
        (
            Duration::hours(12),
            OrderDraft::new(
                "Ana Martínez",
                vec![item("MON-008", "Monitor LG UltraWide 34 pulgadas", 2, 44999)],
            ),
        ),
        (
            Duration::hours(2),
            OrderDraft::new(
                "Pedro López",
                vec![
                    item("KB-009", "Teclado mecánico Keychron K8", 1, 8999),
                    item("MOU-002", "Mouse Logitech MX Master 3", 1, 9999),
                    item("PAD-010", "Mouse pad extendido", 1, 2499),
                ],
            ),
        ),
    ]
}

/// Insert the sample orders if the store holds no orders yet.
///
/// Returns the number of orders inserted.
pub fn seed_if_empty<S: OrderStore + ?Sized>(store: &S) -> Result<usize, StoreError> {
    if !store.all()?.is_empty() {
        tracing::debug!("store already has orders, skipping seed");
        return Ok(0);
    }

    let now = Utc::now().trunc_subsecs(3);
    let mut inserted = 0;
    for (age, draft) in samples() {
        store.insert(draft, now - age)?;
        inserted += 1;
    }

    tracing::info!(count = inserted, "seeded sample orders");
    Ok(inserted)
}
