//! OrderService behavior over both stores.

use std::time::Duration;

use web_orders::{
    creation_time, InMemoryOrderStore, OrderDraft, OrderService, OrderStore, ServiceSettings,
    SqliteOrderStore,
};

use crate::support::{draft, gadget, widget};

#[tokio::test]
async fn create_assigns_identity() {
    let service = OrderService::new(InMemoryOrderStore::new());

    let before = creation_time();
    let first = service.create(draft("Ana")).await.unwrap();
    let second = service.create(draft("Bea")).await.unwrap();

    assert!(first.id > 0);
    assert!(second.id > first.id);
    assert!(first.created_at >= before);
    assert!(first.created_at <= creation_time());
}

#[tokio::test]
async fn create_then_get_round_trips() {
    let service = OrderService::new(SqliteOrderStore::open_in_memory().unwrap());

    let created = service
        .create(OrderDraft::new("Ana", vec![widget(), gadget()]))
        .await
        .unwrap();
    let loaded = service.get_by_id(created.id).await.unwrap().unwrap();

    assert_eq!(loaded, created);
    assert_eq!(loaded.items, vec![widget(), gadget()]);
}

#[tokio::test]
async fn update_preserves_id_and_created_at() {
    let service = OrderService::new(SqliteOrderStore::open_in_memory().unwrap());
    let created = service.create(draft("Ana")).await.unwrap();

    let updated = service
        .update(created.id, OrderDraft::new("Bea", vec![gadget()]))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.customer_name, "Bea");
    assert_eq!(updated.items, vec![gadget()]);

    let loaded = service.get_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(loaded, updated);
}

#[tokio::test]
async fn update_missing_is_none() {
    let service = OrderService::new(InMemoryOrderStore::new());
    assert!(service.update(42, draft("Ana")).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_reports_existence() {
    let service = OrderService::new(InMemoryOrderStore::new());
    let created = service.create(draft("Ana")).await.unwrap();

    assert!(service.delete(created.id).await.unwrap());
    assert!(!service.delete(created.id).await.unwrap());
    assert!(service.get_by_id(created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn ids_are_not_reused_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.db");
    let source = format!("Data Source={}", path.display());

    let last = {
        let service = OrderService::new(SqliteOrderStore::open(&source).unwrap());
        service.create(draft("Ana")).await.unwrap();
        let last = service.create(draft("Bea")).await.unwrap();
        assert!(service.delete(last.id).await.unwrap());
        last
    };

    let service = OrderService::new(SqliteOrderStore::open(&source).unwrap());
    let next = service.create(draft("Cid")).await.unwrap();
    assert!(next.id > last.id);
    assert_eq!(service.get_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn list_is_cached_until_a_write() {
    let store = InMemoryOrderStore::new();
    let service = OrderService::new(store.clone());
    service.create(draft("Ana")).await.unwrap();

    assert_eq!(service.get_all().await.unwrap().len(), 1);

    // Bypasses the service, so the cached list stays in place.
    store.insert(draft("Bea"), creation_time()).unwrap();
    assert_eq!(service.get_all().await.unwrap().len(), 1);

    // A write through the service drops the cached list.
    service.create(draft("Cid")).await.unwrap();
    assert_eq!(service.get_all().await.unwrap().len(), 3);
}

#[tokio::test]
async fn single_order_is_invalidated_on_update_and_delete() {
    let store = InMemoryOrderStore::new();
    let service = OrderService::new(store.clone());
    let created = service.create(draft("Ana")).await.unwrap();

    service.get_by_id(created.id).await.unwrap();
    let mut changed = created.clone();
    changed.customer_name = "Changed behind the cache".into();
    store.update(&changed).unwrap();
    assert_eq!(
        service.get_by_id(created.id).await.unwrap().unwrap().customer_name,
        "Ana"
    );

    service.update(created.id, draft("Bea")).await.unwrap();
    assert_eq!(
        service.get_by_id(created.id).await.unwrap().unwrap().customer_name,
        "Bea"
    );

    service.delete(created.id).await.unwrap();
    assert!(service.get_by_id(created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn cache_expires_after_ttl() {
    let store = InMemoryOrderStore::new();
    let service = OrderService::with_settings(
        store.clone(),
        ServiceSettings {
            cache_ttl: Duration::from_millis(30),
            ..ServiceSettings::default()
        },
    );

    assert!(service.get_all().await.unwrap().is_empty());
    store.insert(draft("Ana"), creation_time()).unwrap();
    assert!(service.get_all().await.unwrap().is_empty());

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(service.get_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn misses_are_not_cached() {
    let store = InMemoryOrderStore::new();
    let service = OrderService::new(store.clone());

    assert!(service.get_by_id(1).await.unwrap().is_none());
    let inserted = store.insert(draft("Ana"), creation_time()).unwrap();
    assert_eq!(inserted.id, 1);
    assert!(service.get_by_id(1).await.unwrap().is_some());
}

#[tokio::test]
async fn health_pings_the_store() {
    let service = OrderService::new(SqliteOrderStore::open_in_memory().unwrap());
    service.health().await.unwrap();
    assert_eq!(service.store().kind(), "sqlite");
}
