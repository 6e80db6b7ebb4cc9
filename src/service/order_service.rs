use std::sync::Arc;

use tracing::{debug, info, warn};

use super::feed::{self, CancelSignal, OrderFeed};
use super::{ServiceError, ServiceSettings};
use crate::cache::{CacheKey, TtlCache};
use crate::order::{creation_time, Order, OrderDraft, OrderId};
use crate::store::{OrderStore, StoreError};

#[derive(Clone)]
enum Cached {
    List(Arc<Vec<Order>>),
    Single(Order),
}

/// CRUD operations over orders with a short-lived read cache.
///
/// Store calls are synchronous, so they run on tokio's blocking pool.
pub struct OrderService<S> {
    store: Arc<S>,
    cache: TtlCache<Cached>,
    settings: ServiceSettings,
}

impl<S: OrderStore + 'static> OrderService<S> {
    /// Create a service with default settings (30s cache, 5s feed interval).
    pub fn new(store: S) -> Self {
        Self::with_settings(store, ServiceSettings::default())
    }

    pub fn with_settings(store: S, settings: ServiceSettings) -> Self {
        Self {
            store: Arc::new(store),
            cache: TtlCache::new(settings.cache_ttl),
            settings,
        }
    }

    /// Get a reference to the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let result = tokio::task::spawn_blocking(move || op(&store)).await?;
        Ok(result?)
    }

    fn invalidate(&self, id: OrderId) {
        debug!(order_id = id, "invalidating cache");
        self.cache.invalidate(&CacheKey::all_orders());
        self.cache.invalidate(&CacheKey::order(id));
    }

    /// All orders. Served from cache when a previous call filled it within the TTL.
    pub async fn get_all(&self) -> Result<Vec<Order>, ServiceError> {
        let key = CacheKey::all_orders();
        if let Some(Cached::List(orders)) = self.cache.get(&key) {
            debug!(count = orders.len(), "retrieved orders from cache");
            return Ok(orders.as_ref().clone());
        }

        let orders = self.blocking(|store| store.all()).await?;
        info!(count = orders.len(), "retrieved orders from store");

        self.cache.purge_expired();
        self.cache.insert(key, Cached::List(Arc::new(orders.clone())));
        Ok(orders)
    }

    /// One order, or `None` when absent. Misses are not cached.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, ServiceError> {
        let key = CacheKey::order(id);
        if let Some(Cached::Single(order)) = self.cache.get(&key) {
            debug!(order_id = id, "retrieved order from cache");
            return Ok(Some(order));
        }

        match self.blocking(move |store| store.get(id)).await? {
            Some(order) => {
                self.cache.insert(key, Cached::Single(order.clone()));
                Ok(Some(order))
            }
            None => {
                warn!(order_id = id, "order not found");
                Ok(None)
            }
        }
    }

    /// Persist a new order. The id and creation time are assigned here.
    pub async fn create(&self, draft: OrderDraft) -> Result<Order, ServiceError> {
        info!(customer = %draft.customer_name, "creating order");

        let created_at = creation_time();
        let order = self
            .blocking(move |store| store.insert(draft, created_at))
            .await?;
        self.invalidate(order.id);

        info!(order_id = order.id, customer = %order.customer_name, "created order");
        Ok(order)
    }

    /// Replace the customer name and items of an order.
    ///
    /// Returns `None` if the order does not exist. `id` and `created_at`
    /// are never changed.
    pub async fn update(
        &self,
        id: OrderId,
        draft: OrderDraft,
    ) -> Result<Option<Order>, ServiceError> {
        info!(order_id = id, "updating order");

        let updated = self
            .blocking(move |store| {
                let Some(mut existing) = store.get(id)? else {
                    return Ok(None);
                };
                existing.apply(draft);
                match store.update(&existing) {
                    Ok(order) => Ok(Some(order)),
                    Err(StoreError::NotFound(_)) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await?;

        match &updated {
            Some(_) => {
                self.invalidate(id);
                info!(order_id = id, "updated order");
            }
            None => warn!(order_id = id, "order not found for update"),
        }
        Ok(updated)
    }

    /// Delete an order. Returns false if it did not exist.
    pub async fn delete(&self, id: OrderId) -> Result<bool, ServiceError> {
        info!(order_id = id, "deleting order");

        let deleted = self.blocking(move |store| store.delete(id)).await?;
        if deleted {
            self.invalidate(id);
            info!(order_id = id, "deleted order");
        } else {
            warn!(order_id = id, "order not found for deletion");
        }
        Ok(deleted)
    }

    /// Start a feed that emits the full order set every feed interval,
    /// read straight from the store, until `signal` fires or the feed is
    /// dropped.
    pub fn stream_all(&self, signal: CancelSignal) -> OrderFeed {
        feed::spawn(Arc::clone(&self.store), self.settings.feed_interval, signal)
    }

    /// Check the store connection.
    pub async fn health(&self) -> Result<(), ServiceError> {
        self.blocking(|store| store.ping()).await
    }
}
