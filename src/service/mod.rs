//! Order service - CRUD façade over an [`OrderStore`](crate::OrderStore).
//!
//! Reads go through a [`TtlCache`](crate::TtlCache); writes invalidate the
//! list entry and the affected order's entry. [`OrderService::stream_all`]
//! starts a polling feed that re-reads the whole store on an interval.
//!
//! Absence is not an error here: lookups return `Option`, deletes return
//! `bool`. [`ServiceError`] is reserved for unexpected failures.

mod feed;
mod order_service;

use std::time::Duration;

use crate::store::StoreError;

pub use feed::{CancelSignal, Cancellation, FeedStats, OrderFeed};
pub use order_service::OrderService;

/// Error type for service operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A blocking store task panicked or was cancelled.
    #[error("store worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Tunables for [`OrderService`].
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// How long cached reads stay valid.
    pub cache_ttl: Duration,
    /// Wait between two polls of the order feed.
    pub feed_interval: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(30),
            feed_interval: Duration::from_secs(5),
        }
    }
}
