//! Order management backend.
//!
//! Orders are persisted through an [`OrderStore`] (SQLite or in-memory),
//! read through a short-lived [`TtlCache`] by the [`OrderService`], and
//! exposed over HTTP (feature `http`) behind a Basic-auth gate.

pub mod cache;
pub mod config;
pub mod order;
pub mod service;
pub mod store;

#[cfg(feature = "http")]
pub mod http;

pub use cache::{CacheKey, TtlCache};
pub use config::{AuthConfig, Config, ConfigError, Environment, RateLimitConfig};
pub use order::{creation_time, Order, OrderDraft, OrderId, OrderItem};
pub use service::{
    CancelSignal, Cancellation, FeedStats, OrderFeed, OrderService, ServiceError, ServiceSettings,
};
pub use store::{seed::seed_if_empty, InMemoryOrderStore, OrderStore, SqliteOrderStore, StoreError};
