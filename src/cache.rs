//! TtlCache - a flat, time-expiring key/value cache.
//!
//! Entries expire a fixed TTL after insertion and are dropped lazily on the
//! next read. Invalidation removes a whole key. There is no cross-key
//! atomicity: a read racing an invalidation may see either the old value or
//! nothing.

use std::fmt;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::order::OrderId;

/// A cache key. Built only through the derivation functions below.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for the full order list.
    pub fn all_orders() -> Self {
        CacheKey("orders_all".to_string())
    }

    /// Key for a single order.
    pub fn order(id: OrderId) -> Self {
        CacheKey(format!("order_{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Concurrent TTL cache, safe to share across in-flight requests.
pub struct TtlCache<V> {
    entries: DashMap<CacheKey, Entry<V>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a live entry. Expired entries are removed and reported as absent.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Some(entry.value.clone());
            }
        }
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        None
    }

    /// Insert or replace an entry with the default TTL.
    pub fn insert(&self, key: CacheKey, value: V) {
        let expires_at = Instant::now() + self.ttl;
        self.entries.insert(key, Entry { value, expires_at });
    }

    /// Remove an entry. Returns true if one was present, live or not.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
