//! Generic TTL store shared by the embedding and response caches

use crate::cache::{
    config::CacheConfig,
    entry::CacheEntry,
    types::{CacheKey, CacheStats},
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Map-backed cache with lazy TTL expiry and an optional soft capacity
///
/// All mutation goes through a single `RwLock`, so an entry is either present
/// and fresh or absent, even when requests run on several worker threads.
pub struct TtlCache<V> {
    config: CacheConfig,
    store: RwLock<CacheStore<V>>,
}

/// Internal cache storage
struct CacheStore<V> {
    entries: HashMap<CacheKey, CacheEntry<V>>,
    stats: CacheStats,
}

impl<V: Clone> TtlCache<V> {
    /// Create a new cache with the given configuration
    pub fn new(config: CacheConfig) -> Self {
        debug!("Initializing TTL cache with config: {:?}", config);

        Self {
            config,
            store: RwLock::new(CacheStore {
                entries: HashMap::new(),
                stats: CacheStats::default(),
            }),
        }
    }

    /// The configuration this cache was built with
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get a live value. Expired entries are removed and reported as absent.
    pub async fn get(&self, key: &str) -> Option<V> {
        let ttl = self.config.ttl;
        let mut store = self.store.write().await;

        match store.entries.get(key).map(|entry| entry.is_expired(ttl)) {
            None => {
                debug!("Cache miss: {}", key);
                self.record_miss(&mut store);
                return None;
            }
            Some(true) => {
                debug!("Cache entry expired: {}", key);
                store.entries.remove(key);
                store.stats.evictions_ttl += 1;
                store.stats.entries = store.entries.len();
                self.record_miss(&mut store);
                return None;
            }
            Some(false) => {}
        }

        let value = store.entries.get(key).map(|entry| entry.value.clone());
        if self.config.enable_metrics {
            store.stats.hits += 1;
        }
        debug!("Cache hit: {}", key);
        value
    }

    /// Insert or overwrite a value, then run the soft capacity sweep if needed
    pub async fn insert(&self, key: CacheKey, value: V) {
        let mut store = self.store.write().await;

        debug!("Writing cache entry: {}", key);
        store.entries.insert(key, CacheEntry::new(value));
        store.stats.writes += 1;

        if let Some(capacity) = self.config.soft_capacity {
            if store.entries.len() > capacity {
                let removed = Self::evict_expired_locked(
                    &mut store,
                    self.config.ttl,
                    self.config.eviction_batch,
                );
                store.stats.evictions_capacity += removed as u64;
                if removed > 0 {
                    debug!(
                        "Soft capacity {} exceeded, evicted {} expired entries",
                        capacity, removed
                    );
                }
            }
        }

        store.stats.entries = store.entries.len();
    }

    /// Remove up to `limit` expired entries, returning how many were removed
    pub async fn evict_expired(&self, limit: usize) -> usize {
        let mut store = self.store.write().await;
        let removed = Self::evict_expired_locked(&mut store, self.config.ttl, limit);
        store.stats.evictions_ttl += removed as u64;
        store.stats.entries = store.entries.len();
        removed
    }

    /// Remove every expired entry
    pub async fn clear_expired(&self) -> usize {
        let removed = self.evict_expired(usize::MAX).await;
        if removed > 0 {
            info!("Cleared {} expired cache entries", removed);
        }
        removed
    }

    /// Remove a specific entry from the cache
    pub async fn remove(&self, key: &str) -> Option<V> {
        let mut store = self.store.write().await;
        let removed = store.entries.remove(key).map(|entry| entry.value);
        store.stats.entries = store.entries.len();
        removed
    }

    /// Clear all entries from the cache
    pub async fn clear(&self) {
        let mut store = self.store.write().await;
        let count = store.entries.len();
        store.entries.clear();
        store.stats.entries = 0;
        info!("Cleared {} entries from cache", count);
    }

    /// Check whether the backing map holds a key, fresh or not
    pub async fn contains_key(&self, key: &str) -> bool {
        let store = self.store.read().await;
        store.entries.contains_key(key)
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        store.stats.clone()
    }

    /// Get number of entries in the backing map, including stale ones
    pub async fn len(&self) -> usize {
        let store = self.store.read().await;
        store.entries.len()
    }

    /// Check if cache is empty
    pub async fn is_empty(&self) -> bool {
        let store = self.store.read().await;
        store.entries.is_empty()
    }

    fn record_miss(&self, store: &mut CacheStore<V>) {
        if self.config.enable_metrics {
            store.stats.misses += 1;
        }
    }

    fn evict_expired_locked(
        store: &mut CacheStore<V>,
        ttl: std::time::Duration,
        limit: usize,
    ) -> usize {
        let expired: Vec<CacheKey> = store
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(ttl))
            .map(|(key, _)| key.clone())
            .take(limit)
            .collect();

        for key in &expired {
            store.entries.remove(key);
        }

        expired.len()
    }
}
