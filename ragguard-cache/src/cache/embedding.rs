//! Content-addressed embedding cache

use crate::cache::{
    config::CacheConfig,
    store::TtlCache,
    types::{CacheStats, Embedding},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Embedding memoization keyed by an MD5 digest of the exact input text
///
/// There is no normalization: callers must pass byte-identical text to hit.
/// The cache has no capacity bound; run [`start_auto_cleanup`] or call
/// [`EmbeddingCache::clear_expired`] to reclaim stale vectors.
pub struct EmbeddingCache {
    cache: TtlCache<Embedding>,
}

impl EmbeddingCache {
    /// Create an embedding cache with the given TTL
    pub fn new(ttl: Duration) -> Self {
        Self::with_config(CacheConfig::builder().ttl(ttl).build())
    }

    /// Create an embedding cache from a full configuration
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            cache: TtlCache::new(config),
        }
    }

    /// Derive the cache key for a text
    pub fn cache_key(text: &str) -> String {
        format!("{:x}", md5::compute(text.as_bytes()))
    }

    /// Get a live embedding for `text`
    pub async fn get(&self, text: &str) -> Option<Embedding> {
        self.cache.get(&Self::cache_key(text)).await
    }

    /// Store an embedding for `text`, replacing any previous one
    pub async fn set(&self, text: &str, embedding: Embedding) {
        self.cache.insert(Self::cache_key(text), embedding).await;
        debug!("Cached embedding for: {}", preview(text));
    }

    /// Remove every expired embedding, returning how many were removed
    pub async fn clear_expired(&self) -> usize {
        self.cache.clear_expired().await
    }

    /// Check whether the backing map holds an entry for `text`, fresh or not
    pub async fn contains(&self, text: &str) -> bool {
        self.cache.contains_key(&Self::cache_key(text)).await
    }

    /// Number of stored embeddings, including stale ones
    pub async fn len(&self) -> usize {
        self.cache.len().await
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.cache.is_empty().await
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// The configuration this cache was built with
    pub fn config(&self) -> &CacheConfig {
        self.cache.config()
    }

    /// Spawn [`start_auto_cleanup`] at the configured `cleanup_interval`
    ///
    /// Returns `None` when the configuration has no interval.
    pub fn spawn_auto_cleanup(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let interval = self.config().cleanup_interval?;
        Some(tokio::spawn(start_auto_cleanup(Arc::clone(self), interval)))
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::with_config(CacheConfig::embeddings())
    }
}

/// Background task that periodically clears expired embeddings
pub async fn start_auto_cleanup(cache: Arc<EmbeddingCache>, interval: Duration) {
    info!(
        "Starting automatic embedding cache cleanup task (interval: {:?})",
        interval
    );

    loop {
        tokio::time::sleep(interval).await;

        let removed = cache.clear_expired().await;
        if removed > 0 {
            debug!("Auto cleanup removed {} embeddings", removed);
        }
    }
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}
