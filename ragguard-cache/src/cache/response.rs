//! Answer cache keyed by normalized question text

use crate::cache::{config::CacheConfig, store::TtlCache, types::CacheStats};
use tracing::debug;

/// Normalize a question into its cache key: trimmed and lower-cased
pub fn normalize_question(question: &str) -> String {
    question.trim().to_lowercase()
}

/// Memoization of complete answers
///
/// Writes beyond the soft capacity (100 by default) trigger a sweep that
/// removes at most `eviction_batch` (50) expired answers.
pub struct ResponseCache {
    cache: TtlCache<String>,
}

impl ResponseCache {
    /// Create a response cache from a configuration
    pub fn new(config: CacheConfig) -> Self {
        Self {
            cache: TtlCache::new(config),
        }
    }

    /// Get a live answer for a question
    pub async fn get(&self, question: &str) -> Option<String> {
        let key = normalize_question(question);
        let answer = self.cache.get(&key).await;
        if answer.is_some() {
            debug!("Using cached response for: {}", key);
        }
        answer
    }

    /// Store the answer for a question
    pub async fn store(&self, question: &str, answer: String) {
        self.cache.insert(normalize_question(question), answer).await;
    }

    /// Remove every expired answer, returning how many were removed
    pub async fn clear_expired(&self) -> usize {
        self.cache.clear_expired().await
    }

    /// Check whether the backing map holds an entry for a question, fresh or not
    pub async fn contains(&self, question: &str) -> bool {
        self.cache.contains_key(&normalize_question(question)).await
    }

    /// Number of stored answers, including stale ones
    pub async fn len(&self) -> usize {
        self.cache.len().await
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.cache.is_empty().await
    }

    /// Drop every answer
    pub async fn clear(&self) {
        self.cache.clear().await
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// The configuration this cache was built with
    pub fn config(&self) -> &CacheConfig {
        self.cache.config()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CacheConfig::responses())
    }
}
