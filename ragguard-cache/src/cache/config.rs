//! Configuration for the cache system

use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a TTL cache
///
/// The soft capacity is not a hard limit. When a write pushes the entry count
/// above it, up to `eviction_batch` *expired* entries are removed; live
/// entries are never evicted to make room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    /// Maximum age of an entry before lookups treat it as absent
    pub ttl: Duration,

    /// Entry count above which a write triggers an expired-entry sweep
    pub soft_capacity: Option<usize>,

    /// Maximum number of expired entries removed per sweep
    pub eviction_batch: usize,

    /// Period of the background sweep started by
    /// [`EmbeddingCache::spawn_auto_cleanup`](crate::EmbeddingCache::spawn_auto_cleanup);
    /// no task runs when unset
    pub cleanup_interval: Option<Duration>,

    /// Enable hit/miss accounting
    pub enable_metrics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            soft_capacity: None,
            eviction_batch: 50,
            cleanup_interval: None,
            enable_metrics: true,
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Unbounded one-hour cache used for embeddings
    pub fn embeddings() -> Self {
        Self::default()
    }

    /// One-hour cache with a soft capacity of 100 entries, sweeping at most 50
    /// expired entries per write, used for complete answers
    pub fn responses() -> Self {
        Self {
            soft_capacity: Some(100),
            eviction_batch: 50,
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.ttl.is_zero() {
            return Err(CacheError::ConfigError(
                "ttl must be greater than 0".to_string(),
            ));
        }

        if self.soft_capacity == Some(0) {
            return Err(CacheError::ConfigError(
                "soft_capacity must be greater than 0".to_string(),
            ));
        }

        if self.soft_capacity.is_some() && self.eviction_batch == 0 {
            return Err(CacheError::ConfigError(
                "eviction_batch must be greater than 0 when soft_capacity is set".to_string(),
            ));
        }

        if self.cleanup_interval.is_some_and(|interval| interval.is_zero()) {
            return Err(CacheError::ConfigError(
                "cleanup_interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    ttl: Option<Duration>,
    soft_capacity: Option<usize>,
    eviction_batch: Option<usize>,
    cleanup_interval: Option<Duration>,
    enable_metrics: Option<bool>,
}

impl CacheConfigBuilder {
    /// Set TTL for cache entries
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set the soft capacity
    pub fn soft_capacity(mut self, capacity: usize) -> Self {
        self.soft_capacity = Some(capacity);
        self
    }

    /// Set the maximum number of expired entries removed per sweep
    pub fn eviction_batch(mut self, batch: usize) -> Self {
        self.eviction_batch = Some(batch);
        self
    }

    /// Set cleanup interval for the background task
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Enable or disable metrics collection
    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = Some(enable);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            ttl: self.ttl.unwrap_or(defaults.ttl),
            soft_capacity: self.soft_capacity.or(defaults.soft_capacity),
            eviction_batch: self.eviction_batch.unwrap_or(defaults.eviction_batch),
            cleanup_interval: self.cleanup_interval.or(defaults.cleanup_interval),
            enable_metrics: self.enable_metrics.unwrap_or(defaults.enable_metrics),
        }
    }

    /// Build and validate the cache configuration
    pub fn try_build(self) -> Result<CacheConfig> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
