//! # ragguard-cache
//!
//! In-memory TTL caches used by the ragguard answer pipeline.
//!
//! ## Features
//!
//! - Async-first design using tokio
//! - Lazy expiry: a stale entry is removed the moment a lookup sees it
//! - Map-level locking, safe under multi-threaded runtimes
//! - Soft capacity with bounded expired-entry sweeps
//! - Hit/miss/eviction statistics
//!
//! ## Embedding Cache
//!
//! ```rust
//! use ragguard_cache::EmbeddingCache;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let cache = EmbeddingCache::new(Duration::from_secs(3600));
//! cache.set("Phí bảo hiểm xe máy bao nhiêu?", vec![0.1; 4]).await;
//!
//! assert!(cache.get("Phí bảo hiểm xe máy bao nhiêu?").await.is_some());
//! // Keys are content hashes of the exact text
//! assert!(cache.get("phí bảo hiểm xe máy bao nhiêu?").await.is_none());
//! # }
//! ```
//!
//! Nothing is persisted; every cache starts empty with the process.

pub mod cache;
pub mod error;

// Re-export main types for convenience
pub use cache::{
    normalize_question, start_auto_cleanup, CacheConfig, CacheConfigBuilder, CacheEntry,
    CacheKey, CacheStats, Embedding, EmbeddingCache, ResponseCache, TtlCache,
};
pub use error::{CacheError, Result};
