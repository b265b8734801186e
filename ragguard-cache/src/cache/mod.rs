//! # TTL Caching Layer
//!
//! Process-scoped memoization for a grounded chatbot:
//!
//! - **TTL expiry**: entries older than the configured TTL are never returned
//!   and are removed lazily when a lookup finds them
//! - **Embedding cache**: vectors keyed by a content hash of the exact text
//! - **Response cache**: complete answers keyed by the normalized question,
//!   with a soft capacity enforced by sweeping expired entries
//!
//! ## Example
//!
//! ```rust
//! use ragguard_cache::cache::{CacheConfig, ResponseCache};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let config = CacheConfig::builder()
//!     .ttl(Duration::from_secs(3600))
//!     .soft_capacity(100)
//!     .eviction_batch(50)
//!     .build();
//!
//! let cache = ResponseCache::new(config);
//! cache.store("Bảo hiểm xe máy là gì?", "Dạ, ...".to_string()).await;
//!
//! if let Some(answer) = cache.get("  bảo hiểm xe máy là gì?").await {
//!     println!("Cache hit: {}", answer);
//! }
//! # }
//! ```

pub mod config;
pub mod embedding;
pub mod entry;
pub mod response;
pub mod store;
pub mod types;

pub use config::{CacheConfig, CacheConfigBuilder};
pub use embedding::{start_auto_cleanup, EmbeddingCache};
pub use entry::CacheEntry;
pub use response::{normalize_question, ResponseCache};
pub use store::TtlCache;
pub use types::{CacheKey, CacheStats, Embedding};
