//! Cache entry management with TTL support

use std::time::Duration;
use tokio::time::Instant;

/// A cached value together with its write time
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached value
    pub value: V,

    /// When the entry was written
    pub inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    /// Create a new entry stamped with the current time
    pub fn new(value: V) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
        }
    }

    /// Get the age of the entry
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.inserted_at)
    }

    /// An entry is expired as soon as its age reaches the TTL
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_cache_entry_creation() {
        let entry = CacheEntry::new("test_value".to_string());

        assert_eq!(entry.value, "test_value");
        assert!(!entry.is_expired(Duration::from_secs(3600)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_exactly_at_ttl() {
        let entry = CacheEntry::new(1u32);
        let ttl = Duration::from_secs(10);

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(!entry.is_expired(ttl));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(entry.is_expired(ttl));
    }
}
