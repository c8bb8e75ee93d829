//! Core cache traits and entry metadata

use std::fmt::Debug;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Trait for types that can be used as cache keys
pub trait CacheKey: Clone + Eq + Hash + Debug + Send + Sync {}

/// Trait for types that can be cached
pub trait CacheValue: Clone + Debug + Send + Sync {}

// Blanket implementations
impl<T> CacheKey for T where T: Clone + Eq + Hash + Debug + Send + Sync {}
impl<T> CacheValue for T where T: Clone + Debug + Send + Sync {}

/// Cache entry with expiry and access metadata
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached value
    pub value: V,

    /// When the entry was created
    pub created_at: Instant,

    /// When the entry expires
    pub expires_at: Instant,

    /// Number of times accessed
    pub access_count: u64,

    /// Last access time, used for eviction ordering
    pub last_accessed: Instant,
}

impl<V: CacheValue> CacheEntry<V> {
    /// Create a new cache entry expiring after `ttl`
    pub fn with_ttl(value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            expires_at: now + ttl,
            access_count: 0,
            last_accessed: now,
        }
    }

    /// Check if the entry is expired
    pub fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }

    /// Record an access
    pub fn record_access(&mut self) {
        self.access_count += 1;
        self.last_accessed = Instant::now();
    }

    /// Get age of the entry
    pub fn age(&self) -> Duration {
        Instant::now() - self.created_at
    }
}
