//! Bounded TTL response store with least-recently-accessed eviction

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

use crate::{
    cache::{CacheEntry, CacheKey, CacheValue},
    stats::{create_stats_collector, SharedStatsCollector},
    CacheStats,
};

/// Bounded TTL cache for canonical responses.
///
/// One mutex guards the whole store and every operation holds it for its
/// full duration, so an evict-then-insert sequence can never interleave
/// with a concurrent lookup. The lock is never held across an await.
pub struct ResponseCache<K, V> {
    /// Maximum number of entries
    max_entries: usize,

    /// Default TTL for entries
    default_ttl: Duration,

    /// Store with entries
    store: Mutex<HashMap<K, CacheEntry<V>>>,

    /// Statistics collector
    stats: SharedStatsCollector,
}

impl<K: CacheKey + 'static, V: CacheValue + 'static> ResponseCache<K, V> {
    /// Create a new cache bounded to `max_entries` live entries
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        if max_entries == 0 {
            panic!("Response cache capacity must be greater than 0");
        }

        Self {
            max_entries,
            default_ttl,
            store: Mutex::new(HashMap::with_capacity(max_entries)),
            stats: create_stats_collector(),
        }
    }

    /// Look up an unexpired entry.
    ///
    /// Expired entries are removed on read and reported as misses; a hit
    /// refreshes the entry's access time. Absent and expired keys are
    /// indistinguishable to the caller.
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut store = self.store.lock();
        match store.get_mut(key) {
            Some(entry) => {
                if entry.is_expired() {
                    store.remove(key);
                    self.stats.record_eviction();
                    self.stats.record_miss();
                    None
                } else {
                    entry.record_access();
                    self.stats.record_hit();
                    Some(entry.value.clone())
                }
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Insert with the default TTL
    pub async fn set(&self, key: K, value: V) {
        self.set_with_ttl(key, value, self.default_ttl).await
    }

    /// Insert with an explicit TTL.
    ///
    /// Overwriting an existing key never evicts. Inserting a new key at
    /// capacity evicts entries in ascending last-access order until one
    /// slot is free.
    pub async fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let mut store = self.store.lock();

        if !store.contains_key(&key) {
            while store.len() >= self.max_entries {
                let oldest = store
                    .iter()
                    .min_by_key(|(_, entry)| entry.last_accessed)
                    .map(|(k, _)| k.clone());

                match oldest {
                    Some(k) => {
                        store.remove(&k);
                        self.stats.record_eviction();
                    }
                    None => break,
                }
            }
        }

        store.insert(key, CacheEntry::with_ttl(value, ttl));
        self.stats.record_insertion();
    }

    /// Remove every expired entry, returning how many were dropped
    pub async fn clear_expired(&self) -> usize {
        let mut store = self.store.lock();

        let expired_keys: Vec<K> = store
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(k, _)| k.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            store.remove(&key);
            self.stats.record_eviction();
        }

        count
    }

    /// Drop all entries
    pub async fn clear(&self) {
        let mut store = self.store.lock();
        let count = store.len();
        store.clear();

        for _ in 0..count {
            self.stats.record_eviction();
        }
    }

    /// Number of unexpired entries
    pub async fn len(&self) -> usize {
        let store = self.store.lock();
        store.values().filter(|entry| !entry.is_expired()).count()
    }

    /// Check if the cache holds no unexpired entries
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let len = self.len().await;
        self.stats.get_stats(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ttl_expiration() {
        let cache = ResponseCache::new(16, Duration::from_millis(100));

        cache.set("key1", "value1").await;

        // Should exist immediately
        assert_eq!(cache.get(&"key1").await, Some("value1"));

        // Wait for expiration
        tokio::time::sleep(Duration::from_millis(150)).await;

        // Should be expired
        assert_eq!(cache.get(&"key1").await, None);
    }

    #[tokio::test]
    async fn test_custom_ttl() {
        let cache = ResponseCache::new(16, Duration::from_secs(10));

        cache
            .set_with_ttl("key1", "value1", Duration::from_millis(50))
            .await;
        cache.set("key2", "value2").await;

        assert_eq!(cache.get(&"key1").await, Some("value1"));
        assert_eq!(cache.get(&"key2").await, Some("value2"));

        tokio::time::sleep(Duration::from_millis(100)).await;

        // First should be expired, second still valid
        assert_eq!(cache.get(&"key1").await, None);
        assert_eq!(cache.get(&"key2").await, Some("value2"));
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_accessed() {
        let cache = ResponseCache::new(3, Duration::from_secs(10));

        cache.set("a", 1).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.set("b", 2).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.set("c", 3).await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        // Touch 'a' so 'b' becomes the oldest by access time.
        assert_eq!(cache.get(&"a").await, Some(1));

        cache.set("d", 4).await;

        assert_eq!(cache.get(&"b").await, None); // Evicted
        assert_eq!(cache.get(&"a").await, Some(1));
        assert_eq!(cache.get(&"c").await, Some(3));
        assert_eq!(cache.get(&"d").await, Some(4));
        assert_eq!(cache.len().await, 3);
    }

    #[tokio::test]
    async fn test_overwrite_does_not_evict() {
        let cache = ResponseCache::new(2, Duration::from_secs(10));

        cache.set("a", 1).await;
        cache.set("b", 2).await;

        // Overwriting a resident key must not push anything out.
        cache.set("a", 10).await;

        assert_eq!(cache.get(&"a").await, Some(10));
        assert_eq!(cache.get(&"b").await, Some(2));
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_never_exceeds_capacity() {
        let cache = ResponseCache::new(4, Duration::from_secs(10));

        for i in 0..32 {
            cache.set(i, i * 10).await;
        }

        assert_eq!(cache.len().await, 4);
    }

    #[tokio::test]
    async fn test_clear_expired() {
        let cache = ResponseCache::new(16, Duration::from_millis(50));

        for i in 0..5 {
            cache.set(i, i * 10).await;
        }
        cache.set_with_ttl(99, 990, Duration::from_secs(10)).await;

        assert_eq!(cache.len().await, 6);

        tokio::time::sleep(Duration::from_millis(100)).await;

        let cleaned = cache.clear_expired().await;
        assert_eq!(cleaned, 5);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(&99).await, Some(990));
    }

    #[tokio::test]
    async fn test_len_ignores_expired_entries() {
        let cache = ResponseCache::new(16, Duration::from_millis(30));

        cache.set("gone", 0).await;
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(cache.len().await, 0);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_stats_track_hits_misses_and_evictions() {
        let cache = ResponseCache::new(2, Duration::from_secs(10));

        cache.set("a", 1).await;
        cache.set("b", 2).await;
        cache.set("c", 3).await; // evicts one

        let _ = cache.get(&"c").await;
        let _ = cache.get(&"nope").await;

        let stats = cache.stats().await;
        assert_eq!(stats.insertions, 3);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 2);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }
}
