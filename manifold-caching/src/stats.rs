//! Cache statistics

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cache statistics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    /// Total number of get requests
    pub total_gets: u64,

    /// Number of cache hits
    pub hits: u64,

    /// Number of cache misses
    pub misses: u64,

    /// Total number of insertions
    pub insertions: u64,

    /// Total number of evictions (capacity pressure or expiry)
    pub evictions: u64,

    /// Current number of live entries
    pub entry_count: usize,

    /// Hit rate (0.0 to 1.0)
    pub hit_rate: f64,
}

/// Thread-safe statistics collector
#[derive(Debug, Default)]
pub struct StatsCollector {
    total_gets: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    evictions: AtomicU64,
}

impl StatsCollector {
    /// Create a new stats collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cache hit
    pub fn record_hit(&self) {
        self.total_gets.fetch_add(1, Ordering::Relaxed);
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache miss
    pub fn record_miss(&self) {
        self.total_gets.fetch_add(1, Ordering::Relaxed);
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an insertion
    pub fn record_insertion(&self) {
        self.insertions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an eviction
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current stats
    pub fn get_stats(&self, entry_count: usize) -> CacheStats {
        let total_gets = self.total_gets.load(Ordering::Relaxed);
        let hits = self.hits.load(Ordering::Relaxed);

        let hit_rate = if total_gets > 0 {
            hits as f64 / total_gets as f64
        } else {
            0.0
        };

        CacheStats {
            total_gets,
            hits,
            misses: self.misses.load(Ordering::Relaxed),
            insertions: self.insertions.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entry_count,
            hit_rate,
        }
    }
}

/// Shared stats collector
pub type SharedStatsCollector = Arc<StatsCollector>;

/// Create a new shared stats collector
pub fn create_stats_collector() -> SharedStatsCollector {
    Arc::new(StatsCollector::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_calculation() {
        let collector = StatsCollector::new();
        collector.record_hit();
        collector.record_hit();
        collector.record_hit();
        collector.record_miss();

        let stats = collector.get_stats(2);
        assert_eq!(stats.total_gets, 4);
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 2);
        assert!((stats.hit_rate - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_collector_has_zero_hit_rate() {
        let stats = StatsCollector::new().get_stats(0);
        assert_eq!(stats.hit_rate, 0.0);
    }
}
