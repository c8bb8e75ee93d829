//! Lifetime processor statistics
//!
//! Counters span every batch a processor instance has run; the rates in
//! each batch response are lifetime rates, not per-batch rates.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Point-in-time snapshot of a processor's lifetime counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifetimeStats {
    /// Sub-requests processed across all batches
    pub total_requests: u64,

    /// Sub-requests served from the response cache
    pub cache_hits: u64,

    /// Sub-requests collapsed into another request's execution
    pub deduplicated: u64,

    /// Sub-requests whose final result was a failure
    pub errors: u64,

    /// Accumulated batch wall time in seconds
    pub total_duration: f64,

    /// cache_hits over total_requests
    pub cache_hit_rate: f64,

    /// deduplicated over total_requests
    pub deduplication_rate: f64,
}

/// Monotonic counters shared across every batch a processor runs.
///
/// Only the orchestrating task updates these, once per batch, after all
/// canonical executions have completed.
#[derive(Debug, Default)]
pub struct LifetimeCounters {
    total_requests: AtomicU64,
    cache_hits: AtomicU64,
    deduplicated: AtomicU64,
    errors: AtomicU64,
    total_duration_micros: AtomicU64,
}

impl LifetimeCounters {
    /// Add processed requests, returning the previous total
    pub fn add_requests(&self, count: u64) -> u64 {
        self.total_requests.fetch_add(count, Ordering::Relaxed)
    }

    /// Add cache-served requests
    pub fn add_cache_hits(&self, count: u64) {
        self.cache_hits.fetch_add(count, Ordering::Relaxed);
    }

    /// Add requests collapsed by deduplication
    pub fn add_deduplicated(&self, count: u64) {
        self.deduplicated.fetch_add(count, Ordering::Relaxed);
    }

    /// Add requests that ended in failure
    pub fn add_errors(&self, count: u64) {
        self.errors.fetch_add(count, Ordering::Relaxed);
    }

    /// Add one batch's wall time
    pub fn add_duration(&self, duration: Duration) {
        self.total_duration_micros
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    /// Take a consistent-enough snapshot for reporting
    pub fn snapshot(&self) -> LifetimeStats {
        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let cache_hits = self.cache_hits.load(Ordering::Relaxed);
        let deduplicated = self.deduplicated.load(Ordering::Relaxed);
        let errors = self.errors.load(Ordering::Relaxed);
        let micros = self.total_duration_micros.load(Ordering::Relaxed);

        let rate = |part: u64| {
            if total_requests > 0 {
                part as f64 / total_requests as f64
            } else {
                0.0
            }
        };

        LifetimeStats {
            total_requests,
            cache_hits,
            deduplicated,
            errors,
            total_duration: Duration::from_micros(micros).as_secs_f64(),
            cache_hit_rate: rate(cache_hits),
            deduplication_rate: rate(deduplicated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_rates() {
        let counters = LifetimeCounters::default();
        counters.add_requests(8);
        counters.add_cache_hits(2);
        counters.add_deduplicated(4);
        counters.add_errors(1);
        counters.add_duration(Duration::from_millis(1500));

        let stats = counters.snapshot();
        assert_eq!(stats.total_requests, 8);
        assert_eq!(stats.errors, 1);
        assert!((stats.cache_hit_rate - 0.25).abs() < f64::EPSILON);
        assert!((stats.deduplication_rate - 0.5).abs() < f64::EPSILON);
        assert!((stats.total_duration - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_counters_report_zero_rates() {
        let stats = LifetimeCounters::default().snapshot();
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.cache_hit_rate, 0.0);
        assert_eq!(stats.deduplication_rate, 0.0);
    }

    #[test]
    fn test_add_requests_returns_previous_total() {
        let counters = LifetimeCounters::default();
        assert_eq!(counters.add_requests(3), 0);
        assert_eq!(counters.add_requests(5), 3);
        assert_eq!(counters.snapshot().total_requests, 8);
    }
}
