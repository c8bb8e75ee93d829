//! Response caching for the Manifold batch pipeline
//!
//! Provides the TTL + least-recently-accessed response store used to
//! answer repeated idempotent sub-requests without re-executing them,
//! plus the statistics collector shared with the batch processor.

pub mod cache;
pub mod stats;
pub mod store;

// Re-export main types
pub use cache::{CacheEntry, CacheKey, CacheValue};
pub use stats::{CacheStats, SharedStatsCollector, StatsCollector};
pub use store::ResponseCache;
