//! Batch request processing for Manifold
//!
//! This crate orchestrates heterogeneous batches of sub-requests:
//!
//! - **Deduplication**: equivalent idempotent requests collapse into one
//!   canonical execution whose result fans out to every submitted id
//! - **Caching**: idempotent results are cached with a TTL, so repeat
//!   batches are served without touching handlers
//! - **Priority scheduling**: execution starts in priority order derived
//!   from each operation's endpoint
//! - **Bounded concurrency and retries**: a semaphore caps in-flight
//!   executions and transient failures retry with backoff
//!
//! Batches arrive as JSON (`{ "requests": [...] }`) and leave as an
//! envelope whose item records preserve submission order.

pub mod envelope;
pub mod processor;
pub mod request;
pub mod stats;

pub use envelope::{BatchEnvelope, BatchReport, BatchStats, ItemResponse};
pub use processor::BatchProcessor;
pub use request::{RequestDefaults, SubRequest};
pub use stats::{LifetimeCounters, LifetimeStats};
