//! Resilience patterns for Manifold
//!
//! This crate provides the retry policies and backoff strategies used
//! when a canonical batch execution fails.

pub mod backoff;
pub mod retry;

// Re-export commonly used types
pub use backoff::{BackoffCalculator, BackoffStrategy};
pub use retry::{Retried, RetryError, RetryExecutor, RetryPolicy, Retryable};
