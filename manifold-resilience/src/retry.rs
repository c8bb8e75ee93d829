//! Retry policy and executor

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::backoff::{BackoffCalculator, BackoffStrategy};

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,

    /// Initial delay between retries
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,

    /// Backoff strategy
    pub backoff_strategy: BackoffStrategy,

    /// Whether to add jitter to retry delays
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_strategy: BackoffStrategy::Linear,
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// Create a linear retry policy
    pub fn linear(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay: delay,
            max_delay: delay * max_retries.max(1),
            backoff_strategy: BackoffStrategy::Linear,
            jitter: false,
        }
    }

    /// Create a policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Calculate delay for a specific retry (1-indexed)
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let calculator = BackoffCalculator::new(
            self.backoff_strategy.clone(),
            self.initial_delay,
            self.max_delay,
            self.jitter,
        );

        calculator.calculate_delay(retry)
    }
}

/// Trait for errors that can be retried
pub trait Retryable {
    /// Whether this error is retryable
    fn is_retryable(&self) -> bool;

    /// Custom retry delay for this error type
    fn retry_delay(&self) -> Option<Duration> {
        None
    }
}

/// Successful outcome together with the number of retries it took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retried<T> {
    /// The operation's value
    pub value: T,

    /// Retries performed before success (0 = first attempt succeeded)
    pub retries: u32,
}

/// Retry executor
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    /// Create a new retry executor with the given policy
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Create with default policy
    pub fn with_default_policy() -> Self {
        Self::new(RetryPolicy::default())
    }

    /// The executor's policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute a function, retrying failures within the policy's budget.
    ///
    /// Non-retryable errors short-circuit immediately, even when budget
    /// remains. The loop is the only retry mechanism; the operation is
    /// never re-entered recursively.
    pub async fn execute<F, Fut, T, E>(&self, mut f: F) -> Result<Retried<T>, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + std::fmt::Display,
    {
        let mut retries = 0;

        loop {
            debug!(
                "Executing attempt {} (retry budget: {})",
                retries + 1,
                self.policy.max_retries
            );

            match f().await {
                Ok(value) => {
                    if retries > 0 {
                        info!("Operation succeeded after {} retries", retries);
                    }
                    return Ok(Retried { value, retries });
                }
                Err(error) => {
                    if !error.is_retryable() {
                        warn!("Operation failed with non-retryable error: {}", error);
                        return Err(RetryError::NonRetryable(error));
                    }

                    if retries >= self.policy.max_retries {
                        warn!("Operation failed after {} retries: {}", retries, error);
                        return Err(RetryError::MaxRetriesExceeded {
                            retries,
                            last_error: error,
                        });
                    }

                    retries += 1;

                    let delay = error
                        .retry_delay()
                        .unwrap_or_else(|| self.policy.delay_for_retry(retries));

                    warn!(
                        "Attempt {} failed: {}. Retrying in {:?}",
                        retries, error, delay
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Retry error types
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// Retry budget exhausted
    #[error("Retry budget ({retries}) exhausted. Last error: {last_error}")]
    MaxRetriesExceeded { retries: u32, last_error: E },

    /// Non-retryable error encountered
    #[error("Non-retryable error: {0}")]
    NonRetryable(E),
}

impl<E> RetryError<E> {
    /// Get the underlying error
    pub fn into_inner(self) -> E {
        match self {
            RetryError::MaxRetriesExceeded { last_error, .. } => last_error,
            RetryError::NonRetryable(error) => error,
        }
    }
}
