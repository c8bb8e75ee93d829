//! Backoff strategies for retry policies

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff strategy for retries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed,

    /// Linear increase: delay = initial_delay * retry_number
    Linear,

    /// Exponential increase: delay = initial_delay * base^(retry_number-1)
    Exponential {
        /// Base for exponential calculation (e.g., 2.0 for doubling)
        base: f64,
    },
}

/// Backoff delay calculator
pub struct BackoffCalculator {
    strategy: BackoffStrategy,
    initial_delay: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl BackoffCalculator {
    /// Create a new backoff calculator
    pub fn new(
        strategy: BackoffStrategy,
        initial_delay: Duration,
        max_delay: Duration,
        jitter: bool,
    ) -> Self {
        Self {
            strategy,
            initial_delay,
            max_delay,
            jitter,
        }
    }

    /// Calculate delay for a specific retry (1-indexed)
    pub fn calculate_delay(&self, retry: u32) -> Duration {
        let base_delay = self.calculate_base_delay(retry);
        let capped_delay = base_delay.min(self.max_delay);

        if self.jitter {
            self.add_jitter(capped_delay)
        } else {
            capped_delay
        }
    }

    fn calculate_base_delay(&self, retry: u32) -> Duration {
        match &self.strategy {
            BackoffStrategy::Fixed => self.initial_delay,

            BackoffStrategy::Linear => self.initial_delay * retry,

            BackoffStrategy::Exponential { base } => {
                if retry == 0 {
                    return Duration::ZERO;
                }
                let multiplier = base.powi(retry as i32 - 1);
                Duration::from_nanos((self.initial_delay.as_nanos() as f64 * multiplier) as u64)
            }
        }
    }

    fn add_jitter(&self, delay: Duration) -> Duration {
        let mut rng = rand::thread_rng();

        // Add ±20% jitter
        let jitter_factor = rng.gen_range(0.8..1.2);
        Duration::from_nanos((delay.as_nanos() as f64 * jitter_factor) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_backoff() {
        let calc = BackoffCalculator::new(
            BackoffStrategy::Fixed,
            Duration::from_millis(100),
            Duration::from_secs(1),
            false,
        );

        assert_eq!(calc.calculate_delay(1), Duration::from_millis(100));
        assert_eq!(calc.calculate_delay(2), Duration::from_millis(100));
        assert_eq!(calc.calculate_delay(10), Duration::from_millis(100));
    }

    #[test]
    fn test_linear_backoff() {
        let calc = BackoffCalculator::new(
            BackoffStrategy::Linear,
            Duration::from_millis(500),
            Duration::from_secs(30),
            false,
        );

        assert_eq!(calc.calculate_delay(1), Duration::from_millis(500));
        assert_eq!(calc.calculate_delay(2), Duration::from_millis(1000));
        assert_eq!(calc.calculate_delay(3), Duration::from_millis(1500));
        assert_eq!(calc.calculate_delay(100), Duration::from_secs(30)); // Capped at max
    }

    #[test]
    fn test_exponential_backoff() {
        let calc = BackoffCalculator::new(
            BackoffStrategy::Exponential { base: 2.0 },
            Duration::from_millis(100),
            Duration::from_secs(10),
            false,
        );

        assert_eq!(calc.calculate_delay(1), Duration::from_millis(100));
        assert_eq!(calc.calculate_delay(2), Duration::from_millis(200));
        assert_eq!(calc.calculate_delay(3), Duration::from_millis(400));
        assert_eq!(calc.calculate_delay(4), Duration::from_millis(800));
    }

    #[test]
    fn test_max_delay_cap() {
        let calc = BackoffCalculator::new(
            BackoffStrategy::Exponential { base: 2.0 },
            Duration::from_millis(100),
            Duration::from_millis(500),
            false,
        );

        assert_eq!(calc.calculate_delay(3), Duration::from_millis(400));
        assert_eq!(calc.calculate_delay(4), Duration::from_millis(500)); // Capped
        assert_eq!(calc.calculate_delay(10), Duration::from_millis(500)); // Still capped
    }

    #[test]
    fn test_jitter() {
        let calc = BackoffCalculator::new(
            BackoffStrategy::Fixed,
            Duration::from_millis(1000),
            Duration::from_secs(10),
            true,
        );

        // With jitter, delays should vary but stay close to base
        let delay = calc.calculate_delay(1);
        assert!(delay >= Duration::from_millis(800));
        assert!(delay <= Duration::from_millis(1200));
    }
}
