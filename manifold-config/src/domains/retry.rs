//! Retry policy configuration domain

use crate::error::ConfigResult;
use crate::validation::{validate_enum_choice, validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff strategies accepted by the `backoff` field
pub const BACKOFF_CHOICES: [&str; 3] = ["fixed", "linear", "exponential"];

/// Retry delay configuration
///
/// The retry budget itself lives in the batch domain since it is a
/// per-request default; this domain shapes the delays between attempts.
/// Delays are human-readable durations ("500ms", "30s") so the schedule can
/// express sub-second steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay before the first retry; later retries scale per the backoff
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,

    /// Ceiling applied to every computed delay
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,

    /// Backoff shape: "fixed", "linear", or "exponential"
    pub backoff: String,

    /// Whether to randomize delays by +/-20%
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff: default_backoff(),
            jitter: false,
        }
    }
}

impl Validatable for RetryConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.initial_delay.as_millis(),
            "initial_delay",
            Self::domain_name(),
        )?;
        validate_positive(
            self.max_delay.as_millis(),
            "max_delay",
            Self::domain_name(),
        )?;
        validate_enum_choice(
            &self.backoff,
            &BACKOFF_CHOICES,
            "backoff",
            Self::domain_name(),
        )?;
        if self.max_delay < self.initial_delay {
            return Err(Self::validation_error(
                "max_delay must be at least initial_delay",
            ));
        }
        Ok(())
    }

    fn domain_name() -> &'static str {
        "retry"
    }
}

fn default_initial_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff() -> String {
    "linear".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_config_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.initial_delay, Duration::from_millis(500));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert_eq!(config.backoff, "linear");
        assert!(!config.jitter);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_retry_config_rejects_unknown_backoff() {
        let mut config = RetryConfig::default();
        config.backoff = "random".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_config_rejects_inverted_delays() {
        let mut config = RetryConfig::default();
        config.initial_delay = Duration::from_secs(60);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_config_humantime_delays() {
        let yaml = "initial_delay: 250ms\nmax_delay: 5s\n";
        let config: RetryConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.initial_delay, Duration::from_millis(250));
        assert_eq!(config.max_delay, Duration::from_secs(5));
    }
}
