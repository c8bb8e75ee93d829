//! Batch processing configuration domain

use super::utils::serde_duration;
use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Batch processor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum number of sub-requests executed concurrently
    pub max_concurrent: usize,

    /// Timeout applied to sub-requests that do not carry their own
    #[serde(with = "serde_duration")]
    pub default_timeout: Duration,

    /// Retry budget applied to sub-requests that do not carry their own
    pub default_max_retries: u32,

    /// Run cache housekeeping once every N processed requests
    pub housekeeping_interval: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            default_timeout: default_timeout(),
            default_max_retries: default_max_retries(),
            housekeeping_interval: default_housekeeping_interval(),
        }
    }
}

impl Validatable for BatchConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.max_concurrent, "max_concurrent", Self::domain_name())?;
        validate_positive(
            self.default_timeout.as_secs(),
            "default_timeout",
            Self::domain_name(),
        )?;
        validate_positive(
            self.housekeeping_interval,
            "housekeeping_interval",
            Self::domain_name(),
        )?;
        Ok(())
    }

    fn domain_name() -> &'static str {
        "batch"
    }
}

fn default_max_concurrent() -> usize {
    16
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_retries() -> u32 {
    3
}

fn default_housekeeping_interval() -> u64 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_config_defaults() {
        let config = BatchConfig::default();
        assert_eq!(config.max_concurrent, 16);
        assert_eq!(config.default_timeout, Duration::from_secs(30));
        assert_eq!(config.default_max_retries, 3);
        assert_eq!(config.housekeeping_interval, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_batch_config_validation() {
        let mut config = BatchConfig::default();
        config.max_concurrent = 0;
        assert!(config.validate().is_err());

        let mut config = BatchConfig::default();
        config.housekeeping_interval = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_batch_config_partial_yaml() {
        let yaml = "max_concurrent: 4\n";
        let config: BatchConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.max_concurrent, 4);
        assert_eq!(config.default_max_retries, 3);
    }

    #[test]
    fn test_zero_retries_is_valid() {
        let mut config = BatchConfig::default();
        config.default_max_retries = 0;
        assert!(config.validate().is_ok());
    }
}
