//! Response cache configuration domain

use super::utils::{default_true, serde_duration};
use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether response caching is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of cached responses before eviction kicks in
    pub max_entries: usize,

    /// Time-to-live applied to entries stored without an explicit TTL
    #[serde(with = "serde_duration")]
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            max_entries: default_max_entries(),
            default_ttl: default_ttl(),
        }
    }
}

impl Validatable for CacheConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.max_entries, "max_entries", Self::domain_name())?;
        validate_positive(
            self.default_ttl.as_secs(),
            "default_ttl",
            Self::domain_name(),
        )?;
        Ok(())
    }

    fn domain_name() -> &'static str {
        "cache"
    }
}

fn default_max_entries() -> usize {
    1000
}

fn default_ttl() -> Duration {
    Duration::from_secs(300)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_defaults() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.max_entries, 1000);
        assert_eq!(config.default_ttl, Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cache_config_validation() {
        let mut config = CacheConfig::default();
        config.max_entries = 0;
        assert!(config.validate().is_err());

        let mut config = CacheConfig::default();
        config.default_ttl = Duration::from_secs(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cache_config_yaml_roundtrip() {
        let yaml = "enabled: false\nmax_entries: 50\ndefault_ttl: 60\n";
        let config: CacheConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.max_entries, 50);
        assert_eq!(config.default_ttl, Duration::from_secs(60));
    }
}
