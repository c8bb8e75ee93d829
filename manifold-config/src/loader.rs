//! Configuration loading with environment overrides
//!
//! Precedence, lowest to highest: built-in defaults, configuration file,
//! `MANIFOLD_*` environment variables. The merged result is validated before
//! it is handed out.

use crate::domains::ManifoldConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    env_prefix: String,
}

impl ConfigLoader {
    /// Create a loader with the standard `MANIFOLD` prefix
    pub fn new() -> Self {
        Self {
            env_prefix: "MANIFOLD".to_string(),
        }
    }

    /// Create a loader with a custom environment prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            env_prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file, then apply environment overrides
    pub fn from_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<ManifoldConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: ManifoldConfig = serde_yaml::from_str(&content)?;
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Build configuration from defaults plus environment overrides
    pub fn from_env(&self) -> ConfigResult<ManifoldConfig> {
        let mut config = ManifoldConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load from the given file when present, otherwise from the environment
    pub fn load<P: AsRef<Path>>(&self, path: Option<P>) -> ConfigResult<ManifoldConfig> {
        match path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    fn apply_env_overrides(&self, config: &mut ManifoldConfig) -> ConfigResult<()> {
        self.apply_batch_overrides(config)?;
        self.apply_cache_overrides(config)?;
        self.apply_retry_overrides(config)?;
        Ok(())
    }

    fn apply_batch_overrides(&self, config: &mut ManifoldConfig) -> ConfigResult<()> {
        if let Some(val) = self.get_env_var("BATCH_MAX_CONCURRENT") {
            config.batch.max_concurrent = self.parse_var("BATCH_MAX_CONCURRENT", &val)?;
        }
        if let Some(val) = self.get_env_var("BATCH_DEFAULT_TIMEOUT") {
            let secs: u64 = self.parse_var("BATCH_DEFAULT_TIMEOUT", &val)?;
            config.batch.default_timeout = Duration::from_secs(secs);
        }
        if let Some(val) = self.get_env_var("BATCH_MAX_RETRIES") {
            config.batch.default_max_retries = self.parse_var("BATCH_MAX_RETRIES", &val)?;
        }
        if let Some(val) = self.get_env_var("BATCH_HOUSEKEEPING_INTERVAL") {
            config.batch.housekeeping_interval =
                self.parse_var("BATCH_HOUSEKEEPING_INTERVAL", &val)?;
        }
        Ok(())
    }

    fn apply_cache_overrides(&self, config: &mut ManifoldConfig) -> ConfigResult<()> {
        if let Some(val) = self.get_env_var("CACHE_ENABLED") {
            config.cache.enabled = self.parse_var("CACHE_ENABLED", &val)?;
        }
        if let Some(val) = self.get_env_var("CACHE_MAX_ENTRIES") {
            config.cache.max_entries = self.parse_var("CACHE_MAX_ENTRIES", &val)?;
        }
        if let Some(val) = self.get_env_var("CACHE_TTL") {
            let secs: u64 = self.parse_var("CACHE_TTL", &val)?;
            config.cache.default_ttl = Duration::from_secs(secs);
        }
        Ok(())
    }

    fn apply_retry_overrides(&self, config: &mut ManifoldConfig) -> ConfigResult<()> {
        if let Some(val) = self.get_env_var("RETRY_INITIAL_DELAY_MS") {
            let millis: u64 = self.parse_var("RETRY_INITIAL_DELAY_MS", &val)?;
            config.retry.initial_delay = Duration::from_millis(millis);
        }
        if let Some(val) = self.get_env_var("RETRY_MAX_DELAY_MS") {
            let millis: u64 = self.parse_var("RETRY_MAX_DELAY_MS", &val)?;
            config.retry.max_delay = Duration::from_millis(millis);
        }
        if let Some(val) = self.get_env_var("RETRY_BACKOFF") {
            config.retry.backoff = val;
        }
        if let Some(val) = self.get_env_var("RETRY_JITTER") {
            config.retry.jitter = self.parse_var("RETRY_JITTER", &val)?;
        }
        Ok(())
    }

    fn get_env_var(&self, name: &str) -> Option<String> {
        std::env::var(format!("{}_{}", self.env_prefix, name)).ok()
    }

    fn parse_var<T: FromStr>(&self, name: &str, value: &str) -> ConfigResult<T> {
        value.parse().map_err(|_| {
            ConfigError::EnvError(format!(
                "Invalid {}_{}: '{}'",
                self.env_prefix, name, value
            ))
        })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_without_file_uses_defaults() {
        let loader = ConfigLoader::with_prefix("MANIFOLD_TEST_DEFAULTS");
        let config = loader.load(None::<&str>).unwrap();
        assert_eq!(config.batch.max_concurrent, 16);
        assert_eq!(config.cache.max_entries, 1000);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "batch:").unwrap();
        writeln!(file, "  max_concurrent: 8").unwrap();
        writeln!(file, "cache:").unwrap();
        writeln!(file, "  max_entries: 64").unwrap();

        let loader = ConfigLoader::with_prefix("MANIFOLD_TEST_FILE");
        let config = loader.from_file(file.path()).unwrap();
        assert_eq!(config.batch.max_concurrent, 8);
        assert_eq!(config.cache.max_entries, 64);
        // Untouched domains keep their defaults.
        assert_eq!(config.retry.backoff, "linear");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cache:").unwrap();
        writeln!(file, "  max_entries: 64").unwrap();

        temp_env::with_var("MANIFOLD_TEST_ENV_CACHE_MAX_ENTRIES", Some("256"), || {
            let loader = ConfigLoader::with_prefix("MANIFOLD_TEST_ENV");
            let config = loader.from_file(file.path()).unwrap();
            assert_eq!(config.cache.max_entries, 256);
        });
    }

    #[test]
    fn test_env_overrides_durations() {
        temp_env::with_vars(
            [
                ("MANIFOLD_TEST_DUR_CACHE_TTL", Some("120")),
                ("MANIFOLD_TEST_DUR_RETRY_INITIAL_DELAY_MS", Some("250")),
            ],
            || {
                let loader = ConfigLoader::with_prefix("MANIFOLD_TEST_DUR");
                let config = loader.from_env().unwrap();
                assert_eq!(config.cache.default_ttl, Duration::from_secs(120));
                assert_eq!(config.retry.initial_delay, Duration::from_millis(250));
            },
        );
    }

    #[test]
    fn test_invalid_env_value_is_reported() {
        temp_env::with_var(
            "MANIFOLD_TEST_BAD_BATCH_MAX_CONCURRENT",
            Some("not-a-number"),
            || {
                let loader = ConfigLoader::with_prefix("MANIFOLD_TEST_BAD");
                let err = loader.from_env().unwrap_err();
                assert!(matches!(err, ConfigError::EnvError(_)));
                assert!(err.to_string().contains("BATCH_MAX_CONCURRENT"));
            },
        );
    }

    #[test]
    fn test_invalid_file_value_fails_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cache:").unwrap();
        writeln!(file, "  max_entries: 0").unwrap();

        let loader = ConfigLoader::with_prefix("MANIFOLD_TEST_VALIDATE");
        let err = loader.from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::DomainError { .. }));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let loader = ConfigLoader::with_prefix("MANIFOLD_TEST_MISSING");
        let err = loader.from_file("/nonexistent/manifold.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError(_)));
    }
}
