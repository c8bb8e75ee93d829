//! Configuration domains
//!
//! Each domain owns one area of the system and validates itself.

pub mod batch;
pub mod cache;
pub mod retry;
pub mod utils;

pub use batch::BatchConfig;
pub use cache::CacheConfig;
pub use retry::RetryConfig;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Complete Manifold configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifoldConfig {
    /// Batch processor settings
    pub batch: BatchConfig,

    /// Response cache settings
    pub cache: CacheConfig,

    /// Retry policy settings
    pub retry: RetryConfig,
}

impl ManifoldConfig {
    /// Create a new configuration with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate every domain
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.batch.validate()?;
        self.cache.validate()?;
        self.retry.validate()?;
        Ok(())
    }

    /// Render a sample configuration file with default values
    pub fn generate_sample() -> ConfigResult<String> {
        let config = Self::default();
        Ok(serde_yaml::to_string(&config)?)
    }
}
