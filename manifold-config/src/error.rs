//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Environment variable error: {0}")]
    EnvError(String),

    #[error("Invalid configuration value for '{domain}': {message}")]
    DomainError { domain: String, message: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
