//! Configuration validation framework

use crate::error::{ConfigError, ConfigResult};
use std::fmt::Display;

/// Trait for validatable configuration domains
pub trait Validatable {
    /// Validate the configuration, returning an error if invalid
    fn validate(&self) -> ConfigResult<()>;

    /// Get the domain name for error reporting
    fn domain_name() -> &'static str;

    /// Helper to create domain-specific validation errors
    fn validation_error(message: impl Into<String>) -> ConfigError {
        ConfigError::DomainError {
            domain: Self::domain_name().to_string(),
            message: message.into(),
        }
    }
}

/// Validate that a numeric value is positive
pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + Display,
{
    if value <= T::default() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{field_name} must be positive, got {value}"),
        });
    }
    Ok(())
}

/// Validate that a string value is one of the allowed choices
pub fn validate_enum_choice(
    value: &str,
    choices: &[&str],
    field_name: &str,
    domain: &str,
) -> ConfigResult<()> {
    if !choices.contains(&value) {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!(
                "{field_name} must be one of {choices:?}, got '{value}'"
            ),
        });
    }
    Ok(())
}
