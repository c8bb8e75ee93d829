//! Configuration management for Manifold
//!
//! This crate provides modular configuration loading and validation split by
//! domain. Each domain owns its defaults and its validation rules; the loader
//! layers file contents and environment overrides on top.

pub mod domains;
pub mod error;
pub mod loader;
pub mod validation;

pub use domains::{BatchConfig, CacheConfig, ManifoldConfig, RetryConfig};
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;
