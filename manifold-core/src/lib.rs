//! Core domain types for Manifold
//!
//! This crate contains the fundamental types shared by the batch
//! processing pipeline. It has minimal dependencies and defines the
//! domain language of the system.

pub mod dedup;
pub mod priority;
pub mod types;

// Re-export commonly used types at the crate root
pub use dedup::DedupKey;
pub use priority::{classify_operation, Priority};
pub use types::{Method, ParseError};
