//! Core type definitions for Manifold

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// HTTP-like methods understood by the batch processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[derive(Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Method {
    /// Get the string representation of the method
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }

    /// Whether the method is read-only and therefore eligible for
    /// deduplication and response caching
    pub fn is_idempotent(&self) -> bool {
        matches!(self, Method::Get | Method::Head | Method::Options)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Method {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            _ => Err(ParseError::InvalidMethod(s.to_string())),
        }
    }
}

/// Errors that can occur when parsing types
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("Invalid method: '{0}'. Supported methods are: GET, POST, PUT, DELETE, PATCH, HEAD, OPTIONS")]
    InvalidMethod(String),

    #[error("Invalid priority: '{0}'. Supported priorities are: critical, high, normal, low")]
    InvalidPriority(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing() {
        assert_eq!("GET".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("post".parse::<Method>().unwrap(), Method::Post);
        assert!("INVALID".parse::<Method>().is_err());
    }

    #[test]
    fn test_method_default_is_get() {
        assert_eq!(Method::default(), Method::Get);
    }

    #[test]
    fn test_idempotent_methods() {
        assert!(Method::Get.is_idempotent());
        assert!(Method::Head.is_idempotent());
        assert!(Method::Options.is_idempotent());
        assert!(!Method::Post.is_idempotent());
        assert!(!Method::Put.is_idempotent());
        assert!(!Method::Delete.is_idempotent());
        assert!(!Method::Patch.is_idempotent());
    }

    #[test]
    fn test_method_serialization() {
        let json = serde_json::to_string(&Method::Get).unwrap();
        assert_eq!(json, "\"GET\"");

        let method: Method = serde_json::from_str("\"DELETE\"").unwrap();
        assert_eq!(method, Method::Delete);
    }
}
