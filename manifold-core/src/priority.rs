//! Priority tiers and operation classification

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::ParseError;

/// Endpoint fragments that mark an operation as critical
const CRITICAL_PATTERNS: &[&str] = &["/auth", "/session"];

/// Endpoint fragments that mark an operation as high priority
const HIGH_PATTERNS: &[&str] = &["/message", "/stream", "/question"];

/// Endpoint fragments that mark an operation as low priority
const LOW_PATTERNS: &[&str] = &["/stats", "/archive"];

/// Scheduling tiers for batched sub-requests
///
/// Declared in scheduling order: sorting by priority ascending puts
/// critical work first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Priority {
    Critical,
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    /// Get the string representation of the priority
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }

    /// Get the numeric scheduling rank (lower runs earlier)
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Normal => 2,
            Priority::Low => 3,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Priority::Critical),
            "high" => Ok(Priority::High),
            "normal" => Ok(Priority::Normal),
            "low" => Ok(Priority::Low),
            _ => Err(ParseError::InvalidPriority(s.to_string())),
        }
    }
}

/// Classify an operation into a priority tier from its endpoint.
///
/// Pattern lists are checked in tier order and the first containing
/// match wins; endpoints matching nothing are normal priority.
pub fn classify_operation(endpoint: &str) -> Priority {
    if CRITICAL_PATTERNS.iter().any(|p| endpoint.contains(p)) {
        Priority::Critical
    } else if HIGH_PATTERNS.iter().any(|p| endpoint.contains(p)) {
        Priority::High
    } else if LOW_PATTERNS.iter().any(|p| endpoint.contains(p)) {
        Priority::Low
    } else {
        Priority::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Critical < Priority::High);
        assert!(Priority::High < Priority::Normal);
        assert!(Priority::Normal < Priority::Low);

        assert_eq!(Priority::Critical.rank(), 0);
        assert_eq!(Priority::Low.rank(), 3);
    }

    #[test]
    fn test_priority_parsing() {
        assert_eq!("critical".parse::<Priority>().unwrap(), Priority::Critical);
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_classify_critical_endpoints() {
        assert_eq!(classify_operation("/api/auth/login"), Priority::Critical);
        assert_eq!(classify_operation("/session/refresh"), Priority::Critical);
    }

    #[test]
    fn test_classify_high_endpoints() {
        assert_eq!(classify_operation("/message/send"), Priority::High);
        assert_eq!(classify_operation("/documents/stream"), Priority::High);
        assert_eq!(classify_operation("/question/42"), Priority::High);
    }

    #[test]
    fn test_classify_low_endpoints() {
        assert_eq!(classify_operation("/stats/daily"), Priority::Low);
        assert_eq!(classify_operation("/archive/2024"), Priority::Low);
    }

    #[test]
    fn test_classify_defaults_to_normal() {
        assert_eq!(classify_operation("/documents/list"), Priority::Normal);
        assert_eq!(classify_operation(""), Priority::Normal);
    }

    #[test]
    fn test_classify_first_match_wins() {
        // Matches both a critical and a low pattern; critical is checked first.
        assert_eq!(classify_operation("/auth/stats"), Priority::Critical);
    }
}
