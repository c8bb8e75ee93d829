//! Wire format for batch responses
//!
//! A batch request arrives as `{ "requests": [...] }` and leaves as a
//! top-level envelope that is successful whenever processing ran to
//! completion; per-item failures live inside each item record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::stats::LifetimeStats;

/// Result record for one submitted sub-request.
///
/// Every id that shared a canonical execution receives the same status,
/// data, error, and duration; only the id differs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResponse {
    /// Caller-supplied correlation id
    pub id: String,

    /// HTTP-like status code
    pub status: u16,

    /// Whether this item completed successfully
    pub success: bool,

    /// Response payload, present on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Failure description, present on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// RFC 3339 completion timestamp
    pub timestamp: String,

    /// Seconds spent on the canonical execution this record shares
    pub duration: f64,

    /// Whether the result was served from the response cache
    pub from_cache: bool,
}

/// Summary statistics attached to each batch response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Wall-clock seconds the batch took end to end
    pub total_duration: f64,

    /// Wall-clock seconds divided by batch size
    pub average_duration: f64,

    /// Lifetime cache hits over lifetime requests
    pub cache_hit_rate: f64,

    /// Lifetime deduplicated requests over lifetime requests
    pub deduplication_rate: f64,
}

impl BatchStats {
    /// Derive batch statistics from this batch's wall time and the
    /// processor's lifetime counters
    pub(crate) fn from_batch(total_duration: f64, batch_size: usize, lifetime: &LifetimeStats) -> Self {
        let average_duration = if batch_size > 0 {
            total_duration / batch_size as f64
        } else {
            0.0
        };

        Self {
            total_duration,
            average_duration,
            cache_hit_rate: lifetime.cache_hit_rate,
            deduplication_rate: lifetime.deduplication_rate,
        }
    }
}

/// The `data` payload of a successful batch envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// One record per submitted sub-request, in submission order
    pub responses: Vec<ItemResponse>,

    /// Number of records, always equal to the number submitted
    pub count: usize,

    /// RFC 3339 timestamp of batch completion
    pub timestamp: String,

    /// Batch summary statistics
    pub stats: BatchStats,
}

/// Top-level batch response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEnvelope {
    /// Whether batch processing ran to completion
    pub success: bool,

    /// Batch report, present when processing ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<BatchReport>,

    /// Envelope-level failure, present when the input was malformed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchEnvelope {
    /// Wrap a completed batch report
    pub fn ok(report: BatchReport) -> Self {
        Self {
            success: true,
            data: Some(report),
            error: None,
        }
    }

    /// Reject a malformed batch payload
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}
