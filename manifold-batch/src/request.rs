//! Sub-request parsing and canonical identity
//!
//! Raw batch items are parsed leniently: a malformed item degrades to
//! defaults (empty endpoint, GET) and fails later at dispatch instead of
//! aborting its batch.

use chrono::Utc;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use manifold_core::{classify_operation, DedupKey, Method, Priority};
use manifold_routing::DispatchRequest;

/// Defaults applied to fields a raw sub-request omits
#[derive(Debug, Clone, Copy)]
pub struct RequestDefaults {
    /// Retry budget when the item carries none
    pub max_retries: u32,

    /// Execution deadline when the item carries none
    pub timeout: Duration,
}

/// One unit of work inside a batch
#[derive(Debug, Clone)]
pub struct SubRequest {
    /// Correlation id, unique within a batch
    pub id: String,

    /// Request method
    pub method: Method,

    /// Operation endpoint
    pub endpoint: String,

    /// Query-like parameters
    pub params: Vec<(String, String)>,

    /// Structured payload
    pub body: Option<Value>,

    /// Request headers
    pub headers: Vec<(String, String)>,

    /// Scheduling tier derived from the endpoint
    pub priority: Priority,

    /// Retry budget for the canonical execution
    pub max_retries: u32,

    /// Per-request execution deadline
    pub timeout: Duration,

    /// Position in the submitted batch
    pub ordinal: usize,
}

impl SubRequest {
    /// Parse one raw batch item.
    ///
    /// Missing or mistyped fields fall back to defaults rather than
    /// rejecting the item. A missing id is derived from the submission
    /// time and batch position; callers should always supply one.
    pub fn from_value(raw: &Value, ordinal: usize, defaults: RequestDefaults) -> Self {
        let endpoint = raw
            .get("endpoint")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let method: Method = raw
            .get("method")
            .and_then(Value::as_str)
            .and_then(|m| m.parse().ok())
            .unwrap_or_default();

        let id = match raw.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let fallback = format!("{}-{}", Utc::now().timestamp_micros(), ordinal);
                warn!(ordinal, fallback = %fallback, "sub-request submitted without an id");
                fallback
            }
        };

        let params = raw
            .get("params")
            .and_then(Value::as_object)
            .map(collect_string_pairs)
            .unwrap_or_default();

        let headers = raw
            .get("headers")
            .and_then(Value::as_object)
            .map(collect_string_pairs)
            .unwrap_or_default();

        let body = raw.get("data").filter(|v| !v.is_null()).cloned();

        let max_retries = raw
            .get("max_retries")
            .and_then(Value::as_u64)
            .map(|n| n as u32)
            .unwrap_or(defaults.max_retries);

        let timeout = raw
            .get("timeout")
            .and_then(Value::as_f64)
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(defaults.timeout);

        let priority = classify_operation(&endpoint);

        Self {
            id,
            method,
            endpoint,
            params,
            body,
            headers,
            priority,
            max_retries,
            timeout,
            ordinal,
        }
    }

    /// Canonical identity for deduplication and caching.
    ///
    /// Idempotent requests share a key with their equivalents; mutating
    /// requests get a key no other request can collide with.
    pub fn dedup_key(&self) -> DedupKey {
        if self.method.is_idempotent() {
            DedupKey::shared(
                self.method,
                self.endpoint.clone(),
                self.params.clone(),
                self.headers.clone(),
                self.body.as_ref(),
            )
        } else {
            DedupKey::unique(self.method, self.endpoint.clone(), self.ordinal as u64)
        }
    }

    /// Build the dispatcher request for this sub-request
    pub fn to_dispatch(&self) -> DispatchRequest {
        let mut request = DispatchRequest::new(self.method, self.endpoint.clone())
            .with_params(self.params.clone())
            .with_headers(self.headers.clone())
            .with_timeout(self.timeout);

        if let Some(body) = &self.body {
            request = request.with_body(body.clone());
        }

        request
    }
}

/// Flatten a JSON object into string pairs; non-string values keep their
/// JSON rendering
fn collect_string_pairs(map: &serde_json::Map<String, Value>) -> Vec<(String, String)> {
    map.iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}
