//! Deduplication keys for batched sub-requests
//!
//! Idempotent (read-only) requests that are equivalent after
//! canonicalization share one key, one execution, and one cache slot.
//! Mutating requests carry their batch ordinal in the key so they never
//! collide with anything.

use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::types::Method;

/// Canonical identity of a sub-request for deduplication and caching
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct DedupKey {
    /// Request method
    method: Method,

    /// Operation endpoint
    endpoint: String,

    /// Query-like parameters (sorted for consistency)
    params: Vec<(String, String)>,

    /// Headers participating in the key (sorted for consistency)
    headers: Vec<(String, String)>,

    /// Digest of the canonical JSON body, when one is present
    body_digest: Option<u64>,

    /// Batch ordinal, set only for non-idempotent requests
    discriminant: Option<u64>,
}

impl DedupKey {
    /// Derive the key shared by every equivalent idempotent request
    pub fn shared(
        method: Method,
        endpoint: impl Into<String>,
        params: Vec<(String, String)>,
        headers: Vec<(String, String)>,
        body: Option<&Value>,
    ) -> Self {
        let mut params = params;
        params.sort_by(|a, b| a.0.cmp(&b.0));
        let mut headers = headers;
        headers.sort_by(|a, b| a.0.cmp(&b.0));

        Self {
            method,
            endpoint: endpoint.into(),
            params,
            headers,
            body_digest: body.map(digest_value),
            discriminant: None,
        }
    }

    /// Derive a key unique to one request within one batch
    pub fn unique(method: Method, endpoint: impl Into<String>, ordinal: u64) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            params: Vec::new(),
            headers: Vec::new(),
            body_digest: None,
            discriminant: Some(ordinal),
        }
    }

    /// Whether this key can collapse multiple requests
    pub fn is_shared(&self) -> bool {
        self.discriminant.is_none()
    }
}

/// Hash a JSON value through its canonical serialization. Object keys
/// serialize in sorted order, so logically equal bodies digest equally.
fn digest_value(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.to_string().hash(&mut hasher);
    hasher.finish()
}
