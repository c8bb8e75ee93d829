//! The dispatcher seam between the batch processor and operation handlers

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use manifold_core::Method;
use manifold_resilience::Retryable;

/// Default advisory deadline threaded to dispatchers
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// A canonical sub-request handed to the dispatcher
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// Operation endpoint
    pub endpoint: String,

    /// Request method
    pub method: Method,

    /// Query-like parameters
    pub params: Vec<(String, String)>,

    /// Structured payload
    pub body: Option<Value>,

    /// Request headers
    pub headers: Vec<(String, String)>,

    /// Per-request deadline. Advisory at the processor layer; enforced
    /// by the dispatcher, if at all.
    pub timeout: Duration,
}

impl DispatchRequest {
    /// Create a new dispatch request
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            params: Vec::new(),
            body: None,
            headers: Vec::new(),
            timeout: DEFAULT_DISPATCH_TIMEOUT,
        }
    }

    /// Add query-like parameters
    pub fn with_params(mut self, params: Vec<(String, String)>) -> Self {
        self.params = params;
        self
    }

    /// Add a structured payload
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add headers
    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    /// Override the deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The outcome of one successful dispatch
#[derive(Debug, Clone)]
pub struct Dispatched {
    /// Status code reported to the caller
    pub status: u16,

    /// Response payload
    pub payload: Value,
}

impl Dispatched {
    /// A 200 response carrying `payload`
    pub fn ok(payload: Value) -> Self {
        Self {
            status: 200,
            payload,
        }
    }

    /// A response with an explicit status code
    pub fn with_status(status: u16, payload: Value) -> Self {
        Self { status, payload }
    }
}

/// Dispatch failure modes
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No handler is registered for the operation
    #[error("No route matches {method} {endpoint}")]
    NotFound { method: Method, endpoint: String },

    /// The handler raised an error
    #[error("Handler error: {0}")]
    Handler(String),

    /// The handler exceeded the request deadline
    #[error("Dispatch timed out after {timeout:?}")]
    Timeout { timeout: Duration },
}

impl DispatchError {
    /// Create a handler error
    pub fn handler(message: impl Into<String>) -> Self {
        DispatchError::Handler(message.into())
    }

    /// Status code this failure maps to on the wire
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::NotFound { .. } => 404,
            DispatchError::Handler(_) | DispatchError::Timeout { .. } => 500,
        }
    }
}

// Unknown routes stay unknown no matter how often they are retried;
// handler failures and timeouts may be transient.
impl Retryable for DispatchError {
    fn is_retryable(&self) -> bool {
        !matches!(self, DispatchError::NotFound { .. })
    }
}

/// Black-box executor for canonical sub-requests
#[async_trait]
pub trait Dispatch: Send + Sync {
    /// Execute one canonical sub-request
    async fn dispatch(&self, request: DispatchRequest) -> Result<Dispatched, DispatchError>;
}
