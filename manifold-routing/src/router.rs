//! Table-driven router
//!
//! Routes are an explicit ordered table of `(method, pattern)` pairs.
//! Resolution walks the table in registration order and the first match
//! wins; there is no ad hoc string matching anywhere else.

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, warn};

use manifold_core::Method;

use crate::dispatch::{Dispatch, DispatchError, DispatchRequest, Dispatched};

/// Type for route handler functions
pub type RouteHandler = dyn Fn(RouteContext) -> Pin<Box<dyn Future<Output = Result<Dispatched, DispatchError>> + Send>>
    + Send
    + Sync;

/// A matched request handed to a route handler
#[derive(Debug, Clone)]
pub struct RouteContext {
    /// The dispatched request
    pub request: DispatchRequest,

    /// Path captures from the matched pattern, in declaration order
    pub captures: Vec<(String, String)>,
}

impl RouteContext {
    /// Look up a path capture by name
    pub fn capture(&self, name: &str) -> Option<&str> {
        self.captures
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// One pattern segment
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A normalized endpoint pattern with `:name` captures
#[derive(Debug, Clone)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parse a pattern such as `/documents/:id/revisions`
    pub fn parse(pattern: &str) -> Self {
        let segments = normalize(pattern)
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(s.to_string()),
            })
            .collect();

        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match an endpoint, returning captures on success
    pub fn matches(&self, endpoint: &str) -> Option<Vec<(String, String)>> {
        let parts: Vec<&str> = normalize(endpoint).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut captures = Vec::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) => {
                    if lit != part {
                        return None;
                    }
                }
                Segment::Param(name) => captures.push((name.clone(), part.to_string())),
            }
        }

        Some(captures)
    }
}

/// Split a path into segments, dropping empty ones so leading, trailing
/// and doubled slashes never affect matching
fn normalize(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// One table entry
struct Route {
    method: Method,
    pattern: RoutePattern,
    handler: Arc<RouteHandler>,
}

/// Table-driven dispatcher
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Create an empty router
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a route. Routes are tried in registration order and the
    /// first match wins.
    pub fn route<F, Fut>(mut self, method: Method, pattern: &str, handler: F) -> Self
    where
        F: Fn(RouteContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Dispatched, DispatchError>> + Send + 'static,
    {
        let handler: Arc<RouteHandler> = Arc::new(move |ctx: RouteContext| {
            Box::pin(handler(ctx))
                as Pin<Box<dyn Future<Output = Result<Dispatched, DispatchError>> + Send>>
        });

        self.routes.push(Route {
            method,
            pattern: RoutePattern::parse(pattern),
            handler,
        });
        self
    }

    /// Number of registered routes
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn resolve(&self, method: Method, endpoint: &str) -> Option<(&Route, Vec<(String, String)>)> {
        self.routes.iter().find_map(|route| {
            if route.method != method {
                return None;
            }
            route.pattern.matches(endpoint).map(|caps| (route, caps))
        })
    }
}

#[async_trait]
impl Dispatch for Router {
    async fn dispatch(&self, request: DispatchRequest) -> Result<Dispatched, DispatchError> {
        let (route, captures) = self
            .resolve(request.method, &request.endpoint)
            .ok_or_else(|| DispatchError::NotFound {
                method: request.method,
                endpoint: request.endpoint.clone(),
            })?;

        debug!(
            method = %request.method,
            endpoint = %request.endpoint,
            pattern = route.pattern.as_str(),
            "Dispatching request"
        );

        let deadline = request.timeout;
        let context = RouteContext { request, captures };

        match timeout(deadline, (route.handler)(context)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Handler exceeded deadline of {:?}", deadline);
                Err(DispatchError::Timeout { timeout: deadline })
            }
        }
    }
}
