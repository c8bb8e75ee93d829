//! Dispatching for Manifold
//!
//! The batch processor hands canonical sub-requests to a [`Dispatch`]
//! implementation and knows nothing about what sits behind it. This
//! crate defines that seam plus [`Router`], the table-driven
//! implementation used by applications embedding the processor.

pub mod dispatch;
pub mod router;

// Re-export commonly used types
pub use dispatch::{Dispatch, DispatchError, DispatchRequest, Dispatched};
pub use router::{RouteContext, RouteHandler, RoutePattern, Router};
