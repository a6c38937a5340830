//! Pre-dispatch checks with veto power over request processing.
//!
//! Middleware run in registration order before the resolved operation. A
//! middleware that returns a response from [`Middleware::before`] rejects
//! the request: that response is final, nothing later in the chain runs,
//! and the dispatcher takes no further action.

mod auth;
mod core;
mod metrics;
mod tracing;

pub use auth::{AuthMiddleware, SessionAuthMiddleware};
pub use core::Middleware;
pub use metrics::MetricsMiddleware;
pub use tracing::TracingMiddleware;
