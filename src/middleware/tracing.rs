use std::time::Duration;

use ::tracing::info;

use super::Middleware;
use crate::dispatcher::{HandlerResponse, RequestContext};

/// Logs one structured event at the start and end of each request.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, ctx: &mut RequestContext) -> Option<HandlerResponse> {
        info!(
            method = %ctx.request.method,
            path = %ctx.request.path,
            operation = %ctx.operation,
            "request start"
        );
        None
    }

    fn after(&self, ctx: &RequestContext, res: &mut HandlerResponse, latency: Duration) {
        info!(
            operation = %ctx.operation,
            status = res.status,
            latency_ms = latency.as_millis() as u64,
            "request complete"
        );
    }
}
