use std::time::Duration;

use crate::dispatcher::{HandlerResponse, RequestContext};

pub trait Middleware: Send + Sync {
    /// Observe the request before the operation runs.
    ///
    /// Returning `Some(response)` rejects the request; the middleware owns
    /// that response fully and neither later middleware nor the operation
    /// run. The context is mutable so checks can read lazily materialized
    /// state such as sessions.
    fn before(&self, _ctx: &mut RequestContext) -> Option<HandlerResponse> {
        None
    }

    /// Observe the finished response for an accepted request.
    fn after(&self, _ctx: &RequestContext, _res: &mut HandlerResponse, _latency: Duration) {}
}
