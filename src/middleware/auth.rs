use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use super::Middleware;
use crate::dispatcher::{HandlerResponse, RequestContext};

/// Rejects requests whose `Authorization` header does not carry the
/// configured token.
pub struct AuthMiddleware {
    token: String,
}

impl AuthMiddleware {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Middleware for AuthMiddleware {
    fn before(&self, ctx: &mut RequestContext) -> Option<HandlerResponse> {
        match ctx.request.headers.get("authorization") {
            Some(h) if h == &self.token => None,
            _ => {
                warn!(path = %ctx.request.path, "authorization header missing or invalid");
                Some(HandlerResponse::error(401, "Unauthorized"))
            }
        }
    }

    fn after(&self, _ctx: &RequestContext, _res: &mut HandlerResponse, _latency: Duration) {}
}

/// Rejects requests whose session does not contain the given key.
///
/// Typical use: a login operation stores `user` in the session; every other
/// registration guards itself with `SessionAuthMiddleware::new("user")`.
/// The session cookie is decoded through the normal codec, so a forged or
/// tampered cookie is simply an empty session and gets rejected.
pub struct SessionAuthMiddleware {
    key: String,
}

impl SessionAuthMiddleware {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Middleware for SessionAuthMiddleware {
    fn before(&self, ctx: &mut RequestContext) -> Option<HandlerResponse> {
        let present = match ctx.session() {
            Ok(session) => session.get(&self.key).is_some_and(|v| *v != Value::Null),
            Err(err) => {
                warn!(error = %err, "session unavailable during auth check");
                false
            }
        };
        if present {
            None
        } else {
            Some(HandlerResponse::error(401, "Unauthorized"))
        }
    }
}
