use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::SessionConfig;
use crate::router::RouteMatch;
use crate::server::ParsedRequest;
use crate::session::{decode_session, encode_session, Session, SessionError};

/// Cookie name used by [`RequestContext::session`].
pub const DEFAULT_SESSION_COOKIE: &str = "session";

/// A registered operation: invoked with the per-request context, mutates
/// sessions and/or sets a response as side effects.
pub type Operation = Arc<dyn Fn(&mut RequestContext) -> anyhow::Result<()> + Send + Sync>;

/// Response assembled by the dispatcher and written by the server layer.
#[derive(Debug, Clone, Default)]
pub struct HandlerResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    /// `Set-Cookie` lines; kept apart from `headers` because the header
    /// name legitimately repeats.
    pub set_cookies: Vec<String>,
    pub body: Vec<u8>,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// A JSON response with the content type set.
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        let mut res = Self::new(status);
        res.body = body.to_string().into_bytes();
        res.set_header("Content-Type", "application/json".to_string());
        res
    }

    /// A JSON error body `{"error": message}`.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, &json!({ "error": message }))
    }

    /// Add or replace a header (name compared case-insensitively).
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value);
    }

    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Ephemeral per-request state handed to middleware and operations.
///
/// Owned exclusively by one request's coroutine; dropped once the response
/// is written. Sessions are materialized lazily on first access — decoded
/// from the incoming cookie, or empty when the cookie is absent, malformed,
/// or fails signature verification.
pub struct RequestContext {
    pub request: ParsedRequest,
    /// Name of the resolved operation.
    pub operation: String,
    /// Unconsumed path after the resolved segment.
    pub remaining_path: String,
    config: Arc<SessionConfig>,
    sessions: HashMap<String, Session>,
    body_map: Option<Map<String, Value>>,
    status: u16,
    content_type: String,
    response: Option<Vec<u8>>,
}

impl RequestContext {
    pub(crate) fn new(
        request: ParsedRequest,
        operation: String,
        remaining_path: String,
        config: Arc<SessionConfig>,
    ) -> Self {
        Self {
            request,
            operation,
            remaining_path,
            config,
            sessions: HashMap::new(),
            body_map: None,
            status: 200,
            content_type: String::new(),
            response: None,
        }
    }

    /// The default session, backed by the cookie named `session`.
    ///
    /// # Errors
    ///
    /// See [`RequestContext::session_by_name`].
    pub fn session(&mut self) -> Result<&mut Session, SessionError> {
        self.session_by_name(DEFAULT_SESSION_COOKIE)
    }

    /// A named session, lazily decoded from the matching cookie.
    ///
    /// Absent, malformed, and forged cookies all materialize as an empty
    /// session. Once accessed, the session is flushed back to a cookie at
    /// the end of the request (or cleared, if it ends up empty).
    ///
    /// # Errors
    ///
    /// `MissingSecret` when no signing key is configured, and
    /// `Deserialize` when a correctly signed payload is corrupt — both are
    /// fatal to the request rather than silently mapped to an empty session.
    pub fn session_by_name(&mut self, name: &str) -> Result<&mut Session, SessionError> {
        if !self.sessions.contains_key(name) {
            let values = match self.request.cookies.get(name) {
                None => Session::new(),
                Some(raw) => match decode_session(raw, &self.config) {
                    Ok(decoded) => decoded.values,
                    Err(err @ (SessionError::Deserialize(_) | SessionError::MissingSecret)) => {
                        return Err(err)
                    }
                    Err(err) => {
                        debug!(cookie = name, error = %err, "treating session cookie as absent");
                        Session::new()
                    }
                },
            };
            self.sessions.insert(name.to_string(), values);
        }
        match self.sessions.get_mut(name) {
            Some(session) => Ok(session),
            // inserted above; unreachable in practice
            None => Err(SessionError::NoCookie),
        }
    }

    /// Sessions touched so far this request.
    #[must_use]
    pub fn sessions(&self) -> &HashMap<String, Session> {
        &self.sessions
    }

    /// A query-string parameter. Form fields live in [`Self::body_map`].
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.request.query_params.get(key).map(String::as_str)
    }

    /// The request body as a map, parsed lazily once.
    ///
    /// A JSON object body maps directly; a scalar or array JSON body is
    /// stored under the empty key; a urlencoded form body maps field names
    /// to string values (repeated fields become arrays). Anything else
    /// yields an empty map.
    pub fn body_map(&mut self) -> &Map<String, Value> {
        let request = &self.request;
        self.body_map.get_or_insert_with(|| build_body_map(request))
    }

    /// Buffer a JSON response with `application/json` content type.
    ///
    /// # Errors
    ///
    /// Fails when `value` cannot be serialized.
    pub fn json_response<T: Serialize + ?Sized>(&mut self, value: &T) -> anyhow::Result<()> {
        let body = serde_json::to_vec(value)?;
        self.content_type = "application/json".to_string();
        self.response = Some(body);
        Ok(())
    }

    /// Buffer an arbitrary response payload.
    pub fn set_response(&mut self, status: u16, content_type: &str, body: Vec<u8>) {
        self.status = status;
        self.content_type = content_type.to_string();
        self.response = Some(body);
    }

    /// Respond with a plain-text error status.
    pub fn error(&mut self, status: u16, message: &str) {
        self.set_response(status, "text/plain; charset=utf-8", message.as_bytes().to_vec());
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }
}

fn build_body_map(request: &ParsedRequest) -> Map<String, Value> {
    let mut map = Map::new();
    let content_type = request
        .headers
        .get("content-type")
        .map(String::as_str)
        .unwrap_or("")
        .to_ascii_lowercase();

    if content_type.starts_with("application/json") {
        match &request.body {
            Some(Value::Object(obj)) => map = obj.clone(),
            Some(other) => {
                map.insert(String::new(), other.clone());
            }
            None => {}
        }
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        if let Some(raw) = &request.body_text {
            for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
                match map.get_mut(key.as_ref()) {
                    // repeated field: promote to / extend an array
                    Some(Value::Array(items)) => items.push(Value::String(value.into_owned())),
                    Some(existing) => {
                        let first = existing.take();
                        *existing = Value::Array(vec![first, Value::String(value.into_owned())]);
                    }
                    None => {
                        map.insert(key.into_owned(), Value::String(value.into_owned()));
                    }
                }
            }
        }
    }
    map
}

/// Drives the request lifecycle for resolved routes.
///
/// Holds the session config so flushed sessions can be re-signed; all other
/// state is per-request and lives on the [`RequestContext`].
#[derive(Clone)]
pub struct Dispatcher {
    config: Arc<SessionConfig>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(config: Arc<SessionConfig>) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &Arc<SessionConfig> {
        &self.config
    }

    /// Run middleware, invoke the operation, flush sessions, and assemble
    /// the response.
    ///
    /// Operation panics and errors are contained to this request: both are
    /// logged and answered with a 500 while other in-flight requests keep
    /// running. A session that fails to re-encode during flush is likewise
    /// fatal to the request.
    #[must_use]
    pub fn dispatch(&self, route: &RouteMatch, request: ParsedRequest) -> HandlerResponse {
        let mut ctx = RequestContext::new(
            request,
            route.operation.clone(),
            route.remaining.clone(),
            Arc::clone(&self.config),
        );

        let operation = match route.registration.handler.get(&route.operation) {
            Some(op) => Arc::clone(op),
            None => {
                // can only happen if resolution and registration disagree
                error!(operation = %route.operation, "resolved operation not registered");
                return HandlerResponse::error(500, "Internal Server Error");
            }
        };

        debug!(
            operation = %ctx.operation,
            middleware_count = route.registration.middlewares.len(),
            "running middleware chain"
        );
        for (idx, mw) in route.registration.middlewares.iter().enumerate() {
            if let Some(res) = mw.before(&mut ctx) {
                info!(
                    operation = %ctx.operation,
                    middleware_idx = idx,
                    status = res.status,
                    "middleware rejected request"
                );
                return res;
            }
        }

        let start = Instant::now();
        match catch_unwind(AssertUnwindSafe(|| operation(&mut ctx))) {
            Err(panic) => {
                error!(
                    operation = %ctx.operation,
                    panic = %panic_message(panic.as_ref()),
                    "operation panicked"
                );
                return HandlerResponse::error(500, "Internal Server Error");
            }
            Ok(Err(err)) => {
                error!(operation = %ctx.operation, error = %err, "operation failed");
                return HandlerResponse::error(500, "Internal Server Error");
            }
            Ok(Ok(())) => {}
        }
        let latency = start.elapsed();

        let mut res = match self.flush(&mut ctx) {
            Ok(res) => res,
            Err(res) => return res,
        };

        for mw in &route.registration.middlewares {
            mw.after(&ctx, &mut res, latency);
        }
        res
    }

    /// Write touched sessions back to cookies and assemble the response.
    fn flush(&self, ctx: &mut RequestContext) -> Result<HandlerResponse, HandlerResponse> {
        let mut cookies = Vec::with_capacity(ctx.sessions.len());
        for (name, session) in &ctx.sessions {
            if session.is_empty() {
                // an emptied session clears the cookie outright, it is
                // never re-encoded as an empty payload
                debug!(cookie = %name, "clearing emptied session cookie");
                cookies.push(format!("{name}=; Path=/; Max-Age=0"));
            } else {
                match encode_session(session, &self.config) {
                    Ok(value) => cookies.push(format!("{name}={value}; Path=/")),
                    Err(err) => {
                        error!(cookie = %name, error = %err, "session cookie flush failed");
                        return Err(HandlerResponse::error(500, "Internal Server Error"));
                    }
                }
            }
        }

        let mut res = HandlerResponse::new(ctx.status);
        if let Some(body) = ctx.response.take() {
            res.body = body;
            if !ctx.content_type.is_empty() {
                res.set_header("Content-Type", ctx.content_type.clone());
            }
        }
        res.set_cookies = cookies;
        Ok(res)
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}
