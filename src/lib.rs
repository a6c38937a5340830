//! # Waypost
//!
//! **Waypost** is a minimal web-routing layer with two independent pieces:
//!
//! - a **request router** that dispatches HTTP requests to named operations
//!   by convention over URL path and verb (`POST /api/create-user` →
//!   `CreateUserPost`), with a per-registration middleware chain, and
//! - a **session codec** that carries key/value session state entirely in a
//!   tamper-evident cookie — HMAC-SHA1 signed, base64 encoded, no
//!   server-side storage.
//!
//! ## Architecture
//!
//! - **[`session`]** — signed cookie encode/decode and the error taxonomy
//! - **[`router`]** — registration table and convention-based resolution
//! - **[`dispatcher`]** — per-request lifecycle: middleware → operation →
//!   session flush → response
//! - **[`middleware`]** — pre-dispatch checks with veto power
//! - **[`server`]** — `may_minihttp` transport glue and server lifecycle
//! - **[`config`]** — injected secret-key and runtime configuration
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use waypost::config::SessionConfig;
//! use waypost::dispatcher::Dispatcher;
//! use waypost::router::{HandlerSet, Router};
//! use waypost::server::{AppService, HttpServer};
//!
//! let handler = HandlerSet::new()
//!     .operation("Get", |ctx| {
//!         let session = ctx.session()?;
//!         session.insert("seen".into(), serde_json::json!(true));
//!         ctx.json_response(&serde_json::json!({ "ok": true }))
//!     })
//!     .operation("LogoutPost", |ctx| {
//!         ctx.session()?.clear();
//!         ctx.json_response(&serde_json::json!({ "ok": true }))
//!     });
//!
//! let mut router = Router::new();
//! router.handle("/app/", handler, Vec::new());
//!
//! let config = Arc::new(SessionConfig::new("change-me"));
//! let dispatcher = Arc::new(Dispatcher::new(config));
//! let service = AppService::new(Arc::new(router), dispatcher);
//! let handle = HttpServer(service).start("0.0.0.0:8080").unwrap();
//! handle.join().unwrap();
//! ```
//!
//! ## Runtime Considerations
//!
//! Waypost runs on the `may` coroutine runtime, not tokio: each in-flight
//! request occupies one coroutine, and the registration table plus the
//! signing secret are the only state shared across requests — both
//! read-only after startup, so no request path takes a lock.

pub mod config;
pub mod dispatcher;
pub mod middleware;
pub mod router;
pub mod server;
pub mod session;

pub use config::{RuntimeConfig, SessionConfig};
pub use dispatcher::{Dispatcher, HandlerResponse, RequestContext};
pub use router::{HandlerSet, Router};
pub use session::{decode_session, encode_session, DecodedSession, Session, SessionError};
