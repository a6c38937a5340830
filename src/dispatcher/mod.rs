//! Per-request dispatch lifecycle.
//!
//! One [`RequestContext`] exists per request, exclusively owned by that
//! request's coroutine. [`Dispatcher::dispatch`] drives it through the
//! fixed sequence: middleware chain (first rejection wins) → operation
//! invocation (panics and errors are fatal to this request only) → session
//! flush (emptied sessions clear their cookie, touched ones re-sign) →
//! response assembly.

mod core;

pub use core::{Dispatcher, HandlerResponse, Operation, RequestContext, DEFAULT_SESSION_COOKIE};
