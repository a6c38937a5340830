//! Convention-based route registration and resolution.
//!
//! A [`HandlerSet`] is an explicit table of named operations, built once at
//! startup. The [`Router`] maps a request path to the registration with the
//! longest matching pattern, then resolves the operation to invoke from the
//! verb and the first path segment after the pattern:
//!
//! 1. camel-cased segment + capitalized verb (`create-user` + `POST` →
//!    `CreateUserPost`), remaining path starts at the next `/`;
//! 2. bare capitalized verb (`Get`), remaining path is the whole subtree;
//! 3. `Default`, remaining path is the whole subtree;
//! 4. otherwise no resolution — the caller answers 404.
//!
//! The table is populated before the server starts and is read-only
//! afterwards, so concurrent lookups need no locking.

mod core;

pub use core::{resolve, HandlerSet, Registration, RouteMatch, Router};
