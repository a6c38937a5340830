use http::Method;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::dispatcher::{Operation, RequestContext};
use crate::middleware::Middleware;

/// Table of named operations for one handler registration.
///
/// This is the compile-time replacement for reflection-based method lookup:
/// every operation a handler exposes is registered here by its convention
/// name (`CreateUserPost`, `Get`, `Default`, ...) and resolution is a plain
/// map lookup against synthesized candidate names.
#[derive(Default, Clone)]
pub struct HandlerSet {
    operations: HashMap<String, Operation>,
}

impl HandlerSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation under its convention name.
    ///
    /// Re-registering a name replaces the previous operation.
    #[must_use]
    pub fn operation<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&mut RequestContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        if self.operations.insert(name.to_string(), Arc::new(f)).is_some() {
            warn!(operation = name, "replaced existing operation");
        }
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.operations.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// One path-pattern registration: the handler set, its middleware chain,
/// and the pattern it was registered under.
pub struct Registration {
    pub pattern: String,
    pub handler: HandlerSet,
    pub middlewares: Vec<Arc<dyn Middleware>>,
}

/// Result of matching a request against the registration table.
#[derive(Clone)]
pub struct RouteMatch {
    pub registration: Arc<Registration>,
    /// Resolved operation name (e.g. `CreateUserPost`).
    pub operation: String,
    /// Unconsumed path after the resolved segment, available to the
    /// operation as sub-path parameters.
    pub remaining: String,
}

/// Maps request paths to handler registrations.
///
/// Patterns follow `net/http` mux semantics: a pattern ending in `/`
/// matches its whole subtree, anything else matches exactly. The longest
/// matching pattern wins. Registrations happen at startup only; the table
/// is read concurrently without locks afterwards.
#[derive(Default, Clone)]
pub struct Router {
    registrations: Vec<Arc<Registration>>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler set (and its middleware chain) under a pattern.
    ///
    /// Registering the same pattern again replaces the previous entry.
    pub fn handle(
        &mut self,
        pattern: &str,
        handler: HandlerSet,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) {
        if let Some(pos) = self.registrations.iter().position(|r| r.pattern == pattern) {
            warn!(pattern, "replaced existing registration");
            self.registrations.remove(pos);
        }
        info!(
            pattern,
            operations = handler.len(),
            middleware_count = middlewares.len(),
            "handler registered"
        );
        self.registrations.push(Arc::new(Registration {
            pattern: pattern.to_string(),
            handler,
            middlewares,
        }));
    }

    /// Print all registrations to stdout. Useful for startup debugging.
    pub fn dump_routes(&self) {
        println!("[routes] count={}", self.registrations.len());
        for reg in &self.registrations {
            let mut names: Vec<&str> = reg.handler.operations.keys().map(String::as_str).collect();
            names.sort_unstable();
            println!("[route] {} -> {:?}", reg.pattern, names);
        }
    }

    /// Match a request to a registration and resolve its operation.
    ///
    /// Returns `None` when no pattern matches the path or the matched
    /// handler set resolves no operation; the caller answers 404.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        debug!(method = %method, path = %path, "route match attempt");

        let registration = self.match_pattern(path)?;
        let prefix = registration.pattern.trim_end_matches('/');
        let subtree = &path[prefix.len()..];

        match resolve(&registration.handler, method, subtree) {
            Some((operation, remaining)) => {
                info!(
                    method = %method,
                    path = %path,
                    pattern = %registration.pattern,
                    operation = %operation,
                    remaining = %remaining,
                    "route matched"
                );
                Some(RouteMatch {
                    registration,
                    operation,
                    remaining,
                })
            }
            None => {
                warn!(
                    method = %method,
                    path = %path,
                    pattern = %registration.pattern,
                    "no operation resolves"
                );
                None
            }
        }
    }

    /// Longest registered pattern matching the path.
    fn match_pattern(&self, path: &str) -> Option<Arc<Registration>> {
        let mut best: Option<&Arc<Registration>> = None;
        for reg in &self.registrations {
            if !pattern_matches(&reg.pattern, path) {
                continue;
            }
            if best.map_or(true, |b| reg.pattern.len() > b.pattern.len()) {
                best = Some(reg);
            }
        }
        match best {
            Some(reg) => Some(Arc::clone(reg)),
            None => {
                warn!(path = %path, "no pattern matched");
                None
            }
        }
    }
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    match pattern.strip_suffix('/') {
        // Subtree pattern: matches the subtree root with or without the
        // trailing slash, plus everything below it.
        Some(prefix) => path == prefix || path.starts_with(pattern),
        None => path == pattern,
    }
}

/// Capitalize an HTTP verb the way operation names expect: first letter
/// upper, rest lower ("GET" → "Get", "DELETE" → "Delete").
fn verb_name(method: &Method) -> String {
    let mut out = String::with_capacity(method.as_str().len());
    for (i, ch) in method.as_str().chars().enumerate() {
        if i == 0 {
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

/// Camel-case a path segment: the first letter and every letter following
/// a `-` are upper-cased, the `-` characters removed
/// (`create-user` → `CreateUser`).
fn camel_case_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut upper_next = true;
    for ch in segment.chars() {
        if ch == '-' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Resolve the operation for a verb and the path subtree after a pattern.
///
/// Pure function; priority is fixed: segment+verb, then bare verb, then
/// `Default`. Returns the operation name and the remaining path.
#[must_use]
pub fn resolve(handler: &HandlerSet, method: &Method, subtree: &str) -> Option<(String, String)> {
    let verb = verb_name(method);

    let rel = subtree.strip_prefix('/').unwrap_or(subtree);
    if !rel.is_empty() {
        let (segment, rest) = match rel.find('/') {
            Some(pos) => (&rel[..pos], &rel[pos..]),
            None => (rel, ""),
        };
        let candidate = format!("{}{}", camel_case_segment(segment), verb);
        if handler.contains(&candidate) {
            return Some((candidate, rest.to_string()));
        }
    }

    if handler.contains(&verb) {
        return Some((verb, subtree.to_string()));
    }
    if handler.contains("Default") {
        return Some(("Default".to_string(), subtree.to_string()));
    }
    None
}
