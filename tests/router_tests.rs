use http::Method;
use waypost::router::{resolve, HandlerSet, Router};

mod tracing_util;
use tracing_util::TestTracing;

fn noop_set(names: &[&str]) -> HandlerSet {
    let mut set = HandlerSet::new();
    for name in names {
        set = set.operation(name, |_ctx| Ok(()));
    }
    set
}

#[test]
fn test_segment_verb_resolution() {
    let _t = TestTracing::init();
    let mut router = Router::new();
    router.handle("/api/", noop_set(&["CreateUserPost", "Get"]), Vec::new());

    let m = router.route(&Method::POST, "/api/create-user").unwrap();
    assert_eq!(m.operation, "CreateUserPost");
    assert_eq!(m.remaining, "");
}

#[test]
fn test_bare_verb_fallback_keeps_full_subtree() {
    let mut router = Router::new();
    router.handle("/api/", noop_set(&["CreateUserPost", "Get"]), Vec::new());

    // no AnythingElseGet operation, so the bare verb matches and the whole
    // subtree stays available to the handler
    let m = router.route(&Method::GET, "/api/anything-else").unwrap();
    assert_eq!(m.operation, "Get");
    assert_eq!(m.remaining, "/anything-else");
}

#[test]
fn test_unresolvable_verb_is_none() {
    let mut router = Router::new();
    router.handle("/api/", noop_set(&["CreateUserPost", "Get"]), Vec::new());

    // DELETE resolves nothing and there is no Default
    assert!(router.route(&Method::DELETE, "/api/").is_none());
}

#[test]
fn test_default_fallback() {
    let mut router = Router::new();
    router.handle("/api/", noop_set(&["Default"]), Vec::new());

    let m = router.route(&Method::PUT, "/api/whatever/deep").unwrap();
    assert_eq!(m.operation, "Default");
    assert_eq!(m.remaining, "/whatever/deep");
}

#[test]
fn test_segment_verb_leaves_rest_of_path() {
    let mut router = Router::new();
    router.handle("/api/", noop_set(&["UsersGet"]), Vec::new());

    let m = router.route(&Method::GET, "/api/users/42/profile").unwrap();
    assert_eq!(m.operation, "UsersGet");
    assert_eq!(m.remaining, "/42/profile");
}

#[test]
fn test_longest_pattern_wins() {
    let _t = TestTracing::init();
    let mut router = Router::new();
    router.handle("/", noop_set(&["Get"]), Vec::new());
    router.handle("/api/", noop_set(&["Default"]), Vec::new());
    router.handle("/api/admin/", noop_set(&["Default"]), Vec::new());

    let m = router.route(&Method::GET, "/api/admin/panel").unwrap();
    assert_eq!(m.registration.pattern, "/api/admin/");

    let m = router.route(&Method::GET, "/api/users").unwrap();
    assert_eq!(m.registration.pattern, "/api/");

    let m = router.route(&Method::GET, "/about").unwrap();
    assert_eq!(m.registration.pattern, "/");
}

#[test]
fn test_exact_pattern_does_not_match_subtree() {
    let mut router = Router::new();
    router.handle("/about", noop_set(&["Get"]), Vec::new());

    assert!(router.route(&Method::GET, "/about").is_some());
    assert!(router.route(&Method::GET, "/about/team").is_none());
    assert!(router.route(&Method::GET, "/aboutx").is_none());
}

#[test]
fn test_subtree_root_matches_without_trailing_slash() {
    let mut router = Router::new();
    router.handle("/api/", noop_set(&["Get"]), Vec::new());

    let m = router.route(&Method::GET, "/api").unwrap();
    assert_eq!(m.operation, "Get");
    assert_eq!(m.remaining, "");
}

#[test]
fn test_reregistration_replaces() {
    let mut router = Router::new();
    router.handle("/api/", noop_set(&["Get"]), Vec::new());
    router.handle("/api/", noop_set(&["Post"]), Vec::new());

    assert!(router.route(&Method::GET, "/api/").is_none());
    assert!(router.route(&Method::POST, "/api/").is_some());
}

#[test]
fn test_resolve_priority_order() {
    let set = noop_set(&["UsersGet", "Get", "Default"]);

    // segment+verb beats bare verb
    let (op, rest) = resolve(&set, &Method::GET, "/users/1").unwrap();
    assert_eq!(op, "UsersGet");
    assert_eq!(rest, "/1");

    // bare verb beats Default
    let (op, rest) = resolve(&set, &Method::GET, "/posts").unwrap();
    assert_eq!(op, "Get");
    assert_eq!(rest, "/posts");

    // unknown verb falls through to Default
    let (op, _) = resolve(&set, &Method::DELETE, "/users/1").unwrap();
    assert_eq!(op, "Default");
}

#[test]
fn test_resolve_hyphenated_multi_segment() {
    let set = noop_set(&["AccountSettingsPut"]);
    let (op, rest) = resolve(&set, &Method::PUT, "/account-settings").unwrap();
    assert_eq!(op, "AccountSettingsPut");
    assert_eq!(rest, "");
}

#[test]
fn test_resolve_empty_subtree_uses_bare_verb() {
    let set = noop_set(&["Get"]);
    let (op, rest) = resolve(&set, &Method::GET, "").unwrap();
    assert_eq!(op, "Get");
    assert_eq!(rest, "");
}
