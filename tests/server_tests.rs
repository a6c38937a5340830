use serde_json::{json, Value};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;
use waypost::config::SessionConfig;
use waypost::dispatcher::Dispatcher;
use waypost::middleware::{MetricsMiddleware, Middleware, TracingMiddleware};
use waypost::router::{HandlerSet, Router};
use waypost::server::{AppService, HttpServer, ServerHandle};

mod tracing_util;
use tracing_util::TestTracing;

const SECRET: &str = "server-test-secret";

fn visit_handler() -> HandlerSet {
    HandlerSet::new()
        .operation("Get", |ctx| {
            let session = ctx.session()?;
            let visits = session.get("visits").and_then(Value::as_i64).unwrap_or(0) + 1;
            session.insert("visits".to_string(), json!(visits));
            ctx.json_response(&json!({ "visits": visits }))
        })
        .operation("LogoutPost", |ctx| {
            ctx.session()?.clear();
            ctx.json_response(&json!({ "ok": true }))
        })
}

fn start_service() -> (TestTracing, ServerHandle, SocketAddr) {
    // ensure coroutines have enough stack for tests
    may::config().set_stack_size(0x8000);
    let tracing = TestTracing::init();

    let middlewares: Vec<Arc<dyn Middleware>> = vec![Arc::new(TracingMiddleware)];
    let mut router = Router::new();
    router.handle("/session/", visit_handler(), middlewares);

    let metrics = Arc::new(MetricsMiddleware::new());
    let config = Arc::new(SessionConfig::new(SECRET));
    let mut service = AppService::new(Arc::new(router), Arc::new(Dispatcher::new(config)));
    service.set_metrics_middleware(metrics);

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let handle = HttpServer(service).start(addr).unwrap();
    handle.wait_ready().unwrap();
    (tracing, handle, addr)
}

fn send_request(addr: &SocketAddr, req: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(req.as_bytes()).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    let mut buf = Vec::new();
    loop {
        let mut tmp = [0u8; 1024];
        match stream.read(&mut tmp) {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&tmp[..n]),
            Err(ref e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                break
            }
            Err(e) => panic!("read error: {e:?}"),
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn parse_response(resp: &str) -> (u16, Value) {
    let mut parts = resp.split("\r\n\r\n");
    let headers = parts.next().unwrap_or("");
    let body = parts.next().unwrap_or("");
    let status = headers
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .unwrap_or(0);
    let json: Value = serde_json::from_str(body).unwrap_or_default();
    (status, json)
}

fn response_header<'a>(resp: &'a str, name: &str) -> Option<&'a str> {
    resp.split("\r\n\r\n").next().unwrap_or("").lines().find_map(|line| {
        let (header, value) = line.split_once(':')?;
        header.eq_ignore_ascii_case(name).then(|| value.trim())
    })
}

#[test]
fn test_health_endpoint() {
    let (_t, handle, addr) = start_service();
    let resp = send_request(
        &addr,
        "GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    let (status, body) = parse_response(&resp);
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    handle.stop();
}

#[test]
fn test_unknown_path_is_404() {
    let (_t, handle, addr) = start_service();
    let resp = send_request(
        &addr,
        "GET /nope HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    let (status, body) = parse_response(&resp);
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["path"], "/nope");
    handle.stop();
}

#[test]
fn test_session_cookie_round_trip_over_http() {
    let (_t, handle, addr) = start_service();

    let resp = send_request(
        &addr,
        "GET /session/ HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    let (status, body) = parse_response(&resp);
    assert_eq!(status, 200);
    assert_eq!(body["visits"], 1);

    let set_cookie = response_header(&resp, "Set-Cookie").expect("Set-Cookie header");
    let cookie = set_cookie.split(';').next().unwrap();
    assert!(cookie.starts_with("session="));

    let req = format!(
        "GET /session/ HTTP/1.1\r\nHost: localhost\r\nCookie: {cookie}\r\nConnection: close\r\n\r\n"
    );
    let resp = send_request(&addr, &req);
    let (status, body) = parse_response(&resp);
    assert_eq!(status, 200);
    assert_eq!(body["visits"], 2);

    handle.stop();
}

#[test]
fn test_logout_clears_cookie_over_http() {
    let (_t, handle, addr) = start_service();

    let resp = send_request(
        &addr,
        "GET /session/ HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    let set_cookie = response_header(&resp, "Set-Cookie").expect("Set-Cookie header");
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    let req = format!(
        "POST /session/logout HTTP/1.1\r\nHost: localhost\r\nCookie: {cookie}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
    );
    let resp = send_request(&addr, &req);
    let (status, body) = parse_response(&resp);
    assert_eq!(status, 200);
    assert_eq!(body["ok"], true);
    let cleared = response_header(&resp, "Set-Cookie").expect("clearing Set-Cookie header");
    assert!(cleared.contains("session="));
    assert!(cleared.contains("Max-Age=0"));

    handle.stop();
}

#[test]
fn test_tampered_cookie_starts_fresh_over_http() {
    let (_t, handle, addr) = start_service();

    let resp = send_request(
        &addr,
        "GET /session/ HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    let set_cookie = response_header(&resp, "Set-Cookie").expect("Set-Cookie header");
    let value = set_cookie
        .split(';')
        .next()
        .unwrap()
        .trim_start_matches("session=");

    // flip the first character of the cookie value
    let mut chars: Vec<char> = value.chars().collect();
    chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
    let tampered: String = chars.into_iter().collect();

    let req = format!(
        "GET /session/ HTTP/1.1\r\nHost: localhost\r\nCookie: session={tampered}\r\nConnection: close\r\n\r\n"
    );
    let resp = send_request(&addr, &req);
    let (status, body) = parse_response(&resp);
    assert_eq!(status, 200);
    assert_eq!(body["visits"], 1);

    handle.stop();
}

#[test]
fn test_metrics_endpoint_reports_counters() {
    let (_t, handle, addr) = start_service();

    send_request(
        &addr,
        "GET /session/ HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    let resp = send_request(
        &addr,
        "GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    let (status, _) = parse_response(&resp);
    assert_eq!(status, 200);
    assert!(resp.contains("waypost_requests_total"));

    handle.stop();
}
