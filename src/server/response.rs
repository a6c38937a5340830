use may_minihttp::Response;
use serde_json::Value;

use crate::dispatcher::HandlerResponse;

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

// may_minihttp headers borrow for the connection lifetime, so dynamic
// values have to be leaked. Set-Cookie and Content-Type lines are small
// and bounded per request.
fn push_header(res: &mut Response, name: &str, value: &str) {
    let line = format!("{name}: {value}").into_boxed_str();
    res.header(Box::leak(line));
}

/// Write a dispatcher response: status, headers, Set-Cookie lines, body.
pub fn write_handler_response(res: &mut Response, hr: HandlerResponse) {
    res.status_code(hr.status as usize, status_reason(hr.status));
    for (name, value) in &hr.headers {
        push_header(res, name, value);
    }
    for cookie in &hr.set_cookies {
        push_header(res, "Set-Cookie", cookie);
    }
    res.body_vec(hr.body);
}

/// Write a JSON error body directly, bypassing the dispatcher.
pub fn write_json_error(res: &mut Response, status: u16, body: Value) {
    res.status_code(status as usize, status_reason(status));
    res.header("Content-Type: application/json");
    res.body_vec(body.to_string().into_bytes());
}
