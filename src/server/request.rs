use may_minihttp::Request;
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, info};

/// Parsed HTTP request data used by `AppService`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRequest {
    /// HTTP method (GET, POST, ...).
    pub method: String,
    /// Request path without the query string.
    pub path: String,
    /// Headers with lowercase names.
    pub headers: HashMap<String, String>,
    /// Cookies from the `Cookie` header.
    pub cookies: HashMap<String, String>,
    /// Decoded query-string parameters.
    pub query_params: HashMap<String, String>,
    /// Body parsed as JSON, when it is JSON.
    pub body: Option<serde_json::Value>,
    /// Raw body text, kept for form decoding.
    pub body_text: Option<String>,
}

/// Split a `Cookie` header into name/value pairs.
#[must_use]
pub fn parse_cookies(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .get("cookie")
        .map(|header| {
            header
                .split(';')
                .filter_map(|pair| {
                    let mut parts = pair.trim().splitn(2, '=');
                    let name = parts.next()?.trim();
                    if name.is_empty() {
                        return None;
                    }
                    let value = parts.next().unwrap_or("").trim();
                    Some((name.to_string(), value.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Decode query-string parameters from a raw request path.
#[must_use]
pub fn parse_query_params(raw_path: &str) -> HashMap<String, String> {
    match raw_path.find('?') {
        Some(pos) => url::form_urlencoded::parse(raw_path[pos + 1..].as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        None => HashMap::new(),
    }
}

/// Extract everything `AppService` needs from a raw `may_minihttp` request.
pub fn parse_request(req: Request) -> ParsedRequest {
    let method = req.method().to_string();
    let raw_path = req.path().to_string();
    let path = raw_path.split('?').next().unwrap_or("/").to_string();

    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .map(|h| {
            (
                h.name.to_ascii_lowercase(),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect();

    let cookies = parse_cookies(&headers);
    let query_params = parse_query_params(&raw_path);
    debug!(
        header_count = headers.len(),
        cookie_count = cookies.len(),
        query_count = query_params.len(),
        "request metadata extracted"
    );

    let mut body_text = None;
    let mut body = None;
    let mut buf = String::new();
    if let Ok(size) = req.body().read_to_string(&mut buf) {
        if size > 0 {
            body = serde_json::from_str(&buf).ok();
            body_text = Some(buf);
        }
    }

    info!(
        method = %method,
        path = %path,
        has_body = body_text.is_some(),
        "HTTP request parsed"
    );

    ParsedRequest {
        method,
        path,
        headers,
        cookies,
        query_params,
        body,
        body_text,
    }
}
