//! HTTP transport glue over `may_minihttp`.
//!
//! The transport supplies verbs, paths, headers, body streams, and cookie
//! primitives; everything here converts between that surface and the
//! router/dispatcher types. One coroutine serves each in-flight request.

mod http_server;
mod request;
mod response;
mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_cookies, parse_query_params, parse_request, ParsedRequest};
pub use response::{write_handler_response, write_json_error};
pub use service::AppService;
