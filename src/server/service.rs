use super::request::parse_request;
use super::response::{write_handler_response, write_json_error};
use crate::dispatcher::Dispatcher;
use crate::middleware::MetricsMiddleware;
use crate::router::Router;
use http::Method;
use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use std::io;
use std::sync::Arc;

/// Per-connection HTTP service wiring the router and dispatcher together.
///
/// Cloned by the server for each connection; the shared pieces are behind
/// `Arc` and read-only after startup, so clones are cheap and lock-free.
#[derive(Clone)]
pub struct AppService {
    pub router: Arc<Router>,
    pub dispatcher: Arc<Dispatcher>,
    pub metrics: Option<Arc<MetricsMiddleware>>,
}

impl AppService {
    #[must_use]
    pub fn new(router: Arc<Router>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            router,
            dispatcher,
            metrics: None,
        }
    }

    /// Expose shared metrics at `GET /metrics`.
    pub fn set_metrics_middleware(&mut self, metrics: Arc<MetricsMiddleware>) {
        self.metrics = Some(metrics);
    }
}

/// Basic health check endpoint returning `{ "status": "ok" }`.
fn health_endpoint(res: &mut Response) -> io::Result<()> {
    res.status_code(200, "OK");
    res.header("Content-Type: application/json");
    res.body_vec(json!({ "status": "ok" }).to_string().into_bytes());
    Ok(())
}

/// Metrics endpoint returning Prometheus text format statistics.
fn metrics_endpoint(res: &mut Response, metrics: &MetricsMiddleware) -> io::Result<()> {
    let body = format!(
        "# HELP waypost_requests_total Total number of handled requests\n\
         # TYPE waypost_requests_total counter\n\
         waypost_requests_total {}\n\
         # HELP waypost_requests_rejected_total Requests answered with 4xx/5xx\n\
         # TYPE waypost_requests_rejected_total counter\n\
         waypost_requests_rejected_total {}\n\
         # HELP waypost_request_latency_seconds Average request latency in seconds\n\
         # TYPE waypost_request_latency_seconds gauge\n\
         waypost_request_latency_seconds {}\n",
        metrics.request_count(),
        metrics.rejected_count(),
        metrics.average_latency().as_secs_f64(),
    );
    res.status_code(200, "OK");
    res.header("Content-Type: text/plain; charset=utf-8");
    res.body_vec(body.into_bytes());
    Ok(())
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let parsed = parse_request(req);

        if parsed.method == "GET" && parsed.path == "/health" {
            return health_endpoint(res);
        }
        if parsed.method == "GET" && parsed.path == "/metrics" {
            if let Some(metrics) = &self.metrics {
                return metrics_endpoint(res, metrics);
            }
            write_json_error(res, 404, json!({ "error": "Not Found" }));
            return Ok(());
        }

        let method = match parsed.method.parse::<Method>() {
            Ok(m) => m,
            Err(_) => {
                write_json_error(res, 400, json!({ "error": "Unsupported method" }));
                return Ok(());
            }
        };

        match self.router.route(&method, &parsed.path) {
            Some(route) => {
                let hr = self.dispatcher.dispatch(&route, parsed);
                write_handler_response(res, hr);
            }
            None => {
                write_json_error(
                    res,
                    404,
                    json!({
                        "error": "Not Found",
                        "method": parsed.method,
                        "path": parsed.path
                    }),
                );
            }
        }
        Ok(())
    }
}
