use clap::Parser;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use waypost::config::{RuntimeConfig, SessionConfig};
use waypost::dispatcher::Dispatcher;
use waypost::middleware::{MetricsMiddleware, Middleware, TracingMiddleware};
use waypost::router::{HandlerSet, Router};
use waypost::server::{AppService, HttpServer};

/// Demo server: a cookie-backed visit counter.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Address to bind the HTTP server to.
    #[arg(long, default_value = "0.0.0.0:8080")]
    addr: String,

    /// Secret key for signing session cookies.
    #[arg(long, env = "WAYPOST_SECRET")]
    secret: String,
}

fn visit_handler() -> HandlerSet {
    HandlerSet::new()
        .operation("Get", |ctx| {
            let session = ctx.session()?;
            let visits = session
                .get("visits")
                .and_then(serde_json::Value::as_i64)
                .unwrap_or(0)
                + 1;
            session.insert("visits".to_string(), json!(visits));
            ctx.json_response(&json!({ "visits": visits }))
        })
        .operation("LogoutPost", |ctx| {
            ctx.session()?.clear();
            ctx.json_response(&json!({ "ok": true }))
        })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let runtime = RuntimeConfig::from_env();
    may::config().set_stack_size(runtime.stack_size);

    let metrics = Arc::new(MetricsMiddleware::new());
    let middlewares: Vec<Arc<dyn Middleware>> = vec![
        Arc::new(TracingMiddleware),
        Arc::clone(&metrics) as Arc<dyn Middleware>,
    ];

    let mut router = Router::new();
    router.handle("/session/", visit_handler(), middlewares);
    router.dump_routes();

    let config = Arc::new(SessionConfig::new(cli.secret));
    let dispatcher = Arc::new(Dispatcher::new(config));
    let mut service = AppService::new(Arc::new(router), dispatcher);
    service.set_metrics_middleware(metrics);

    info!(addr = %cli.addr, stack_size = runtime.stack_size, "starting server");
    let handle = HttpServer(service).start(&cli.addr)?;
    handle
        .join()
        .map_err(|_| anyhow::anyhow!("server coroutine panicked"))?;
    Ok(())
}
