use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::Middleware;
use crate::dispatcher::{HandlerResponse, RequestContext};

/// Passive middleware tracking request counts and latency.
///
/// All counters use atomic operations, so one instance can be shared across
/// every request coroutine without locks. It never rejects a request.
#[derive(Default)]
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    rejected_count: AtomicUsize,
    total_latency_ns: AtomicU64,
}

impl MetricsMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total requests observed by `after`.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Requests answered with a 4xx/5xx status.
    #[must_use]
    pub fn rejected_count(&self) -> usize {
        self.rejected_count.load(Ordering::Relaxed)
    }

    /// Mean processing time across all observed requests; zero before the
    /// first request completes.
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }
}

impl Middleware for MetricsMiddleware {
    fn after(&self, _ctx: &RequestContext, res: &mut HandlerResponse, latency: Duration) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        if res.status >= 400 {
            self.rejected_count.fetch_add(1, Ordering::Relaxed);
        }
        self.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
    }
}
