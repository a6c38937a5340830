use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

/// Scoped tracing subscriber for tests.
///
/// Installs a thread-local fmt subscriber that routes through the libtest
/// capture writer, so log output only shows for failing tests. Dropping the
/// guard restores the previous subscriber.
pub struct TestTracing {
    _guard: DefaultGuard,
}

impl TestTracing {
    pub fn init() -> Self {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
            .with_test_writer()
            .finish();
        Self {
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }
}
