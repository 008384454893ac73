// Tracing subscriber setup for the finboard binary.
use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_ONCE: OnceLock<()> = OnceLock::new();

/// Install the global fmt subscriber. `RUST_LOG` wins over `default_level`.
/// Safe to call more than once; only the first call has an effect.
pub fn init_logging(default_level: &str) {
    LOGGER_ONCE.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        // Results go to stdout, logs to stderr
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr)
            .with_filter(env_filter);

        // try_init: a test harness or embedding application may own the global subscriber
        let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
    });
}
