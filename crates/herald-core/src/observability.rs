//! Logging setup.

use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Build the log filter: `RUST_LOG` wins, then `default_level`, then `info`.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber: compact lines on stderr with RFC 3339
/// UTC timestamps. Calling it again is a no-op.
pub fn init(default_level: &str) {
    let layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_timer(ChronoUtc::rfc_3339())
        .with_filter(env_filter(default_level));

    // Err only means a subscriber is already installed.
    let _ = tracing_subscriber::registry().with(layer).try_init();
}
