//! Log subscriber setup
//!
//! Logs go to stderr so answers printed on stdout stay clean. `RUST_LOG`
//! takes precedence over the level passed in.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG`, or `level` when unset or invalid
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(level: &str) {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(stderr_layer)
        .try_init();
}
