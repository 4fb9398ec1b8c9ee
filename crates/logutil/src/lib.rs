//! Utilities for logging.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG` when set, otherwise falls back to the provided
/// default level. Safe to call more than once; later calls are no-ops.
pub fn init(default_level: tracing::Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// Initialize a subscriber for tests, writing through the test
/// harness's captured output.
pub fn init_test() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::DEBUG.to_string()));
    let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
}
