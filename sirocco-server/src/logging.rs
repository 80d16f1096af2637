//! Structured logging initialization.

use sirocco_core::config::LoggingConfig;
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber.
///
/// The level comes from `RUST_LOG` when set, else from the config.
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = fmt().with_env_filter(filter).with_target(true);
    // A failed init means a subscriber is already installed (tests,
    // embedding); keep the existing one.
    let _ = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
