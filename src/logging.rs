//! Logging setup
//!
//! The library only emits `tracing` events. Binaries call [`init`] to install
//! a subscriber that writes to stderr, keeping stdout free for JSON output.

use crate::config::LoggingConfig;
use crate::error::{AnalyticsError, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| AnalyticsError::ConfigError(format!("Invalid log level: {e}")))?;

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| AnalyticsError::ConfigError(format!("Logging already initialized: {e}")))?;

    tracing::debug!(level = %config.level, "Logging initialized");
    Ok(())
}

/// Initialize logging for tests (captured by the test harness)
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
