//! Error types for Habitflux
//!
//! The analyzers never fail: insufficient data yields empty results. These
//! errors only arise at the edges, when decoding input or loading config.

use thiserror::Error;

/// Errors that can occur while preparing data for analysis
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Failed to parse habit payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Unknown timeframe: {0} (expected week, month, quarter or year)")]
    InvalidTimeframe(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AnalyticsError>;
