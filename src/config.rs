//! Engine configuration
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! standard thresholds. Config can be written as TOML or JSON:
//!
//! ```toml
//! default_timeframe = "quarter"
//!
//! [thresholds]
//! min_correlation_samples = 14
//!
//! [logging]
//! level = "debug"
//! ```

use crate::error::{AnalyticsError, Result};
use crate::types::Timeframe;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Timeframe used when the caller does not pick one
    #[serde(default)]
    pub default_timeframe: Timeframe,

    /// Minimum-data gates for each analysis
    #[serde(default)]
    pub thresholds: Thresholds,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Minimum amounts of data an analysis needs before it reports anything
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Shared dates required before a habit pair is correlated
    pub min_correlation_samples: usize,
    /// Dates with records from both habits required for a cluster pattern
    pub min_cluster_dates: usize,
    /// Co-completed dates required for a cluster pattern
    pub min_cluster_occurrences: usize,
    /// Records on one weekday required for a daily pattern
    pub min_daily_entries: usize,
    /// Calendar weeks required for trend patterns and insights
    pub min_trend_weeks: usize,
    /// Streaks required for a streak pattern
    pub min_streaks: usize,
    /// Records on the best weekday required for a timing insight
    pub min_best_day_entries: usize,
    /// Records required for a difficulty insight
    pub min_difficulty_records: usize,
    /// Most recent records examined by streak prediction
    pub prediction_window: usize,
    /// Records within the prediction window required for a prediction
    pub min_prediction_records: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_correlation_samples: 10,
            min_cluster_dates: 10,
            min_cluster_occurrences: 10,
            min_daily_entries: 10,
            min_trend_weeks: 4,
            min_streaks: 3,
            min_best_day_entries: 5,
            min_difficulty_records: 20,
            prediction_window: 14,
            min_prediction_records: 7,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (overridden by RUST_LOG)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl AnalyticsConfig {
    /// Load config from a file, picking the format from its extension.
    ///
    /// `.json` files are parsed as JSON, anything else as TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_toml(&content)
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AnalyticsError::ConfigError(e.to_string()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| AnalyticsError::ConfigError(e.to_string()))
    }
}
