//! Habitflux - Deterministic analytics engine for daily habit completion data
//!
//! Habitflux turns a read-only list of habits and their daily completion
//! records into derived statistics: pairwise correlations, productivity
//! patterns, per-habit insights and a comparative 0-100 score.
//!
//! Every operation is pure and takes an explicit reference time, so results are
//! reproducible for a fixed "now".
//!
//! ## Modules
//!
//! - **Series**: completion series, weekly grouping and streak detection
//! - **Analyzers**: correlation, patterns, insights and comparative scoring
//! - **Engine**: the public entry points and the configurable `HabitAnalytics` service

pub mod adapter;
pub mod comparative;
pub mod config;
pub mod correlation;
pub mod engine;
pub mod error;
pub mod insights;
pub mod logging;
pub mod patterns;
pub mod series;
pub mod stats;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use adapter::{HabitAdapter, ValidationReport};
pub use config::AnalyticsConfig;
pub use engine::{
    calculate_habit_correlations, detect_productivity_patterns, generate_comparative_analytics,
    generate_habit_insights, HabitAnalytics,
};
pub use error::AnalyticsError;
pub use types::{
    AnalyticsReport, ComparativeAnalytics, Completion, Habit, HabitCorrelation, HabitInsight,
    HabitMetrics, ProductivityPattern, Streak, Timeframe,
};

/// Habitflux version embedded in every report
pub const HABITFLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "habitflux";
