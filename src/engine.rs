//! Engine entry points
//!
//! This module provides the public API for Habitflux: four stateless
//! operations that take an explicit reference time, and `HabitAnalytics`, a
//! configurable service that can pin "now" for reproducible runs.

use crate::comparative::ComparativeScorer;
use crate::config::AnalyticsConfig;
use crate::correlation::CorrelationAnalyzer;
use crate::insights::InsightGenerator;
use crate::patterns::PatternDetector;
use crate::series::AnalysisWindow;
use crate::types::{
    AnalyticsReport, ComparativeAnalytics, Habit, HabitCorrelation, HabitInsight,
    ProductivityPattern, Timeframe,
};
use crate::{HABITFLUX_VERSION, PRODUCER_NAME};
use chrono::{DateTime, Utc};
use tracing::info;

/// Correlate every habit pair over the last `lookback_days` days.
///
/// # Example
/// ```ignore
/// let correlations = calculate_habit_correlations(&habits, 30, Utc::now());
/// ```
pub fn calculate_habit_correlations(
    habits: &[Habit],
    lookback_days: u32,
    now: DateTime<Utc>,
) -> Vec<HabitCorrelation> {
    HabitAnalytics::new()
        .at(now)
        .correlations(habits, lookback_days)
}

/// Detect productivity patterns over the last `lookback_days` days.
pub fn detect_productivity_patterns(
    habits: &[Habit],
    lookback_days: u32,
    now: DateTime<Utc>,
) -> Vec<ProductivityPattern> {
    HabitAnalytics::new().at(now).patterns(habits, lookback_days)
}

/// Generate per-habit insights over the last `lookback_days` days.
pub fn generate_habit_insights(
    habits: &[Habit],
    lookback_days: u32,
    now: DateTime<Utc>,
) -> Vec<HabitInsight> {
    HabitAnalytics::new().at(now).insights(habits, lookback_days)
}

/// Score and rank every habit for a timeframe.
pub fn generate_comparative_analytics(
    habits: &[Habit],
    timeframe: Timeframe,
    now: DateTime<Utc>,
) -> ComparativeAnalytics {
    HabitAnalytics::new().at(now).comparative(habits, timeframe)
}

/// Configurable analytics service.
///
/// Holds no analysis state: every call recomputes from the habits it is given.
/// Without a pinned reference time each call reads the system clock.
#[derive(Debug, Clone, Default)]
pub struct HabitAnalytics {
    config: AnalyticsConfig,
    now: Option<DateTime<Utc>>,
}

impl HabitAnalytics {
    /// Create a service with default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a service with custom configuration
    pub fn with_config(config: AnalyticsConfig) -> Self {
        Self { config, now: None }
    }

    /// Pin the reference time used by every subsequent call
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Reference time for the next analysis
    pub fn reference_time(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    fn window(&self, lookback_days: u32) -> AnalysisWindow {
        AnalysisWindow::new(self.reference_time(), lookback_days)
    }

    pub fn correlations(&self, habits: &[Habit], lookback_days: u32) -> Vec<HabitCorrelation> {
        CorrelationAnalyzer::analyze(habits, &self.window(lookback_days), &self.config.thresholds)
    }

    pub fn patterns(&self, habits: &[Habit], lookback_days: u32) -> Vec<ProductivityPattern> {
        PatternDetector::detect(habits, &self.window(lookback_days), &self.config.thresholds)
    }

    pub fn insights(&self, habits: &[Habit], lookback_days: u32) -> Vec<HabitInsight> {
        InsightGenerator::generate(habits, &self.window(lookback_days), &self.config.thresholds)
    }

    pub fn comparative(&self, habits: &[Habit], timeframe: Timeframe) -> ComparativeAnalytics {
        ComparativeScorer::score(habits, timeframe, self.reference_time())
    }

    /// Run all four analyses for one timeframe.
    ///
    /// The reference time is read once so every section agrees on "now".
    pub fn report(&self, habits: &[Habit], timeframe: Timeframe) -> AnalyticsReport {
        let pinned = self.clone().at(self.reference_time());
        let now = pinned.reference_time();
        let days = timeframe.lookback_days();

        let report = AnalyticsReport {
            producer: PRODUCER_NAME.to_string(),
            version: HABITFLUX_VERSION.to_string(),
            generated_at: now,
            timeframe,
            habit_count: habits.len(),
            correlations: pinned.correlations(habits, days),
            patterns: pinned.patterns(habits, days),
            insights: pinned.insights(habits, days),
            comparative: pinned.comparative(habits, timeframe),
        };

        info!(
            habits = report.habit_count,
            correlations = report.correlations.len(),
            patterns = report.patterns.len(),
            insights = report.insights.len(),
            timeframe = %timeframe,
            "Built analytics report"
        );

        report
    }

    /// Report for the configured default timeframe
    pub fn default_report(&self, habits: &[Habit]) -> AnalyticsReport {
        self.report(habits, self.config.default_timeframe)
    }
}
