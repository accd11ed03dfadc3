//! Core types for the Habitflux engine
//!
//! This module defines the habit data consumed by the engine, the derived
//! series/streak values shared by the analyzers, and the analytical results
//! handed back to the dashboard.

use crate::error::AnalyticsError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single daily completion record, as written by the storage layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    /// Calendar date (YYYY-MM-DD)
    pub date: String,
    /// Whether the habit was performed that day
    pub completed: bool,
    /// When the record was written, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Completion {
    pub fn new(date: impl Into<String>, completed: bool) -> Self {
        Self {
            date: date.into(),
            completed,
            timestamp: None,
        }
    }
}

/// A tracked habit with its completion history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Completion records in any order
    #[serde(default)]
    pub completions: Vec<Completion>,
}

impl Habit {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            completions: Vec::new(),
        }
    }

    /// Builder-style helper to attach completions
    pub fn with_completions(mut self, completions: Vec<Completion>) -> Self {
        self.completions = completions;
        self
    }
}

/// One entry of a date-ascending completion series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub completed: bool,
}

/// A maximal run of two or more consecutive completed days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub length: u32,
}

/// Strength bucket of a correlation coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    High,
    Moderate,
    Low,
    None,
}

impl Significance {
    pub fn from_coefficient(r: f64) -> Self {
        let abs_r = r.abs();
        if abs_r >= 0.7 {
            Significance::High
        } else if abs_r >= 0.5 {
            Significance::Moderate
        } else if abs_r >= 0.3 {
            Significance::Low
        } else {
            Significance::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Significance::High => "high",
            Significance::Moderate => "moderate",
            Significance::Low => "low",
            Significance::None => "none",
        }
    }
}

/// Direction of a correlation, with a dead zone around zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    Positive,
    Negative,
    Neutral,
}

impl Relationship {
    pub fn from_coefficient(r: f64) -> Self {
        if r > 0.1 {
            Relationship::Positive
        } else if r < -0.1 {
            Relationship::Negative
        } else {
            Relationship::Neutral
        }
    }
}

/// Pearson correlation between two habits on their shared dates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitCorrelation {
    pub habit1_id: String,
    pub habit1_name: String,
    pub habit2_id: String,
    pub habit2_name: String,
    /// Pearson r, rounded to 3 decimals
    pub coefficient: f64,
    pub significance: Significance,
    pub relationship: Relationship,
    /// Number of shared dates
    pub sample_size: usize,
    /// Approximate confidence level (0.50 - 0.99)
    pub confidence_level: f64,
}

/// Time scale a productivity pattern operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Daily,
    Weekly,
    Monthly,
    Seasonal,
}

/// Impact bucket shared by patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    High,
    Medium,
    Low,
}

/// A detected productivity pattern across one or more habits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityPattern {
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    /// Machine-readable key, e.g. `high_performance_monday`
    pub pattern: String,
    pub description: String,
    pub habits_involved: Vec<String>,
    /// Strength (0-1)
    pub strength: f64,
    /// Number of occurrences backing the pattern
    pub frequency: usize,
    pub impact: Impact,
    pub recommendation: String,
}

/// Kind of per-habit insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    StreakPrediction,
    OptimalTiming,
    CompletionTrend,
    DifficultyAnalysis,
}

/// A natural-language insight about a single habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitInsight {
    pub habit_id: String,
    pub habit_name: String,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub insight: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    /// Confidence (0-1)
    pub confidence: f64,
    pub data_points: usize,
    pub actionable: bool,
}

/// Bucketed direction of a weekly-rate trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

impl TrendDirection {
    pub fn from_slope(slope: f64) -> Self {
        if slope > 0.05 {
            TrendDirection::Improving
        } else if slope < -0.05 {
            TrendDirection::Declining
        } else {
            TrendDirection::Stable
        }
    }
}

/// Analysis window selectable from the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl Timeframe {
    /// Lookback window in days
    pub fn lookback_days(&self) -> u32 {
        match self {
            Timeframe::Week => 7,
            Timeframe::Month => 30,
            Timeframe::Quarter => 90,
            Timeframe::Year => 365,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Week => "week",
            Timeframe::Month => "month",
            Timeframe::Quarter => "quarter",
            Timeframe::Year => "year",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(Timeframe::Week),
            "month" => Ok(Timeframe::Month),
            "quarter" => Ok(Timeframe::Quarter),
            "year" => Ok(Timeframe::Year),
            other => Err(AnalyticsError::InvalidTimeframe(other.to_string())),
        }
    }
}

/// Per-habit metrics within one timeframe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitMetrics {
    pub habit_id: String,
    pub habit_name: String,
    /// Completed / total records in the window (0-1)
    pub completion_rate: f64,
    /// Mean streak length, 0 when there are no streaks
    pub streak_average: f64,
    /// 1 - population variance of weekly rates
    pub consistency: f64,
    pub trend: TrendDirection,
    /// Raw OLS slope behind `trend`
    pub trend_slope: f64,
    /// Composite score (0-100)
    pub score: u32,
}

/// Comparative snapshot of every habit for one timeframe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparativeAnalytics {
    pub timeframe: Timeframe,
    pub habits: Vec<HabitMetrics>,
    pub top_performer: Option<String>,
    pub needs_attention: Vec<String>,
    pub overall_score: u32,
    pub insights: Vec<String>,
}

/// Everything the dashboard renders for one timeframe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub producer: String,
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub timeframe: Timeframe,
    pub habit_count: usize,
    pub correlations: Vec<HabitCorrelation>,
    pub patterns: Vec<ProductivityPattern>,
    pub insights: Vec<HabitInsight>,
    pub comparative: ComparativeAnalytics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_significance_thresholds() {
        assert_eq!(Significance::from_coefficient(0.7), Significance::High);
        assert_eq!(Significance::from_coefficient(-0.85), Significance::High);
        assert_eq!(Significance::from_coefficient(0.5), Significance::Moderate);
        assert_eq!(Significance::from_coefficient(-0.3), Significance::Low);
        assert_eq!(Significance::from_coefficient(0.29), Significance::None);
        assert_eq!(Significance::from_coefficient(0.0), Significance::None);
    }

    #[test]
    fn test_relationship_dead_zone() {
        assert_eq!(Relationship::from_coefficient(0.11), Relationship::Positive);
        assert_eq!(Relationship::from_coefficient(0.1), Relationship::Neutral);
        assert_eq!(Relationship::from_coefficient(-0.1), Relationship::Neutral);
        assert_eq!(Relationship::from_coefficient(-0.2), Relationship::Negative);
    }

    #[test]
    fn test_trend_direction_buckets() {
        assert_eq!(TrendDirection::from_slope(0.06), TrendDirection::Improving);
        assert_eq!(TrendDirection::from_slope(0.05), TrendDirection::Stable);
        assert_eq!(TrendDirection::from_slope(-0.05), TrendDirection::Stable);
        assert_eq!(TrendDirection::from_slope(-0.2), TrendDirection::Declining);
    }

    #[test]
    fn test_timeframe_parsing() {
        assert_eq!("week".parse::<Timeframe>().unwrap(), Timeframe::Week);
        assert_eq!("Quarter".parse::<Timeframe>().unwrap(), Timeframe::Quarter);
        assert_eq!(Timeframe::Year.lookback_days(), 365);
        assert_eq!(Timeframe::default().lookback_days(), 30);
        assert!("fortnight".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_habit_deserializes_storage_shape() {
        let json = r#"{
            "id": "h1",
            "name": "Read",
            "completions": [
                { "date": "2024-01-01", "completed": true },
                { "date": "2024-01-02", "completed": false, "timestamp": "2024-01-02T21:00:00Z" }
            ]
        }"#;
        let habit: Habit = serde_json::from_str(json).unwrap();
        assert_eq!(habit.completions.len(), 2);
        assert!(habit.completions[0].timestamp.is_none());
        assert!(habit.completions[1].timestamp.is_some());
    }

    #[test]
    fn test_output_enums_serialize_snake_case() {
        let insight = HabitInsight {
            habit_id: "h1".to_string(),
            habit_name: "Read".to_string(),
            insight_type: InsightType::CompletionTrend,
            insight: "text".to_string(),
            recommendation: None,
            confidence: 0.5,
            data_points: 4,
            actionable: false,
        };
        let value = serde_json::to_value(&insight).unwrap();
        assert_eq!(value["type"], "completion_trend");
        assert_eq!(value["habitId"], "h1");
        assert!(value.get("recommendation").is_none());
    }
}
