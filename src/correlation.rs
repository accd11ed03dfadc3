//! Habit correlation analysis
//!
//! Pairs of habits are compared on the dates both have a record for. Each
//! shared date contributes a binary (completed A, completed B) observation and
//! Pearson's r is computed over those observations.

use crate::config::Thresholds;
use crate::series::{completion_series, AnalysisWindow};
use crate::stats::{confidence_level, pearson_correlation, round_to};
use crate::types::{Habit, HabitCorrelation, Relationship, SeriesPoint, Significance};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::debug;

/// Correlation analyzer over habit pairs
pub struct CorrelationAnalyzer;

impl CorrelationAnalyzer {
    /// Correlate every unordered habit pair.
    ///
    /// Pairs with fewer shared dates than `min_correlation_samples` are left
    /// out. The result is sorted by |coefficient|, strongest first.
    pub fn analyze(
        habits: &[Habit],
        window: &AnalysisWindow,
        thresholds: &Thresholds,
    ) -> Vec<HabitCorrelation> {
        let series: Vec<Vec<SeriesPoint>> = habits
            .iter()
            .map(|h| completion_series(h, window))
            .collect();

        let mut correlations = Vec::new();
        for i in 0..habits.len() {
            for j in (i + 1)..habits.len() {
                if let Some(correlation) = correlate_series(
                    &habits[i],
                    &series[i],
                    &habits[j],
                    &series[j],
                    thresholds.min_correlation_samples,
                ) {
                    correlations.push(correlation);
                }
            }
        }

        correlations.sort_by(|a, b| b.coefficient.abs().total_cmp(&a.coefficient.abs()));

        debug!(
            habits = habits.len(),
            correlations = correlations.len(),
            lookback_days = window.lookback_days(),
            "Computed habit correlations"
        );

        correlations
    }

    /// Correlate a single pair, or `None` when they share too few dates
    pub fn correlate_pair(
        first: &Habit,
        second: &Habit,
        window: &AnalysisWindow,
        thresholds: &Thresholds,
    ) -> Option<HabitCorrelation> {
        correlate_series(
            first,
            &completion_series(first, window),
            second,
            &completion_series(second, window),
            thresholds.min_correlation_samples,
        )
    }
}

/// Binary observations on the dates present in both series, in date order
fn shared_observations(first: &[SeriesPoint], second: &[SeriesPoint]) -> (Vec<f64>, Vec<f64>) {
    let lookup: HashMap<NaiveDate, bool> = second.iter().map(|p| (p.date, p.completed)).collect();

    first
        .iter()
        .filter_map(|p| {
            lookup
                .get(&p.date)
                .map(|&other| (indicator(p.completed), indicator(other)))
        })
        .unzip()
}

fn indicator(completed: bool) -> f64 {
    if completed {
        1.0
    } else {
        0.0
    }
}

fn correlate_series(
    first: &Habit,
    first_series: &[SeriesPoint],
    second: &Habit,
    second_series: &[SeriesPoint],
    min_samples: usize,
) -> Option<HabitCorrelation> {
    let (x, y) = shared_observations(first_series, second_series);
    let sample_size = x.len();

    if sample_size < min_samples {
        return None;
    }

    let r = pearson_correlation(&x, &y);
    let (coefficient, significance, relationship) = classify(r);

    Some(HabitCorrelation {
        habit1_id: first.id.clone(),
        habit1_name: first.name.clone(),
        habit2_id: second.id.clone(),
        habit2_name: second.name.clone(),
        coefficient,
        significance,
        relationship,
        sample_size,
        confidence_level: round_to(confidence_level(r, sample_size), 2),
    })
}

/// Round r to the reported precision and bucket the rounded value, so the
/// labels always agree with the published coefficient
fn classify(r: f64) -> (f64, Significance, Relationship) {
    let coefficient = round_to(r, 3);
    (
        coefficient,
        Significance::from_coefficient(coefficient),
        Relationship::from_coefficient(coefficient),
    )
}
