//! Comparative habit scoring
//!
//! Each habit gets a composite 0-100 score for the selected timeframe:
//!
//! ```text
//! score = completion_rate        * 40
//!       + consistency            * 30
//!       + min(streak_avg / 10, 1) * 20
//!       + (trend + 1) / 2        * 10
//! ```
//!
//! where consistency is 1 minus the population variance of weekly completion
//! rates and trend is the weekly least-squares slope.

use crate::series::{
    average_streak_length, completion_rate, completion_series, find_streaks, weekly_rates,
    AnalysisWindow,
};
use crate::stats::{linear_trend, population_variance};
use crate::types::{ComparativeAnalytics, Habit, HabitMetrics, Timeframe, TrendDirection};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Habits scoring below this need attention
const ATTENTION_SCORE: u32 = 50;

/// Comparative scorer
pub struct ComparativeScorer;

impl ComparativeScorer {
    /// Score every habit for `timeframe` and summarize the results
    pub fn score(habits: &[Habit], timeframe: Timeframe, now: DateTime<Utc>) -> ComparativeAnalytics {
        let window = AnalysisWindow::new(now, timeframe.lookback_days());
        let metrics: Vec<HabitMetrics> = habits.iter().map(|h| habit_metrics(h, &window)).collect();

        let mut top: Option<&HabitMetrics> = None;
        for m in &metrics {
            if top.map_or(true, |best| m.score > best.score) {
                top = Some(m);
            }
        }

        let needs_attention: Vec<String> = metrics
            .iter()
            .filter(|m| m.score < ATTENTION_SCORE || m.trend == TrendDirection::Declining)
            .map(|m| m.habit_id.clone())
            .collect();

        let overall_score = if metrics.is_empty() {
            0
        } else {
            let total: u32 = metrics.iter().map(|m| m.score).sum();
            (f64::from(total) / metrics.len() as f64).round() as u32
        };

        let insights = summary_insights(&metrics, top, &needs_attention, overall_score, timeframe);
        let top_performer = top.map(|m| m.habit_id.clone());

        debug!(
            habits = metrics.len(),
            overall_score,
            timeframe = %timeframe,
            "Generated comparative analytics"
        );

        ComparativeAnalytics {
            timeframe,
            habits: metrics,
            top_performer,
            needs_attention,
            overall_score,
            insights,
        }
    }
}

/// Metrics and composite score for one habit within the window
pub fn habit_metrics(habit: &Habit, window: &AnalysisWindow) -> HabitMetrics {
    let series = completion_series(habit, window);
    let rate = completion_rate(&series);
    let streak_average = average_streak_length(&find_streaks(&series));

    let rates = weekly_rates(&series);
    let consistency = if rates.len() >= 2 {
        1.0 - population_variance(&rates)
    } else {
        rate
    };
    let slope = linear_trend(&rates);

    HabitMetrics {
        habit_id: habit.id.clone(),
        habit_name: habit.name.clone(),
        completion_rate: rate,
        streak_average,
        consistency,
        trend: TrendDirection::from_slope(slope),
        trend_slope: slope,
        score: composite_score(rate, consistency, streak_average, slope),
    }
}

/// Weighted 0-100 composite of the four habit metrics
pub fn composite_score(completion_rate: f64, consistency: f64, streak_average: f64, trend: f64) -> u32 {
    let raw = completion_rate * 40.0
        + consistency * 30.0
        + (streak_average / 10.0).min(1.0) * 20.0
        + (trend + 1.0) / 2.0 * 10.0;

    raw.round().clamp(0.0, 100.0) as u32
}

fn summary_insights(
    metrics: &[HabitMetrics],
    top: Option<&HabitMetrics>,
    needs_attention: &[String],
    overall_score: u32,
    timeframe: Timeframe,
) -> Vec<String> {
    if metrics.is_empty() {
        return vec![format!("No habits to compare for the past {}", timeframe)];
    }

    let mut insights = vec![format!(
        "Overall score for the past {}: {}/100",
        timeframe, overall_score
    )];

    if let Some(best) = top {
        insights.push(format!(
            "{} is your top performer with a score of {}",
            best.habit_name, best.score
        ));
    }

    if needs_attention.is_empty() {
        insights.push("All habits are on track".to_string());
    } else {
        let names: Vec<&str> = metrics
            .iter()
            .filter(|m| needs_attention.contains(&m.habit_id))
            .map(|m| m.habit_name.as_str())
            .collect();
        insights.push(format!(
            "{} habit{} need{} attention: {}",
            names.len(),
            if names.len() == 1 { "" } else { "s" },
            if names.len() == 1 { "s" } else { "" },
            names.join(", ")
        ));
    }

    let improving = metrics
        .iter()
        .filter(|m| m.trend == TrendDirection::Improving)
        .count();
    if improving > 0 {
        insights.push(format!(
            "{} habit{} trending upward",
            improving,
            if improving == 1 { " is" } else { "s are" }
        ));
    }

    insights
}
