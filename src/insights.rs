//! Per-habit insight generation
//!
//! Each habit goes through four independent analyses. An analysis that lacks
//! data simply produces no insight.

use crate::config::Thresholds;
use crate::series::{
    average_streak_length, completion_rate, completion_series, current_streak, day_of_week,
    find_streaks, weekly_rates, AnalysisWindow, DAY_NAMES,
};
use crate::stats::linear_trend;
use crate::types::{Habit, HabitInsight, InsightType, SeriesPoint};
use chrono::NaiveDate;
use tracing::debug;

/// Minimum |weekly slope| for a trend insight
const TREND_INSIGHT_THRESHOLD: f64 = 0.05;
/// Minimum gap between best and worst weekday rates for a timing insight
const TIMING_SPREAD_THRESHOLD: f64 = 0.3;
/// Weekdays with data required for a timing insight
const MIN_DISTINCT_WEEKDAYS: usize = 3;
/// Upper bound on computed confidences
const MAX_CONFIDENCE: f64 = 0.9;

/// Insight generator over a set of habits
pub struct InsightGenerator;

impl InsightGenerator {
    /// Generate insights for every habit, most confident first
    pub fn generate(
        habits: &[Habit],
        window: &AnalysisWindow,
        thresholds: &Thresholds,
    ) -> Vec<HabitInsight> {
        let mut insights = Vec::new();

        for habit in habits {
            let series = completion_series(habit, window);
            insights.extend(
                [
                    trend_insight(habit, &series, thresholds),
                    timing_insight(habit, &series, thresholds),
                    difficulty_insight(habit, &series, thresholds),
                    streak_prediction(habit, &series, window.today(), thresholds),
                ]
                .into_iter()
                .flatten(),
            );
        }

        insights.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        debug!(
            habits = habits.len(),
            insights = insights.len(),
            lookback_days = window.lookback_days(),
            "Generated habit insights"
        );

        insights
    }
}

fn trend_insight(
    habit: &Habit,
    series: &[SeriesPoint],
    thresholds: &Thresholds,
) -> Option<HabitInsight> {
    let rates = weekly_rates(series);
    if rates.len() < thresholds.min_trend_weeks {
        return None;
    }

    let trend = linear_trend(&rates);
    if trend.abs() < TREND_INSIGHT_THRESHOLD {
        return None;
    }

    let improving = trend > 0.0;
    let (insight, recommendation) = if improving {
        (
            format!(
                "{} is trending up: completion improves by {:.1}% per week",
                habit.name,
                trend * 100.0
            ),
            "Your consistency is building. Keep the same cue and time of day".to_string(),
        )
    } else {
        (
            format!(
                "{} is trending down: completion drops by {:.1}% per week",
                habit.name,
                trend.abs() * 100.0
            ),
            "Shrink the habit to a version you can do on your worst day and rebuild from there"
                .to_string(),
        )
    };

    Some(HabitInsight {
        habit_id: habit.id.clone(),
        habit_name: habit.name.clone(),
        insight_type: InsightType::CompletionTrend,
        insight,
        recommendation: Some(recommendation),
        confidence: (trend.abs() * 2.0).min(MAX_CONFIDENCE),
        data_points: rates.len(),
        actionable: !improving,
    })
}

fn timing_insight(
    habit: &Habit,
    series: &[SeriesPoint],
    thresholds: &Thresholds,
) -> Option<HabitInsight> {
    let mut days = [(0usize, 0usize); 7];
    for point in series {
        let day = &mut days[day_of_week(point.date)];
        day.1 += 1;
        if point.completed {
            day.0 += 1;
        }
    }

    let with_data: Vec<(usize, f64, usize)> = days
        .iter()
        .enumerate()
        .filter(|(_, (_, total))| *total > 0)
        .map(|(day, &(completed, total))| (day, completed as f64 / total as f64, total))
        .collect();

    if with_data.len() < MIN_DISTINCT_WEEKDAYS {
        return None;
    }

    let mut best = with_data[0];
    let mut worst = with_data[0];
    for &entry in &with_data[1..] {
        if entry.1 > best.1 {
            best = entry;
        }
        if entry.1 < worst.1 {
            worst = entry;
        }
    }

    if best.2 < thresholds.min_best_day_entries {
        return None;
    }

    let spread = best.1 - worst.1;
    if spread < TIMING_SPREAD_THRESHOLD {
        return None;
    }

    let (best_day, worst_day) = (DAY_NAMES[best.0], DAY_NAMES[worst.0]);

    Some(HabitInsight {
        habit_id: habit.id.clone(),
        habit_name: habit.name.clone(),
        insight_type: InsightType::OptimalTiming,
        insight: format!(
            "You complete {} most often on {}s ({:.0}%) and least often on {}s ({:.0}%)",
            habit.name,
            best_day,
            best.1 * 100.0,
            worst_day,
            worst.1 * 100.0
        ),
        recommendation: Some(format!(
            "Protect your {} routine on {}s and add a reminder for {}s",
            habit.name, best_day, worst_day
        )),
        confidence: (spread * 1.5).min(MAX_CONFIDENCE),
        data_points: series.len(),
        actionable: true,
    })
}

/// Difficulty buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Difficulty {
    Easy,
    Moderate,
    Challenging,
    Difficult,
}

impl Difficulty {
    fn classify(rate: f64, average_streak: f64) -> Self {
        if rate >= 0.8 && average_streak >= 7.0 {
            Difficulty::Easy
        } else if rate >= 0.6 && average_streak >= 4.0 {
            Difficulty::Moderate
        } else if rate >= 0.4 {
            Difficulty::Challenging
        } else {
            Difficulty::Difficult
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Moderate => "moderate",
            Difficulty::Challenging => "challenging",
            Difficulty::Difficult => "difficult",
        }
    }

    fn recommendation(&self) -> &'static str {
        match self {
            Difficulty::Easy => {
                "This habit is well established. Consider increasing the challenge or adding a related habit"
            }
            Difficulty::Moderate => {
                "You're making solid progress. Focus on never missing twice in a row"
            }
            Difficulty::Challenging => {
                "Break this habit into a smaller first step and tie it to an existing routine"
            }
            Difficulty::Difficult => {
                "Reassess the goal: reduce the target, change the time of day, or remove obstacles"
            }
        }
    }
}

fn difficulty_insight(
    habit: &Habit,
    series: &[SeriesPoint],
    thresholds: &Thresholds,
) -> Option<HabitInsight> {
    if series.len() < thresholds.min_difficulty_records {
        return None;
    }

    let rate = completion_rate(series);
    let average_streak = average_streak_length(&find_streaks(series));
    let difficulty = Difficulty::classify(rate, average_streak);

    Some(HabitInsight {
        habit_id: habit.id.clone(),
        habit_name: habit.name.clone(),
        insight_type: InsightType::DifficultyAnalysis,
        insight: format!(
            "{} looks {}: {:.0}% completion with streaks averaging {:.1} days",
            habit.name,
            difficulty.label(),
            rate * 100.0,
            average_streak
        ),
        recommendation: Some(difficulty.recommendation().to_string()),
        confidence: 0.8,
        data_points: series.len(),
        actionable: matches!(difficulty, Difficulty::Challenging | Difficulty::Difficult),
    })
}

fn streak_prediction(
    habit: &Habit,
    series: &[SeriesPoint],
    today: NaiveDate,
    thresholds: &Thresholds,
) -> Option<HabitInsight> {
    let recent = &series[series.len().saturating_sub(thresholds.prediction_window)..];
    if recent.len() < thresholds.min_prediction_records {
        return None;
    }

    let success = completion_rate(recent);
    let live = current_streak(series, today);
    let streak_note = if live > 0 {
        format!(" and a live streak of {} days", live)
    } else {
        String::new()
    };

    let (insight, recommendation, confidence, actionable) = if success >= 0.8 {
        (
            format!(
                "With {:.0}% success over your last {} records{}, {} is very likely to keep going",
                success * 100.0,
                recent.len(),
                streak_note,
                habit.name
            ),
            "Stay the course and plan ahead for disruptions like travel".to_string(),
            0.8,
            false,
        )
    } else if success >= 0.5 {
        (
            format!(
                "{} is holding steady at {:.0}% over your last {} records{}, but a streak is not yet secure",
                habit.name,
                success * 100.0,
                recent.len(),
                streak_note
            ),
            "Pick a fixed time of day for this habit to turn good weeks into a streak"
                .to_string(),
            0.6,
            true,
        )
    } else {
        (
            format!(
                "{} has slipped to {:.0}% over your last {} records; a new streak is unlikely without a change",
                habit.name,
                success * 100.0,
                recent.len()
            ),
            "Restart with a two-day goal and celebrate small wins".to_string(),
            0.7,
            true,
        )
    };

    Some(HabitInsight {
        habit_id: habit.id.clone(),
        habit_name: habit.name.clone(),
        insight_type: InsightType::StreakPrediction,
        insight,
        recommendation: Some(recommendation),
        confidence,
        data_points: recent.len(),
        actionable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Completion;
    use chrono::{Duration, TimeZone, Utc};

    /// Reference "now": Saturday 2024-03-02 at noon
    fn window() -> AnalysisWindow {
        AnalysisWindow::new(Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap(), 90)
    }

    /// Daily records ending on 2024-03-02
    fn habit(days: i64, completed: impl Fn(NaiveDate, i64) -> bool) -> Habit {
        let last = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let completions = (0..days)
            .map(|i| {
                let date = last - Duration::days(days - 1 - i);
                Completion::new(date.format("%Y-%m-%d").to_string(), completed(date, i))
            })
            .collect();
        Habit::new("h1", "Meditate").with_completions(completions)
    }

    fn insights_of(habit: &Habit, kind: InsightType) -> Vec<HabitInsight> {
        InsightGenerator::generate(std::slice::from_ref(habit), &window(), &Thresholds::default())
            .into_iter()
            .filter(|i| i.insight_type == kind)
            .collect()
    }

    #[test]
    fn test_trend_insight_improving() {
        // 28 days starting Sunday 2024-02-04; week k completes 2k+1 days
        let h = habit(28, |d, i| (day_of_week(d) as i64) < 2 * (i / 7) + 1);
        let trend = insights_of(&h, InsightType::CompletionTrend);
        assert_eq!(trend.len(), 1);
        assert!(!trend[0].actionable);
        assert_eq!(trend[0].data_points, 4);
        // rates 1/7, 3/7, 5/7, 1 -> slope 2/7, confidence 4/7
        assert!((trend[0].confidence - 4.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_trend_insight_declining() {
        // Week k completes 7 - 2k days: rates 1, 5/7, 3/7, 1/7
        let h = habit(28, |d, i| (day_of_week(d) as i64) < 7 - 2 * (i / 7));
        let trend = insights_of(&h, InsightType::CompletionTrend);
        assert_eq!(trend.len(), 1);
        assert!(trend[0].actionable);
        assert!(trend[0].insight.contains("trending down"));
        assert!((trend[0].confidence - 4.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_trend_insight_flat_or_short() {
        let flat = habit(35, |_, _| true);
        assert!(insights_of(&flat, InsightType::CompletionTrend).is_empty());

        let short = habit(14, |_, i| i > 7);
        assert!(insights_of(&short, InsightType::CompletionTrend).is_empty());
    }

    #[test]
    fn test_timing_insight() {
        // Five weeks; never on Mondays
        let h = habit(35, |d, _| day_of_week(d) != 1);
        let timing = insights_of(&h, InsightType::OptimalTiming);
        assert_eq!(timing.len(), 1);
        assert!(timing[0].insight.contains("Sundays"));
        assert!(timing[0].insight.contains("Mondays"));
        assert_eq!(timing[0].confidence, 0.9);
        assert_eq!(timing[0].data_points, 35);
    }

    #[test]
    fn test_timing_needs_enough_best_day_entries() {
        // Two weeks -> at most 2 entries per weekday
        let h = habit(14, |d, _| day_of_week(d) != 1);
        assert!(insights_of(&h, InsightType::OptimalTiming).is_empty());

        // Too few distinct weekdays
        let h = habit(2, |_, _| true);
        assert!(insights_of(&h, InsightType::OptimalTiming).is_empty());
    }

    #[test]
    fn test_timing_needs_a_wide_spread() {
        // Five weeks from Sunday 2024-01-28; one missed Monday -> 0.8 vs 1.0
        let h = habit(35, |d, i| !(day_of_week(d) == 1 && i < 7));
        assert!(insights_of(&h, InsightType::OptimalTiming).is_empty());

        // Two missed Mondays -> 0.6 vs 1.0
        let h = habit(35, |d, i| !(day_of_week(d) == 1 && i < 14));
        assert_eq!(insights_of(&h, InsightType::OptimalTiming).len(), 1);
    }

    #[test]
    fn test_difficulty_classification() {
        assert_eq!(Difficulty::classify(0.9, 10.0), Difficulty::Easy);
        assert_eq!(Difficulty::classify(0.9, 5.0), Difficulty::Moderate);
        assert_eq!(Difficulty::classify(0.65, 3.0), Difficulty::Challenging);
        assert_eq!(Difficulty::classify(0.2, 0.0), Difficulty::Difficult);

        let h = habit(30, |_, _| true);
        let difficulty = insights_of(&h, InsightType::DifficultyAnalysis);
        assert_eq!(difficulty.len(), 1);
        assert!(difficulty[0].insight.contains("easy"));
        assert_eq!(difficulty[0].confidence, 0.8);
        assert!(!difficulty[0].actionable);

        let h = habit(19, |_, _| true);
        assert!(insights_of(&h, InsightType::DifficultyAnalysis).is_empty());
    }

    #[test]
    fn test_streak_prediction_branches() {
        let strong = habit(14, |_, _| true);
        let prediction = insights_of(&strong, InsightType::StreakPrediction);
        assert_eq!(prediction[0].confidence, 0.8);
        assert!(prediction[0].insight.contains("live streak of 14 days"));

        let medium = habit(14, |_, i| i % 3 != 0);
        assert_eq!(
            insights_of(&medium, InsightType::StreakPrediction)[0].confidence,
            0.6
        );

        let weak = habit(14, |_, i| i % 4 == 0);
        let prediction = insights_of(&weak, InsightType::StreakPrediction);
        assert_eq!(prediction[0].confidence, 0.7);
        assert!(prediction[0].actionable);
    }

    #[test]
    fn test_streak_prediction_uses_recent_records_only() {
        // 30 misses followed by 14 completions
        let h = habit(44, |_, i| i >= 30);
        let prediction = insights_of(&h, InsightType::StreakPrediction);
        assert_eq!(prediction[0].data_points, 14);
        assert_eq!(prediction[0].confidence, 0.8);

        let h = habit(6, |_, _| true);
        assert!(insights_of(&h, InsightType::StreakPrediction).is_empty());
    }

    #[test]
    fn test_sorted_by_confidence() {
        let habits = vec![habit(35, |d, _| day_of_week(d) != 1), habit(20, |_, i| i % 2 == 0)];
        let insights = InsightGenerator::generate(&habits, &window(), &Thresholds::default());
        assert!(!insights.is_empty());
        for pair in insights.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
    }
}
