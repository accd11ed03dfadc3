//! Productivity pattern detection
//!
//! Four independent detectors run over the same window and their findings are
//! merged:
//!
//! - **Daily**: weekdays with unusually high or low completion across all habits
//! - **Weekly**: habits whose weekly completion rate is clearly rising or falling
//! - **Streak**: habits that repeatedly build long streaks
//! - **Cluster**: habit pairs that tend to be completed on the same days

use crate::config::Thresholds;
use crate::series::{
    average_streak_length, completion_series, day_of_week, find_streaks, weekly_rates,
    AnalysisWindow, DAY_NAMES,
};
use crate::stats::linear_trend;
use crate::types::{Habit, Impact, PatternType, ProductivityPattern, SeriesPoint};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::debug;

/// Weekday completion rate at or above which a day counts as high performance
const HIGH_PERFORMANCE_RATE: f64 = 0.8;
/// Weekday completion rate at or below which a day counts as low performance
const LOW_PERFORMANCE_RATE: f64 = 0.3;
/// Minimum |weekly slope| for a weekly pattern
const WEEKLY_TREND_THRESHOLD: f64 = 0.1;
/// |weekly slope| at which a weekly pattern becomes high impact
const WEEKLY_HIGH_IMPACT_TREND: f64 = 0.2;
/// Minimum share of shared dates on which both habits were completed
const CLUSTER_RATE_THRESHOLD: f64 = 0.7;

/// Pattern detector over a set of habits
pub struct PatternDetector;

impl PatternDetector {
    /// Run every detector and return patterns sorted by strength, strongest first
    pub fn detect(
        habits: &[Habit],
        window: &AnalysisWindow,
        thresholds: &Thresholds,
    ) -> Vec<ProductivityPattern> {
        let series: Vec<Vec<SeriesPoint>> = habits
            .iter()
            .map(|h| completion_series(h, window))
            .collect();

        let mut patterns = Vec::new();
        patterns.extend(detect_daily_patterns(habits, &series, thresholds));
        patterns.extend(detect_weekly_patterns(habits, &series, thresholds));
        patterns.extend(detect_streak_patterns(habits, &series, thresholds));
        patterns.extend(detect_cluster_patterns(habits, &series, thresholds));

        patterns.sort_by(|a, b| b.strength.total_cmp(&a.strength));

        debug!(
            habits = habits.len(),
            patterns = patterns.len(),
            lookback_days = window.lookback_days(),
            "Detected productivity patterns"
        );

        patterns
    }
}

#[derive(Default)]
struct WeekdayBucket {
    completed: usize,
    total: usize,
    habits: Vec<String>,
}

/// Weekdays where completion across all habits is well above or below average
fn detect_daily_patterns(
    habits: &[Habit],
    series: &[Vec<SeriesPoint>],
    thresholds: &Thresholds,
) -> Vec<ProductivityPattern> {
    let mut buckets: [WeekdayBucket; 7] = Default::default();

    for (habit, points) in habits.iter().zip(series) {
        for point in points {
            let bucket = &mut buckets[day_of_week(point.date)];
            bucket.total += 1;
            if point.completed {
                bucket.completed += 1;
            }
            if !bucket.habits.contains(&habit.id) {
                bucket.habits.push(habit.id.clone());
            }
        }
    }

    let mut patterns = Vec::new();
    for (day, bucket) in buckets.into_iter().enumerate() {
        if bucket.total < thresholds.min_daily_entries {
            continue;
        }

        let rate = bucket.completed as f64 / bucket.total as f64;
        let day_name = DAY_NAMES[day];
        let strength = ((rate - 0.5).abs() * 2.0).clamp(0.0, 1.0);

        if rate >= HIGH_PERFORMANCE_RATE {
            patterns.push(ProductivityPattern {
                pattern_type: PatternType::Daily,
                pattern: format!("high_performance_{}", day_name.to_lowercase()),
                description: format!(
                    "{}s are your strongest day with a {:.0}% completion rate",
                    day_name,
                    rate * 100.0
                ),
                habits_involved: bucket.habits,
                strength,
                frequency: bucket.total,
                impact: Impact::High,
                recommendation: format!(
                    "Schedule new or demanding habits on {}s to build on this momentum",
                    day_name
                ),
            });
        } else if rate <= LOW_PERFORMANCE_RATE {
            patterns.push(ProductivityPattern {
                pattern_type: PatternType::Daily,
                pattern: format!("low_performance_{}", day_name.to_lowercase()),
                description: format!(
                    "{}s are a weak spot with only a {:.0}% completion rate",
                    day_name,
                    rate * 100.0
                ),
                habits_involved: bucket.habits,
                strength,
                frequency: bucket.total,
                impact: Impact::Medium,
                recommendation: format!(
                    "Set extra reminders or plan lighter versions of your habits on {}s",
                    day_name
                ),
            });
        }
    }

    patterns
}

/// Habits whose weekly completion rate has a clear upward or downward slope
fn detect_weekly_patterns(
    habits: &[Habit],
    series: &[Vec<SeriesPoint>],
    thresholds: &Thresholds,
) -> Vec<ProductivityPattern> {
    let mut patterns = Vec::new();

    for (habit, points) in habits.iter().zip(series) {
        let rates = weekly_rates(points);
        if rates.len() < thresholds.min_trend_weeks {
            continue;
        }

        let trend = linear_trend(&rates);
        if trend.abs() < WEEKLY_TREND_THRESHOLD {
            continue;
        }

        let improving = trend > 0.0;
        let impact = if trend.abs() >= WEEKLY_HIGH_IMPACT_TREND {
            Impact::High
        } else {
            Impact::Medium
        };

        patterns.push(ProductivityPattern {
            pattern_type: PatternType::Weekly,
            pattern: if improving {
                "improving_trend".to_string()
            } else {
                "declining_trend".to_string()
            },
            description: format!(
                "{} is {} by {:.1}% per week",
                habit.name,
                if improving { "improving" } else { "declining" },
                trend.abs() * 100.0
            ),
            habits_involved: vec![habit.id.clone()],
            strength: trend.abs().min(1.0),
            frequency: rates.len(),
            impact,
            recommendation: if improving {
                format!("Keep doing what works for {}; consider raising the bar", habit.name)
            } else {
                format!(
                    "Revisit your routine for {}; a smaller daily target may help you recover",
                    habit.name
                )
            },
        });
    }

    patterns
}

/// Habits that repeatedly build long streaks
fn detect_streak_patterns(
    habits: &[Habit],
    series: &[Vec<SeriesPoint>],
    thresholds: &Thresholds,
) -> Vec<ProductivityPattern> {
    let mut patterns = Vec::new();

    for (habit, points) in habits.iter().zip(series) {
        let streaks = find_streaks(points);
        if streaks.len() < thresholds.min_streaks {
            continue;
        }

        let average = average_streak_length(&streaks);
        let longest = streaks.iter().map(|s| s.length).max().unwrap_or(0);
        if average < 5.0 && longest < 10 {
            continue;
        }

        patterns.push(ProductivityPattern {
            pattern_type: PatternType::Monthly,
            pattern: "consistent_streaks".to_string(),
            description: format!(
                "{} builds streaks reliably: {} streaks averaging {:.1} days, longest {} days",
                habit.name,
                streaks.len(),
                average,
                longest
            ),
            habits_involved: vec![habit.id.clone()],
            strength: (average / 10.0).min(1.0),
            frequency: streaks.len(),
            impact: Impact::High,
            recommendation: format!(
                "Use {} as an anchor and stack newer habits right after it",
                habit.name
            ),
        });
    }

    patterns
}

/// Habit pairs usually completed together on days both were tracked
fn detect_cluster_patterns(
    habits: &[Habit],
    series: &[Vec<SeriesPoint>],
    thresholds: &Thresholds,
) -> Vec<ProductivityPattern> {
    let lookups: Vec<HashMap<NaiveDate, bool>> = series
        .iter()
        .map(|points| points.iter().map(|p| (p.date, p.completed)).collect())
        .collect();

    let mut patterns = Vec::new();

    for i in 0..habits.len() {
        for j in (i + 1)..habits.len() {
            let mut shared = 0usize;
            let mut together = 0usize;

            for point in &series[i] {
                if let Some(&other) = lookups[j].get(&point.date) {
                    shared += 1;
                    if point.completed && other {
                        together += 1;
                    }
                }
            }

            if shared < thresholds.min_cluster_dates {
                continue;
            }

            let rate = together as f64 / shared as f64;
            if rate < CLUSTER_RATE_THRESHOLD || together < thresholds.min_cluster_occurrences {
                continue;
            }

            let (first, second) = (&habits[i], &habits[j]);
            patterns.push(ProductivityPattern {
                pattern_type: PatternType::Daily,
                pattern: "habit_cluster".to_string(),
                description: format!(
                    "{} and {} are completed together on {:.0}% of shared days",
                    first.name,
                    second.name,
                    rate * 100.0
                ),
                habits_involved: vec![first.id.clone(), second.id.clone()],
                strength: rate,
                frequency: together,
                impact: Impact::Medium,
                recommendation: format!(
                    "Pair {} and {} into a single routine to make both easier",
                    first.name, second.name
                ),
            });
        }
    }

    patterns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Completion;
    use chrono::{Duration, TimeZone, Utc};

    /// Reference "now": Sunday 2024-03-03 at noon
    fn window(days: u32) -> AnalysisWindow {
        AnalysisWindow::new(Utc.with_ymd_and_hms(2024, 3, 3, 12, 0, 0).unwrap(), days)
    }

    fn first_day() -> NaiveDate {
        // Sunday
        NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()
    }

    /// Daily records from 2024-01-07 for `days` days
    fn habit(id: &str, days: i64, completed: impl Fn(NaiveDate, i64) -> bool) -> Habit {
        let completions = (0..days)
            .map(|i| {
                let date = first_day() + Duration::days(i);
                Completion::new(date.format("%Y-%m-%d").to_string(), completed(date, i))
            })
            .collect();
        Habit::new(id, format!("Habit {id}")).with_completions(completions)
    }

    fn detect(habits: &[Habit]) -> Vec<ProductivityPattern> {
        PatternDetector::detect(habits, &window(90), &Thresholds::default())
    }

    #[test]
    fn test_daily_high_and_low_performance() {
        // 8 weeks; completed every day except Mondays
        let habits = vec![
            habit("a", 56, |d, _| day_of_week(d) != 1),
            habit("b", 56, |d, _| day_of_week(d) != 1),
        ];
        let patterns = detect(&habits);

        let monday = patterns
            .iter()
            .find(|p| p.pattern == "low_performance_monday")
            .unwrap();
        assert_eq!(monday.strength, 1.0);
        assert_eq!(monday.frequency, 16);
        assert_eq!(monday.impact, Impact::Medium);
        assert_eq!(monday.habits_involved, vec!["a", "b"]);

        let sunday = patterns
            .iter()
            .find(|p| p.pattern == "high_performance_sunday")
            .unwrap();
        assert_eq!(sunday.impact, Impact::High);
    }

    #[test]
    fn test_daily_requires_enough_entries() {
        // 4 weeks of one habit -> 4 entries per weekday
        let habits = vec![habit("a", 28, |d, _| day_of_week(d) != 1)];
        assert!(detect(&habits)
            .iter()
            .all(|p| !p.pattern.starts_with("low_performance")));
    }

    #[test]
    fn test_weekly_declining_pattern() {
        // Week k completes 7 - 2k days: rates 1, 5/7, 3/7, 1/7
        let habits = vec![habit("a", 28, |d, i| {
            let week = i / 7;
            let weekday = day_of_week(d) as i64;
            weekday < 7 - 2 * week
        })];
        let patterns = detect(&habits);
        let declining = patterns
            .iter()
            .find(|p| p.pattern == "declining_trend")
            .unwrap();
        assert_eq!(declining.pattern_type, PatternType::Weekly);
        assert_eq!(declining.frequency, 4);
        assert_eq!(declining.impact, Impact::High);
        assert!((declining.strength - 2.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_weekly_needs_four_weeks() {
        let habits = vec![habit("a", 21, |_, i| i < 7)];
        assert!(detect(&habits)
            .iter()
            .all(|p| p.pattern_type != PatternType::Weekly));
    }

    #[test]
    fn test_streak_pattern() {
        // Runs of 6 completed days separated by a miss: 8 runs in 56 days
        let habits = vec![habit("a", 56, |_, i| i % 7 != 6)];
        let patterns = detect(&habits);
        let streak = patterns
            .iter()
            .find(|p| p.pattern == "consistent_streaks")
            .unwrap();
        assert_eq!(streak.frequency, 8);
        assert!((streak.strength - 0.6).abs() < 1e-9);
        assert_eq!(streak.impact, Impact::High);
    }

    #[test]
    fn test_short_streaks_no_pattern() {
        // Runs of 2
        let habits = vec![habit("a", 60, |_, i| i % 3 != 2)];
        assert!(detect(&habits)
            .iter()
            .all(|p| p.pattern != "consistent_streaks"));
    }

    #[test]
    fn test_cluster_pattern() {
        let habits = vec![
            habit("a", 20, |_, i| i % 5 != 0),
            habit("b", 20, |_, i| i % 5 != 0),
        ];
        let patterns = detect(&habits);
        let cluster = patterns
            .iter()
            .find(|p| p.pattern == "habit_cluster")
            .unwrap();
        assert_eq!(cluster.habits_involved, vec!["a", "b"]);
        assert_eq!(cluster.frequency, 16);
        assert!((cluster.strength - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_cluster_counts_any_record_as_shared() {
        // Shared 20 days, both completed on 12 -> 0.6, below threshold
        let habits = vec![
            habit("a", 20, |_, i| i < 12),
            habit("b", 20, |_, i| i < 12),
        ];
        assert!(detect(&habits).iter().all(|p| p.pattern != "habit_cluster"));
    }

    #[test]
    fn test_daily_thresholds_are_inclusive() {
        // Five weeks of two habits -> 10 entries per weekday.
        // Monday 8/10, Tuesday 3/10, Wednesday 7/10, Thursday 4/10
        let a = habit("a", 35, |d, i| match day_of_week(d) {
            2 => i / 7 < 2,
            3 => i / 7 < 4,
            4 => i / 7 < 2,
            _ => true,
        });
        let b = habit("b", 35, |d, i| match day_of_week(d) {
            1 => i / 7 < 3,
            2 => i / 7 < 1,
            3 => i / 7 < 3,
            4 => i / 7 < 2,
            _ => true,
        });
        let patterns = detect(&[a, b]);
        let names: Vec<&str> = patterns.iter().map(|p| p.pattern.as_str()).collect();

        assert!(names.contains(&"high_performance_monday"));
        assert!(names.contains(&"low_performance_tuesday"));
        assert!(!names.iter().any(|n| n.ends_with("_wednesday")));
        assert!(!names.iter().any(|n| n.ends_with("_thursday")));
    }

    #[test]
    fn test_weekly_improving_medium_impact() {
        // Week k completes k + 2 days: rates 2/7, 3/7, 4/7, 5/7 -> slope 1/7
        let habits = vec![habit("a", 28, |d, i| (day_of_week(d) as i64) < i / 7 + 2)];
        let patterns = detect(&habits);
        let improving = patterns
            .iter()
            .find(|p| p.pattern == "improving_trend")
            .unwrap();
        assert_eq!(improving.pattern_type, PatternType::Weekly);
        assert_eq!(improving.impact, Impact::Medium);
        assert!((improving.strength - 1.0 / 7.0).abs() < 1e-9);
        assert!(patterns.iter().all(|p| p.pattern != "declining_trend"));
    }

    #[test]
    fn test_cluster_needs_enough_co_completions() {
        // 12 shared days, 9 completed together: rate 0.75 but only 9 occurrences
        let habits = vec![habit("a", 12, |_, i| i < 9), habit("b", 12, |_, i| i < 9)];
        assert!(detect(&habits).iter().all(|p| p.pattern != "habit_cluster"));

        // One more co-completed day crosses the gate
        let habits = vec![habit("a", 13, |_, i| i < 10), habit("b", 13, |_, i| i < 10)];
        let cluster = detect(&habits)
            .into_iter()
            .find(|p| p.pattern == "habit_cluster")
            .unwrap();
        assert_eq!(cluster.frequency, 10);
    }

    #[test]
    fn test_sorted_by_strength() {
        let habits = vec![
            habit("a", 56, |d, i| day_of_week(d) != 1 && i % 7 != 6),
            habit("b", 56, |d, _| day_of_week(d) != 1),
        ];
        let patterns = detect(&habits);
        assert!(!patterns.is_empty());
        for pair in patterns.windows(2) {
            assert!(pair[0].strength >= pair[1].strength);
        }
    }

    #[test]
    fn test_no_habits() {
        assert!(detect(&[]).is_empty());
    }
}
