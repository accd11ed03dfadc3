//! Completion series extraction
//!
//! Every analyzer starts here: a habit's raw completion records are turned
//! into a date-ascending series bounded by the analysis window, then grouped
//! into weeks or scanned for streaks.

use crate::types::{Habit, SeriesPoint, Streak};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

/// Day names indexed by `num_days_from_sunday`
pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Reference instant plus lookback, shared by every analysis call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisWindow {
    now: DateTime<Utc>,
    lookback_days: u32,
}

impl AnalysisWindow {
    pub fn new(now: DateTime<Utc>, lookback_days: u32) -> Self {
        Self { now, lookback_days }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Calendar date of the reference instant (UTC)
    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    pub fn lookback_days(&self) -> u32 {
        self.lookback_days
    }

    /// Earliest instant included in the window.
    ///
    /// A lookback reaching past the representable range saturates to the
    /// earliest instant, so every record is inside the window.
    pub fn cutoff(&self) -> DateTime<Utc> {
        Duration::try_days(i64::from(self.lookback_days))
            .and_then(|span| self.now.checked_sub_signed(span))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// A date is inside the window when its UTC midnight is not before the cutoff
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.and_time(NaiveTime::MIN).and_utc() >= self.cutoff()
    }
}

/// Parse an ISO `YYYY-MM-DD` date string
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

/// Extract the date-ascending completion series of a habit within the window.
///
/// Unparseable dates are skipped. When a date appears more than once the
/// first record wins.
pub fn completion_series(habit: &Habit, window: &AnalysisWindow) -> Vec<SeriesPoint> {
    let mut seen = HashSet::new();
    let mut series = Vec::with_capacity(habit.completions.len());

    for completion in &habit.completions {
        let Some(date) = parse_date(&completion.date) else {
            warn!(habit_id = %habit.id, date = %completion.date, "Skipping unparseable completion date");
            continue;
        };
        if !window.contains(date) {
            continue;
        }
        if !seen.insert(date) {
            warn!(habit_id = %habit.id, %date, "Ignoring duplicate completion record");
            continue;
        }
        series.push(SeriesPoint {
            date,
            completed: completion.completed,
        });
    }

    series.sort_by_key(|p| p.date);
    series
}

/// Day of week with Sunday = 0
pub fn day_of_week(date: NaiveDate) -> usize {
    date.weekday().num_days_from_sunday() as usize
}

/// Sunday that starts the calendar week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Completion rate of each calendar week, oldest week first
pub fn weekly_rates(series: &[SeriesPoint]) -> Vec<f64> {
    let mut weeks: BTreeMap<NaiveDate, (u32, u32)> = BTreeMap::new();
    for point in series {
        let entry = weeks.entry(week_start(point.date)).or_insert((0, 0));
        if point.completed {
            entry.0 += 1;
        }
        entry.1 += 1;
    }

    weeks
        .values()
        .map(|&(completed, total)| completed as f64 / total as f64)
        .collect()
}

/// Fraction of completed entries, 0 for an empty series
pub fn completion_rate(series: &[SeriesPoint]) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    let completed = series.iter().filter(|p| p.completed).count();
    completed as f64 / series.len() as f64
}

/// Find every run of two or more consecutive completed days.
///
/// Runs are returned in chronological order. A lone completed day is not a
/// streak.
pub fn find_streaks(series: &[SeriesPoint]) -> Vec<Streak> {
    let mut streaks = Vec::new();
    let mut current: Option<Streak> = None;

    for point in series.iter().filter(|p| p.completed) {
        if let Some(run) = current.as_mut() {
            if (point.date - run.end).num_days() == 1 {
                run.end = point.date;
                run.length += 1;
                continue;
            }
        }

        if let Some(run) = current.take() {
            if run.length >= 2 {
                streaks.push(run);
            }
        }
        current = Some(Streak {
            start: point.date,
            end: point.date,
            length: 1,
        });
    }

    if let Some(run) = current {
        if run.length >= 2 {
            streaks.push(run);
        }
    }

    streaks
}

/// Mean streak length, 0 when there are no streaks
pub fn average_streak_length(streaks: &[Streak]) -> f64 {
    if streaks.is_empty() {
        return 0.0;
    }
    let total: u32 = streaks.iter().map(|s| s.length).sum();
    total as f64 / streaks.len() as f64
}

/// Consecutive completed days counting back from `today`.
///
/// The count stops at the first day without a completed record, so a habit
/// not yet completed today has a live streak of 0.
pub fn current_streak(series: &[SeriesPoint], today: NaiveDate) -> u32 {
    let mut expected = today;
    let mut streak = 0;

    for point in series.iter().rev().filter(|p| p.date <= today) {
        if point.date != expected || !point.completed {
            break;
        }
        streak += 1;
        match expected.pred_opt() {
            Some(previous) => expected = previous,
            None => break,
        }
    }

    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Completion;
    use chrono::TimeZone;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn habit(records: &[(&str, bool)]) -> Habit {
        Habit::new("h1", "Read").with_completions(
            records
                .iter()
                .map(|(d, c)| Completion::new(*d, *c))
                .collect(),
        )
    }

    fn window() -> AnalysisWindow {
        AnalysisWindow::new(Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap(), 365)
    }

    #[test]
    fn test_series_sorted_and_filtered() {
        let h = habit(&[
            ("2024-01-10", true),
            ("2023-01-01", true), // outside the window
            ("2024-01-05", false),
        ]);
        let series = completion_series(&h, &window());
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, date("2024-01-05"));
        assert_eq!(series[1].date, date("2024-01-10"));
    }

    #[test]
    fn test_series_empty_input() {
        let h = Habit::new("h1", "Read");
        assert!(completion_series(&h, &window()).is_empty());
    }

    #[test]
    fn test_series_first_duplicate_wins() {
        let h = habit(&[("2024-01-10", true), ("2024-01-10", false)]);
        let series = completion_series(&h, &window());
        assert_eq!(series.len(), 1);
        assert!(series[0].completed);
    }

    #[test]
    fn test_series_skips_bad_dates() {
        let h = habit(&[("yesterday", true), ("2024-01-10", true)]);
        assert_eq!(completion_series(&h, &window()).len(), 1);
    }

    #[test]
    fn test_window_cutoff_boundary() {
        // now = 2024-01-31 12:00, 7 days back = 2024-01-24 12:00
        let w = AnalysisWindow::new(Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap(), 7);
        assert!(!w.contains(date("2024-01-24")));
        assert!(w.contains(date("2024-01-25")));

        let midnight = AnalysisWindow::new(Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap(), 7);
        assert!(midnight.contains(date("2024-01-24")));
    }

    #[test]
    fn test_huge_lookback_saturates() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap();
        for days in [u32::MAX, i32::MAX as u32] {
            let w = AnalysisWindow::new(now, days);
            assert_eq!(w.cutoff(), DateTime::<Utc>::MIN_UTC);
            assert!(w.contains(date("1900-01-01")));
        }

        let h = habit(&[("1970-01-01", true), ("2024-01-10", true)]);
        let series = completion_series(&h, &AnalysisWindow::new(now, u32::MAX));
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_streaks_two_runs() {
        let h = habit(&[
            ("2024-01-01", true),
            ("2024-01-02", true),
            ("2024-01-03", false),
            ("2024-01-04", true),
            ("2024-01-05", true),
            ("2024-01-06", true),
        ]);
        let streaks = find_streaks(&completion_series(&h, &window()));
        assert_eq!(
            streaks,
            vec![
                Streak {
                    start: date("2024-01-01"),
                    end: date("2024-01-02"),
                    length: 2
                },
                Streak {
                    start: date("2024-01-04"),
                    end: date("2024-01-06"),
                    length: 3
                },
            ]
        );
    }

    #[test]
    fn test_isolated_day_is_not_a_streak() {
        let h = habit(&[("2024-01-10", true)]);
        assert!(find_streaks(&completion_series(&h, &window())).is_empty());

        let h = habit(&[("2024-01-10", true), ("2024-01-11", true)]);
        let streaks = find_streaks(&completion_series(&h, &window()));
        assert_eq!(streaks.len(), 1);
        assert_eq!(streaks[0].length, 2);
    }

    #[test]
    fn test_gap_breaks_streak() {
        // No record at all on the 12th
        let h = habit(&[
            ("2024-01-10", true),
            ("2024-01-11", true),
            ("2024-01-13", true),
            ("2024-01-14", true),
        ]);
        let streaks = find_streaks(&completion_series(&h, &window()));
        assert_eq!(streaks.len(), 2);
        assert!(streaks.iter().all(|s| s.length == 2));
    }

    #[test]
    fn test_weekly_rates_group_by_sunday() {
        // 2024-01-07 is a Sunday
        assert_eq!(week_start(date("2024-01-10")), date("2024-01-07"));
        assert_eq!(week_start(date("2024-01-07")), date("2024-01-07"));
        assert_eq!(week_start(date("2024-01-06")), date("2023-12-31"));

        let h = habit(&[
            ("2024-01-05", true),
            ("2024-01-06", false),
            ("2024-01-07", true),
            ("2024-01-08", true),
        ]);
        let rates = weekly_rates(&completion_series(&h, &window()));
        assert_eq!(rates, vec![0.5, 1.0]);
    }

    #[test]
    fn test_current_streak_counts_back_from_today() {
        let today = date("2024-01-31");
        let h = habit(&[
            ("2024-01-27", true),
            ("2024-01-28", false),
            ("2024-01-29", true),
            ("2024-01-30", true),
            ("2024-01-31", true),
        ]);
        let series = completion_series(&h, &window());
        assert_eq!(current_streak(&series, today), 3);

        let h = habit(&[("2024-01-29", true), ("2024-01-30", true)]);
        let series = completion_series(&h, &window());
        assert_eq!(current_streak(&series, today), 0);
    }

    #[test]
    fn test_day_of_week() {
        assert_eq!(day_of_week(date("2024-01-07")), 0);
        assert_eq!(day_of_week(date("2024-01-08")), 1);
        assert_eq!(DAY_NAMES[day_of_week(date("2024-01-13"))], "Saturday");
    }
}
