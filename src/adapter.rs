//! Habit input adapter
//!
//! Decodes habit lists exported from the tracker's storage and checks them for
//! the integrity problems the engine tolerates silently (bad dates, duplicate
//! records, duplicate ids).

use crate::error::{AnalyticsError, Result};
use crate::series::parse_date;
use crate::types::Habit;
use serde::Serialize;
use std::collections::HashSet;

/// Adapter for turning exported JSON into habits
pub struct HabitAdapter;

impl HabitAdapter {
    /// Parse a JSON array of habits
    pub fn parse_array(json: &str) -> Result<Vec<Habit>> {
        let habits: Vec<Habit> = serde_json::from_str(json)?;
        Ok(habits)
    }

    /// Parse NDJSON (one habit per line)
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<Habit>> {
        let mut habits = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Habit>(trimmed) {
                Ok(habit) => habits.push(habit),
                Err(e) => {
                    return Err(AnalyticsError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(habits)
    }

    /// Parse a storage export: either a bare array or an object with a
    /// `habits` array
    pub fn parse_storage(json: &str) -> Result<Vec<Habit>> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        match value {
            serde_json::Value::Array(_) => Ok(serde_json::from_value(value)?),
            serde_json::Value::Object(mut map) => match map.remove("habits") {
                Some(habits) => Ok(serde_json::from_value(habits)?),
                None => Err(AnalyticsError::MissingField("habits".to_string())),
            },
            _ => Err(AnalyticsError::ParseError(
                "Expected a habit array or an object with a `habits` field".to_string(),
            )),
        }
    }

    /// Check habits for data-integrity problems
    pub fn validate(habits: &[Habit]) -> ValidationReport {
        let mut issues = Vec::new();
        let mut ids = HashSet::new();
        let mut total_completions = 0;

        for habit in habits {
            if !ids.insert(habit.id.as_str()) {
                issues.push(ValidationIssue {
                    habit_id: habit.id.clone(),
                    date: None,
                    kind: IssueKind::DuplicateHabitId,
                    message: format!("Habit id '{}' appears more than once", habit.id),
                });
            }

            let mut dates = HashSet::new();
            for completion in &habit.completions {
                total_completions += 1;
                match parse_date(&completion.date) {
                    None => issues.push(ValidationIssue {
                        habit_id: habit.id.clone(),
                        date: Some(completion.date.clone()),
                        kind: IssueKind::InvalidDate,
                        message: format!("'{}' is not a YYYY-MM-DD date", completion.date),
                    }),
                    Some(date) => {
                        if !dates.insert(date) {
                            issues.push(ValidationIssue {
                                habit_id: habit.id.clone(),
                                date: Some(completion.date.clone()),
                                kind: IssueKind::DuplicateCompletion,
                                message: format!(
                                    "More than one record for {}; the first one is used",
                                    completion.date
                                ),
                            });
                        }
                    }
                }
            }
        }

        ValidationReport {
            total_habits: habits.len(),
            total_completions,
            issues,
        }
    }
}

/// Outcome of validating a habit list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub total_habits: usize,
    pub total_completions: usize,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// A single data-integrity problem
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub habit_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub kind: IssueKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    InvalidDate,
    DuplicateCompletion,
    DuplicateHabitId,
}
