//! Habitflux CLI - Command-line interface for the habit analytics engine
//!
//! Commands:
//! - correlations: Correlate every habit pair
//! - patterns: Detect productivity patterns
//! - insights: Generate per-habit insights
//! - compare: Score and rank habits for a timeframe
//! - report: Run every analysis for a timeframe
//! - validate: Check a habit export for data-integrity problems

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use habitflux::adapter::HabitAdapter;
use habitflux::config::AnalyticsConfig;
use habitflux::engine::HabitAnalytics;
use habitflux::types::{Habit, Timeframe};
use habitflux::{logging, AnalyticsError, HABITFLUX_VERSION};

/// Habitflux - Analytics engine for daily habit completion data
#[derive(Parser)]
#[command(name = "habitflux")]
#[command(version = HABITFLUX_VERSION)]
#[command(about = "Derive streaks, correlations and scores from habit data", long_about = None)]
struct Cli {
    /// Config file (TOML, or JSON with a .json extension)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Input file path (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Input format
    #[arg(long, default_value = "json")]
    input_format: InputFormat,

    /// Reference time (RFC 3339 or YYYY-MM-DD); defaults to now
    #[arg(long)]
    now: Option<String>,

    /// Output format
    #[arg(long, default_value = "json-pretty")]
    output_format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Correlate every habit pair
    Correlations {
        #[command(flatten)]
        input: InputArgs,

        /// Lookback window in days
        #[arg(long, default_value = "30")]
        days: u32,
    },

    /// Detect productivity patterns
    Patterns {
        #[command(flatten)]
        input: InputArgs,

        /// Lookback window in days
        #[arg(long, default_value = "30")]
        days: u32,
    },

    /// Generate per-habit insights
    Insights {
        #[command(flatten)]
        input: InputArgs,

        /// Lookback window in days
        #[arg(long, default_value = "30")]
        days: u32,
    },

    /// Score and rank habits for a timeframe
    Compare {
        #[command(flatten)]
        input: InputArgs,

        /// Timeframe (week, month, quarter, year); defaults to the configured one
        #[arg(long)]
        timeframe: Option<Timeframe>,
    },

    /// Run every analysis for a timeframe
    Report {
        #[command(flatten)]
        input: InputArgs,

        /// Timeframe (week, month, quarter, year); defaults to the configured one
        #[arg(long)]
        timeframe: Option<Timeframe>,
    },

    /// Check a habit export for data-integrity problems
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON array of habits, or an object with a `habits` array
    Json,
    /// Newline-delimited JSON (one habit per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), HabitfluxCliError> {
    let mut config = match &cli.config {
        Some(path) => AnalyticsConfig::load(path)?,
        None => AnalyticsConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    logging::init(&config.logging)?;

    let default_timeframe = config.default_timeframe;
    let analytics = HabitAnalytics::with_config(config);

    match cli.command {
        Commands::Correlations { input, days } => {
            let (analytics, habits) = prepare(analytics, &input)?;
            emit(&analytics.correlations(&habits, days), &input.output_format)
        }
        Commands::Patterns { input, days } => {
            let (analytics, habits) = prepare(analytics, &input)?;
            emit(&analytics.patterns(&habits, days), &input.output_format)
        }
        Commands::Insights { input, days } => {
            let (analytics, habits) = prepare(analytics, &input)?;
            emit(&analytics.insights(&habits, days), &input.output_format)
        }
        Commands::Compare { input, timeframe } => {
            let (analytics, habits) = prepare(analytics, &input)?;
            let timeframe = timeframe.unwrap_or(default_timeframe);
            emit(&analytics.comparative(&habits, timeframe), &input.output_format)
        }
        Commands::Report { input, timeframe } => {
            let (analytics, habits) = prepare(analytics, &input)?;
            let timeframe = timeframe.unwrap_or(default_timeframe);
            emit(&analytics.report(&habits, timeframe), &input.output_format)
        }
        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),
    }
}

/// Load habits and pin the reference time
fn prepare(
    analytics: HabitAnalytics,
    input: &InputArgs,
) -> Result<(HabitAnalytics, Vec<Habit>), HabitfluxCliError> {
    let habits = load_habits(&input.input, &input.input_format)?;
    if habits.is_empty() {
        return Err(HabitfluxCliError::NoHabits);
    }

    let analytics = match &input.now {
        Some(now) => analytics.at(parse_now(now)?),
        None => analytics,
    };

    Ok((analytics, habits))
}

fn load_habits(input: &Path, format: &InputFormat) -> Result<Vec<Habit>, HabitfluxCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let habits = match format {
        InputFormat::Json => HabitAdapter::parse_storage(&input_data)?,
        InputFormat::Ndjson => HabitAdapter::parse_ndjson(&input_data)?,
    };
    Ok(habits)
}

/// Accept a full RFC 3339 timestamp or a bare date (taken as UTC midnight)
fn parse_now(value: &str) -> Result<DateTime<Utc>, HabitfluxCliError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| {
            HabitfluxCliError::Engine(AnalyticsError::DateParseError(format!(
                "Invalid --now value: {}",
                value
            )))
        })
}

fn emit<T: Serialize>(value: &T, format: &OutputFormat) -> Result<(), HabitfluxCliError> {
    let output = match format {
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
    };
    println!("{}", output);
    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), HabitfluxCliError> {
    let habits = load_habits(input, &input_format)?;
    let report = HabitAdapter::validate(&habits);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Habits:      {}", report.total_habits);
        println!("Completions: {}", report.total_completions);
        println!("Issues:      {}", report.issues.len());

        if !report.issues.is_empty() {
            println!("\nIssues:");
            for issue in &report.issues {
                println!("  [{}] {}", issue.habit_id, issue.message);
            }
        }
    }

    if report.is_valid() {
        Ok(())
    } else {
        Err(HabitfluxCliError::ValidationFailed(report.issues.len()))
    }
}

// Error types

#[derive(Debug)]
enum HabitfluxCliError {
    Io(io::Error),
    Engine(AnalyticsError),
    Json(serde_json::Error),
    NoHabits,
    ValidationFailed(usize),
}

impl From<io::Error> for HabitfluxCliError {
    fn from(e: io::Error) -> Self {
        HabitfluxCliError::Io(e)
    }
}

impl From<AnalyticsError> for HabitfluxCliError {
    fn from(e: AnalyticsError) -> Self {
        HabitfluxCliError::Engine(e)
    }
}

impl From<serde_json::Error> for HabitfluxCliError {
    fn from(e: serde_json::Error) -> Self {
        HabitfluxCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<HabitfluxCliError> for CliError {
    fn from(e: HabitfluxCliError) -> Self {
        match e {
            HabitfluxCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            HabitfluxCliError::Engine(e) => {
                let hint = match &e {
                    AnalyticsError::ConfigError(_) => "Check the config file and --log-level",
                    AnalyticsError::InvalidTimeframe(_) => "Use week, month, quarter or year",
                    AnalyticsError::DateParseError(_) => {
                        "Use an RFC 3339 timestamp or a YYYY-MM-DD date"
                    }
                    _ => "Ensure input is a habit list: [{id, name, completions: [{date, completed}]}]",
                };
                CliError {
                    code: "ENGINE_ERROR".to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            HabitfluxCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            HabitfluxCliError::NoHabits => CliError {
                code: "NO_HABITS".to_string(),
                message: "No habits found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            HabitfluxCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} data-integrity issues found", count),
                hint: Some("Fix the listed records and retry".to_string()),
            },
        }
    }
}
