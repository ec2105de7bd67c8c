//! Somnus CLI - log sleep records and compute aggregate statistics
//!
//! Commands:
//! - log: normalize one night of raw input into a stored record
//! - stats: summarize stored records over a date window
//! - seed: generate a local-development backfill batch
//! - validate: check stored records for parse and invariant problems
//!
//! The CLI plays the role of the external store: it owns file I/O, the window
//! filter, and the ascending-by-date ordering the aggregator relies on.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use somnus::{
    records_from_array, records_from_ndjson, AggregateMode, IntervalRequest, MoodLabel, Seeder,
    SleepProcessor, SleepRecord, SleepRecordSummary, TimePairRequest, ENGINE_VERSION,
};

/// Somnus - sleep diary compute engine
#[derive(Parser)]
#[command(name = "somnus")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Log sleep records and compute aggregate statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize one night of raw input into a stored record
    Log {
        /// ISO 8601 interval "startDateTime/endDateTime" (explicit-date form)
        #[arg(long, conflicts_with_all = ["bed_time", "wake_time"])]
        interval: Option<String>,

        /// Bed clock time "HH:MM[:SS]" (time-pair form, overnight inferred)
        #[arg(long, requires = "wake_time")]
        bed_time: Option<String>,

        /// Wake clock time "HH:MM[:SS]"
        #[arg(long, requires = "bed_time")]
        wake_time: Option<String>,

        /// Morning feeling
        #[arg(long, value_enum)]
        mood: MoodArg,

        /// Submission date attributed to the session (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// User identifier
        #[arg(long, default_value = "1")]
        user_id: String,

        /// Output the full stored record instead of the formatted summary
        #[arg(long)]
        raw: bool,
    },

    /// Summarize stored records over a date window
    Stats {
        /// Input file with stored records (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Aggregation strategy
        #[arg(long, value_enum, default_value = "in-process")]
        mode: ModeArg,

        /// Window length in days, ending today
        #[arg(long, default_value = "30")]
        window_days: u32,

        /// Window end date (defaults to today)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Only include records for this user
        #[arg(long)]
        user_id: Option<String>,

        /// Pretty-print the summary
        #[arg(long)]
        pretty: bool,
    },

    /// Generate a local-development backfill batch as NDJSON
    Seed {
        /// Number of days to backfill, ending yesterday
        #[arg(long, default_value = "30")]
        days: u32,

        /// Date treated as today (defaults to today)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// User identifier stamped on generated records
        #[arg(long, default_value = "1")]
        user_id: String,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Check stored records for parse and invariant problems
    Validate {
        /// Input file with stored records (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum MoodArg {
    Bad,
    Ok,
    Good,
}

impl From<MoodArg> for MoodLabel {
    fn from(mood: MoodArg) -> Self {
        match mood {
            MoodArg::Bad => MoodLabel::Bad,
            MoodArg::Ok => MoodLabel::Ok,
            MoodArg::Good => MoodLabel::Good,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    InProcess,
    Projection,
}

impl From<ModeArg> for AggregateMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::InProcess => AggregateMode::InProcess,
            ModeArg::Projection => AggregateMode::Projection,
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

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

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();
}

fn run(cli: Cli) -> Result<(), SomnusCliError> {
    match cli.command {
        Commands::Log {
            interval,
            bed_time,
            wake_time,
            mood,
            date,
            user_id,
            raw,
        } => cmd_log(interval, bed_time, wake_time, mood, date, &user_id, raw),

        Commands::Stats {
            input,
            input_format,
            mode,
            window_days,
            today,
            user_id,
            pretty,
        } => cmd_stats(
            &input,
            input_format,
            mode,
            window_days,
            today,
            user_id.as_deref(),
            pretty,
        ),

        Commands::Seed {
            days,
            today,
            user_id,
            output,
        } => cmd_seed(days, today, &user_id, &output),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),
    }
}

fn cmd_log(
    interval: Option<String>,
    bed_time: Option<String>,
    wake_time: Option<String>,
    mood: MoodArg,
    date: Option<NaiveDate>,
    user_id: &str,
    raw: bool,
) -> Result<(), SomnusCliError> {
    let submitted_on = date.unwrap_or_else(|| Local::now().date_naive());
    let processor = SleepProcessor::new();

    let record = match (interval, bed_time, wake_time) {
        (Some(interval), None, None) => {
            let request = IntervalRequest {
                time_in_bed_interval: interval,
                mood_label: mood.into(),
            };
            processor.log_interval(&request, user_id, submitted_on)?
        }
        (None, Some(bed), Some(wake)) => {
            let request = TimePairRequest {
                bed_time: bed,
                wake_time: wake,
                mood_label: mood.into(),
            };
            processor.log_time_pair(&request, user_id, submitted_on)?
        }
        _ => return Err(SomnusCliError::MissingInput),
    };

    if raw {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        let summary = SleepRecordSummary::from(&record);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

fn cmd_stats(
    input: &PathBuf,
    input_format: InputFormat,
    mode: ModeArg,
    window_days: u32,
    today: Option<NaiveDate>,
    user_id: Option<&str>,
    pretty: bool,
) -> Result<(), SomnusCliError> {
    let data = read_input(input)?;
    let mut records = parse_records(&data, input_format)?;

    if records.is_empty() {
        return Err(SomnusCliError::NoRecords);
    }

    if let Some(user_id) = user_id {
        records.retain(|r| r.user_id == user_id);
    }

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let processor = SleepProcessor::with_mode(mode.into()).with_window_days(window_days);

    let (start, end) = processor.window(today);
    records.retain(|r| r.sleep_date >= start && r.sleep_date <= end);
    records.sort_by_key(|r| r.sleep_date);

    match processor.averages(&records)? {
        Some(averages) => {
            let output = if pretty {
                serde_json::to_string_pretty(&averages)?
            } else {
                serde_json::to_string(&averages)?
            };
            println!("{}", output);
        }
        // absence, not an error: nothing recorded inside the window
        None => println!("null"),
    }

    Ok(())
}

fn cmd_seed(
    days: u32,
    today: Option<NaiveDate>,
    user_id: &str,
    output: &PathBuf,
) -> Result<(), SomnusCliError> {
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let seeder = Seeder::new(days);

    // planning from an empty store always yields a full backfill
    let plan = seeder.plan(0, None, today).ok_or(SomnusCliError::NoRecords)?;
    let records = seeder.generate(&plan, user_id);

    let mut lines = String::new();
    for record in &records {
        lines.push_str(&serde_json::to_string(record)?);
        lines.push('\n');
    }

    if output.to_string_lossy() == "-" {
        print!("{}", lines);
        io::stdout().flush()?;
    } else {
        fs::write(output, lines)?;
    }

    Ok(())
}

fn cmd_validate(
    input: &PathBuf,
    input_format: InputFormat,
    json: bool,
) -> Result<(), SomnusCliError> {
    let data = read_input(input)?;

    let mut total = 0usize;
    let mut errors: Vec<ValidationErrorDetail> = Vec::new();

    match input_format {
        InputFormat::Ndjson => {
            for (index, line) in data
                .lines()
                .map(str::trim)
                .enumerate()
                .filter(|(_, line)| !line.is_empty())
            {
                total += 1;
                match serde_json::from_str::<SleepRecord>(line) {
                    Ok(record) => check_record(&record, index, &mut errors),
                    Err(e) => errors.push(ValidationErrorDetail {
                        index,
                        error: format!("parse error: {}", e),
                    }),
                }
            }
        }
        InputFormat::Json => match records_from_array(&data) {
            Ok(records) => {
                total = records.len();
                for (index, record) in records.iter().enumerate() {
                    check_record(record, index, &mut errors);
                }
            }
            Err(e) => {
                total = 1;
                errors.push(ValidationErrorDetail {
                    index: 0,
                    error: format!("parse error: {}", e),
                });
            }
        },
    }

    let report = ValidationReport {
        total_records: total,
        valid_records: total - errors.len(),
        invalid_records: errors.len(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Record {}: {}", err.index, err.error);
            }
        }
    }

    if report.invalid_records > 0 {
        Err(SomnusCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn check_record(record: &SleepRecord, index: usize, errors: &mut Vec<ValidationErrorDetail>) {
    if !record.is_consistent() {
        errors.push(ValidationErrorDetail {
            index,
            error: "totalTimeInBed does not match the bed-to-wake span".to_string(),
        });
    }
}

fn read_input(input: &PathBuf) -> Result<String, SomnusCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_records(data: &str, format: InputFormat) -> Result<Vec<SleepRecord>, SomnusCliError> {
    let records = match format {
        InputFormat::Ndjson => records_from_ndjson(data)?,
        InputFormat::Json => records_from_array(data)?,
    };
    Ok(records)
}

// Error types

#[derive(Debug)]
enum SomnusCliError {
    Io(io::Error),
    Engine(somnus::SleepError),
    Json(serde_json::Error),
    NoRecords,
    MissingInput,
    ValidationFailed(usize),
}

impl From<io::Error> for SomnusCliError {
    fn from(e: io::Error) -> Self {
        SomnusCliError::Io(e)
    }
}

impl From<somnus::SleepError> for SomnusCliError {
    fn from(e: somnus::SleepError) -> Self {
        SomnusCliError::Engine(e)
    }
}

impl From<serde_json::Error> for SomnusCliError {
    fn from(e: serde_json::Error) -> Self {
        SomnusCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SomnusCliError> for CliError {
    fn from(e: SomnusCliError) -> Self {
        match e {
            SomnusCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            SomnusCliError::Engine(e) => CliError {
                code: if e.is_validation() {
                    "VALIDATION_ERROR".to_string()
                } else {
                    "ENGINE_ERROR".to_string()
                },
                message: e.to_string(),
                hint: Some("Check the raw input values".to_string()),
            },
            SomnusCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            SomnusCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No records found in input".to_string(),
                hint: Some("Ensure the input file is not empty".to_string()),
            },
            SomnusCliError::MissingInput => CliError {
                code: "MISSING_INPUT".to_string(),
                message: "Provide either --interval or --bed-time/--wake-time".to_string(),
                hint: Some("Run 'somnus log --help' for the accepted shapes".to_string()),
            },
            SomnusCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
        }
    }
}

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    error: String,
}
