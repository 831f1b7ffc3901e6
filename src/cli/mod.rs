//! Command-line parsing.
//!
//! Parsing only; dispatch lives in `app`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::DEFAULT_OUTPUT_FILENAME;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "grid-pulse", version, about = "Hourly electricity demand ingest (EIA v2)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the last N days of hourly demand and overwrite the raw CSV.
    Ingest(IngestArgs),
    /// Run `ingest` every day at local midnight, retrying a failed run once.
    Schedule(ScheduleArgs),
}

#[derive(Debug, Args, Clone)]
pub struct IngestArgs {
    /// File name written inside the raw data directory.
    #[arg(long, default_value = DEFAULT_OUTPUT_FILENAME)]
    pub output_filename: String,

    /// How many days before today the window starts.
    #[arg(long, default_value_t = 2)]
    pub days_back: u32,

    /// Raw data directory (overrides GRID_PULSE_RAW_DIR).
    #[arg(long, value_name = "DIR")]
    pub raw_dir: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ScheduleArgs {
    #[arg(long, default_value = DEFAULT_OUTPUT_FILENAME)]
    pub output_filename: String,

    /// Window size for each daily run.
    #[arg(long, default_value_t = 1)]
    pub days_back: u32,

    #[arg(long, value_name = "DIR")]
    pub raw_dir: Option<PathBuf>,

    /// Whole-run retries after a failure.
    #[arg(long, default_value_t = 1)]
    pub retries: u32,

    /// Delay before each retry, in seconds.
    #[arg(long, default_value_t = 300)]
    pub retry_delay_secs: u64,

    /// Run once immediately on start instead of waiting for midnight.
    #[arg(long)]
    pub run_now: bool,

    /// Exit after the first run (and its retry).
    #[arg(long)]
    pub once: bool,
}
