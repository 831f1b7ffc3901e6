//! Top-level application orchestration.
//!
//! `src/main.rs` only maps the result to an exit code; this module:
//! - initialises logging
//! - parses CLI arguments
//! - runs a single ingest or the daily schedule

use std::time::Duration;

use clap::Parser;
use env_logger::Env;

use crate::cli::{Command, IngestArgs, ScheduleArgs};
use crate::config::Settings;
use crate::error::AppError;
use crate::schedule::{DailySchedule, RetryPolicy};

pub mod pipeline;

use pipeline::{IngestJob, IngestOutcome};

/// Entry point for the `grid-pulse` binary.
pub fn run() -> Result<(), AppError> {
    // A second init (e.g. from tests) is harmless.
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init();

    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Ingest(args) => handle_ingest(args),
        Command::Schedule(args) => handle_schedule(args),
    }
}

fn handle_ingest(args: IngestArgs) -> Result<(), AppError> {
    let job = IngestJob {
        output_filename: args.output_filename,
        days_back: args.days_back,
        raw_dir: args.raw_dir,
    };

    match pipeline::run_job(&job)? {
        IngestOutcome::Written { rows, .. } => log::info!("Ingest complete ({rows} rows)"),
        IngestOutcome::Empty => log::info!("Ingest complete (nothing written)"),
    }
    Ok(())
}

fn handle_schedule(args: ScheduleArgs) -> Result<(), AppError> {
    // Fail fast on a missing credential instead of retrying it every day.
    Settings::from_env()?;

    let job = IngestJob {
        output_filename: args.output_filename,
        days_back: args.days_back,
        raw_dir: args.raw_dir,
    };
    let schedule = DailySchedule {
        retry: RetryPolicy {
            retries: args.retries,
            delay: Duration::from_secs(args.retry_delay_secs),
        },
        run_now: args.run_now,
        once: args.once,
    };

    log::info!(
        "Starting daily ingest of {} (days_back={}, retries={}, retry_delay={}s)",
        job.output_filename,
        job.days_back,
        schedule.retry.retries,
        schedule.retry.delay.as_secs()
    );
    schedule.run(|| pipeline::run_job(&job))
}

/// Rewrite argv so a bare `grid-pulse` behaves like `grid-pulse ingest`.
///
/// Rules:
/// - `grid-pulse`                      -> `grid-pulse ingest`
/// - `grid-pulse --days-back 5 ...`    -> `grid-pulse ingest --days-back 5 ...`
/// - `grid-pulse --help/--version/-h`  -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("ingest".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "ingest".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_becomes_ingest() {
        assert_eq!(rewrite_args(argv(&["grid-pulse"])), argv(&["grid-pulse", "ingest"]));
    }

    #[test]
    fn leading_flags_go_to_ingest() {
        assert_eq!(
            rewrite_args(argv(&["grid-pulse", "--days-back", "5"])),
            argv(&["grid-pulse", "ingest", "--days-back", "5"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        for args in [
            argv(&["grid-pulse", "schedule", "--once"]),
            argv(&["grid-pulse", "ingest"]),
            argv(&["grid-pulse", "--help"]),
            argv(&["grid-pulse", "-V"]),
        ] {
            assert_eq!(rewrite_args(args.clone()), args);
        }
    }
}
