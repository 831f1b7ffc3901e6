//! The ingest invocation: fetch a window of demand and overwrite the raw CSV.
//!
//! Shared by the one-shot `ingest` command and the daily `schedule` loop so
//! both go through the same fetch -> check -> write sequence.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};

use crate::config::Settings;
use crate::data::{EiaClient, PageSource, fetch_demand};
use crate::domain::FetchRequest;
use crate::error::AppError;
use crate::io::export::write_series_csv;

/// What one invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The output file was replaced with `rows` data rows.
    Written { path: PathBuf, rows: usize },
    /// Upstream had nothing for the window; the output file was left alone.
    Empty,
}

/// Parameters of one ingest invocation.
#[derive(Debug, Clone)]
pub struct IngestJob {
    pub output_filename: String,
    pub days_back: u32,
    /// Overrides `Settings::raw_dir` when set.
    pub raw_dir: Option<PathBuf>,
}

impl IngestJob {
    /// `<raw_dir>/<output_filename>`, preferring the job's own directory.
    pub fn output_path(&self, settings: &Settings) -> PathBuf {
        self.raw_dir
            .as_deref()
            .unwrap_or(&settings.raw_dir)
            .join(&self.output_filename)
    }
}

/// Resolve settings from the environment and run one invocation for today.
///
/// A missing credential fails here, before any client exists.
pub fn run_job(job: &IngestJob) -> Result<IngestOutcome, AppError> {
    dotenvy::dotenv().ok();
    run_job_with_lookup(job, |name| std::env::var(name).ok(), Local::now().date_naive())
}

/// [`run_job`] with an explicit variable lookup and date.
pub fn run_job_with_lookup<F>(job: &IngestJob, lookup: F, today: NaiveDate) -> Result<IngestOutcome, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let settings = Settings::from_lookup(lookup)?;
    run_job_with_settings(job, &settings, today)
}

pub fn run_job_with_settings(
    job: &IngestJob,
    settings: &Settings,
    today: NaiveDate,
) -> Result<IngestOutcome, AppError> {
    let request = FetchRequest::days_back(today, job.days_back)?;
    let output = job.output_path(settings);

    let client = EiaClient::new(settings.fetch.clone());
    run_ingest(&client, &request, settings.fetch.max_pages, &output)
}

/// Fetch `request` from `source` and overwrite `output` when anything came back.
pub fn run_ingest<S>(
    source: &S,
    request: &FetchRequest,
    max_pages: usize,
    output: &Path,
) -> Result<IngestOutcome, AppError>
where
    S: PageSource + ?Sized,
{
    let series = fetch_demand(source, request, max_pages)
        .map_err(|e| AppError::new(e.kind(), format!("Failed to fetch data: {e}")))?;
    log::info!("Total rows fetched: {}", series.len());

    if series.is_empty() {
        log::warn!("No data found; leaving {} untouched", output.display());
        return Ok(IngestOutcome::Empty);
    }

    write_series_csv(output, &series)?;
    log::info!("Full history saved to {}", output.display());

    Ok(IngestOutcome::Written {
        path: output.to_path_buf(),
        rows: series.len(),
    })
}
