//! Write a demand series to CSV.
//!
//! The file is always replaced, never appended to: each run is an overwrite
//! backfill of the requested window.

use std::fs::{File, create_dir_all};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::DemandSeries;
use crate::error::AppError;

/// Overwrite `path` with the series, header row first.
///
/// Missing parent directories are created.
pub fn write_series_csv(path: &Path, series: &DemandSeries) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent).map_err(|e| {
            AppError::io(format!("Failed to create output directory '{}': {e}", parent.display()))
        })?;
    }

    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create output CSV '{}': {e}", path.display())))?;

    write_series(series, BufWriter::new(file))
        .map_err(|e| AppError::io(format!("Failed to write output CSV '{}': {e}", path.display())))
}

/// Write the series as CSV to any writer.
pub fn write_series(series: &DemandSeries, writer: impl Write) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(series.columns())?;
    for row in &series.rows {
        wtr.write_record(row.cells())?;
    }

    wtr.flush()?;
    Ok(())
}
