//! Request and series types.

use chrono::{Days, NaiveDate};
use serde_json::{Map, Value};

use crate::config::{BATCH_SIZE, DEFAULT_RESPONDENT, DEFAULT_SERIES_TYPE};
use crate::error::AppError;

/// Date format the EIA API expects for `start` / `end`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Output column names, in order.
pub const COLUMNS: [&str; 2] = ["timestamp", "demand"];

/// Upstream field renamed to `timestamp`.
pub const PERIOD_FIELD: &str = "period";
/// Upstream field renamed to `demand`.
pub const VALUE_FIELD: &str = "value";

/// One invocation's query: an inclusive date range for a single region/series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// `facets[respondent][]`, e.g. `CISO`.
    pub respondent: String,
    /// `facets[type][]`, e.g. `D` for demand.
    pub series_type: String,
    pub page_size: usize,
}

impl FetchRequest {
    /// Build a request for the default region/series.
    ///
    /// Fails when `start_date > end_date` or `page_size == 0`.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, AppError> {
        Self {
            start_date,
            end_date,
            respondent: DEFAULT_RESPONDENT.to_string(),
            series_type: DEFAULT_SERIES_TYPE.to_string(),
            page_size: BATCH_SIZE,
        }
        .validated()
    }

    /// `[today - days_back, today]`.
    pub fn days_back(today: NaiveDate, days_back: u32) -> Result<Self, AppError> {
        let start = today
            .checked_sub_days(Days::new(u64::from(days_back)))
            .ok_or_else(|| AppError::config(format!("days_back={days_back} is out of range.")))?;
        Self::new(start, today)
    }

    pub fn with_page_size(mut self, page_size: usize) -> Result<Self, AppError> {
        self.page_size = page_size;
        self.validated()
    }

    pub fn start_param(&self) -> String {
        self.start_date.format(DATE_FORMAT).to_string()
    }

    pub fn end_param(&self) -> String {
        self.end_date.format(DATE_FORMAT).to_string()
    }

    fn validated(self) -> Result<Self, AppError> {
        if self.start_date > self.end_date {
            return Err(AppError::config(format!(
                "start date {} is after end date {}.",
                self.start_date, self.end_date
            )));
        }
        if self.page_size == 0 {
            return Err(AppError::config("page size must be positive."));
        }
        Ok(self)
    }
}

/// One upstream observation as returned by the API.
pub type RawRecord = Map<String, Value>;

/// One output row. Values are kept exactly as the API sent them.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandRow {
    pub timestamp: Value,
    pub demand: Value,
}

impl DemandRow {
    /// Project a raw record onto `(period, value)`; every other field is dropped.
    ///
    /// A field the record lacks becomes `null` (an empty cell).
    pub fn from_record(record: &RawRecord) -> Self {
        let field = |name: &str| record.get(name).cloned().unwrap_or(Value::Null);
        Self {
            timestamp: field(PERIOD_FIELD),
            demand: field(VALUE_FIELD),
        }
    }

    /// CSV cells for this row, in `COLUMNS` order.
    pub fn cells(&self) -> [String; 2] {
        [cell(&self.timestamp), cell(&self.demand)]
    }
}

/// Render a JSON value as a CSV cell without coercing it.
///
/// Strings are written bare, `null` becomes an empty cell, anything else keeps
/// its JSON text.
pub fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Ordered `(timestamp, demand)` rows in upstream order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemandSeries {
    pub rows: Vec<DemandRow>,
}

impl DemandSeries {
    /// Project records onto the two output columns.
    ///
    /// Fails only when a column appears in none of a non-empty batch.
    pub fn from_records(records: &[RawRecord]) -> Result<Self, AppError> {
        if !records.is_empty() {
            for name in [PERIOD_FIELD, VALUE_FIELD] {
                if !records.iter().any(|r| r.contains_key(name)) {
                    return Err(AppError::data(format!("No record carries the '{name}' field.")));
                }
            }
        }
        let rows = records.iter().map(DemandRow::from_record).collect();
        Ok(Self { rows })
    }

    pub fn columns(&self) -> [&'static str; 2] {
        COLUMNS
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
