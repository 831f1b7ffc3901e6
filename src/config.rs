//! Runtime configuration.
//!
//! Nothing here is global: `Settings` is resolved once per invocation from the
//! environment (and an optional `.env`), then handed down explicitly.

use std::path::PathBuf;

use crate::error::AppError;

pub const API_KEY_VAR: &str = "EIA_API_KEY";
pub const RAW_DIR_VAR: &str = "GRID_PULSE_RAW_DIR";
pub const ENDPOINT_VAR: &str = "GRID_PULSE_ENDPOINT";

pub const DEFAULT_ENDPOINT: &str = "https://api.eia.gov/v2/electricity/rto/region-data/data/";
pub const DEFAULT_RAW_DIR: &str = "data/raw";
pub const DEFAULT_OUTPUT_FILENAME: &str = "demand_history.csv";

/// EIA v2 maximum page length.
pub const BATCH_SIZE: usize = 5000;
/// Upper bound on pages per fetch. Far above any realistic date range.
pub const MAX_PAGES: usize = 10_000;

/// California ISO.
pub const DEFAULT_RESPONDENT: &str = "CISO";
/// `D` = demand.
pub const DEFAULT_SERIES_TYPE: &str = "D";

/// Everything the fetcher needs besides the request itself.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub api_key: String,
    pub endpoint: String,
    pub max_pages: usize,
}

impl FetchConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_pages: MAX_PAGES,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Per-invocation settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub fetch: FetchConfig,
    pub raw_dir: PathBuf,
}

impl Settings {
    /// Load `.env` (if any) and read settings from the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve settings through an arbitrary variable lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get(API_KEY_VAR)
            .ok_or_else(|| AppError::config(format!("{API_KEY_VAR} not found in environment.")))?;

        let mut fetch = FetchConfig::new(api_key);
        if let Some(endpoint) = get(ENDPOINT_VAR) {
            fetch = fetch.with_endpoint(endpoint);
        }

        let raw_dir = get(RAW_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RAW_DIR));

        Ok(Self { fetch, raw_dir })
    }
}
