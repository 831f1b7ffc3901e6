//! EIA v2 hourly demand fetcher.
//!
//! The fetch is a plain offset-paginated loop over `electricity/rto/region-data`.
//! Transport failures abort the whole fetch; there is no retry here (the
//! scheduler retries whole invocations). An envelope without `response.data`
//! stops pagination and returns what was gathered so far.

use reqwest::blocking::Client;
use serde_json::Value;

use crate::config::FetchConfig;
use crate::domain::{DemandSeries, FetchRequest, RawRecord};
use crate::error::AppError;

/// One page of upstream results, addressed by offset.
///
/// Implemented by [`EiaClient`] over HTTP; tests supply scripted pages.
pub trait PageSource {
    /// Return the decoded JSON envelope for the page starting at `offset`.
    fn fetch_page(&self, request: &FetchRequest, offset: usize) -> Result<Value, AppError>;
}

pub struct EiaClient {
    client: Client,
    config: FetchConfig,
}

impl EiaClient {
    /// Uses the client's default timeouts.
    pub fn new(config: FetchConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn with_client(client: Client, config: FetchConfig) -> Self {
        Self { client, config }
    }

    /// Fetch the full demand series for `request`.
    pub fn fetch_demand(&self, request: &FetchRequest) -> Result<DemandSeries, AppError> {
        fetch_demand(self, request, self.config.max_pages)
    }

    fn page_query(&self, request: &FetchRequest, offset: usize) -> Vec<(&'static str, String)> {
        vec![
            ("api_key", self.config.api_key.clone()),
            ("frequency", "hourly".to_string()),
            ("data[0]", "value".to_string()),
            ("facets[respondent][]", request.respondent.clone()),
            ("facets[type][]", request.series_type.clone()),
            ("start", request.start_param()),
            ("end", request.end_param()),
            ("sort[0][column]", "period".to_string()),
            ("sort[0][direction]", "asc".to_string()),
            ("offset", offset.to_string()),
            ("length", request.page_size.to_string()),
        ]
    }
}

impl PageSource for EiaClient {
    fn fetch_page(&self, request: &FetchRequest, offset: usize) -> Result<Value, AppError> {
        // `without_url` keeps the api_key query parameter out of error messages.
        let resp = self
            .client
            .get(&self.config.endpoint)
            .query(&self.page_query(request, offset))
            .send()
            .map_err(|e| AppError::transport(format!("EIA request failed: {}", e.without_url())))?;

        if !resp.status().is_success() {
            return Err(AppError::transport(format!(
                "EIA request failed with status {}.",
                resp.status()
            )));
        }

        resp.json::<Value>()
            .map_err(|e| AppError::transport(format!("Failed to parse EIA response: {}", e.without_url())))
    }
}

/// Paginate `source` until a short page, an empty page or a malformed envelope.
///
/// `max_pages` bounds the loop; running into it is a transport error.
pub fn fetch_demand<S>(source: &S, request: &FetchRequest, max_pages: usize) -> Result<DemandSeries, AppError>
where
    S: PageSource + ?Sized,
{
    log::info!(
        "Fetching data from {} to {}...",
        request.start_param(),
        request.end_param()
    );

    let mut records: Vec<RawRecord> = Vec::new();
    let mut offset = 0;
    let mut pages = 0;

    loop {
        if pages == max_pages {
            return Err(AppError::transport(format!(
                "Pagination did not terminate after {max_pages} full pages."
            )));
        }
        pages += 1;

        let envelope = source.fetch_page(request, offset)?;

        let Some(page) = page_records(&envelope)? else {
            log::error!("Invalid API response structure (missing response.data); keeping {} rows", records.len());
            break;
        };

        if page.is_empty() {
            break;
        }

        let n = page.len();
        records.extend(page);
        log::info!("Fetched batch of {n} rows (total so far: {})", records.len());

        if n < request.page_size {
            break;
        }
        offset += request.page_size;
    }

    DemandSeries::from_records(&records)
}

/// Pull `response.data` out of an envelope.
///
/// `Ok(None)` means the envelope has the wrong shape. A data array holding
/// something other than objects is a data error.
fn page_records(envelope: &Value) -> Result<Option<Vec<RawRecord>>, AppError> {
    let Some(data) = envelope
        .get("response")
        .and_then(|r| r.get("data"))
        .and_then(Value::as_array)
    else {
        return Ok(None);
    };

    data.iter()
        .map(|item| {
            item.as_object()
                .cloned()
                .ok_or_else(|| AppError::data(format!("Expected a JSON object record, got {item}")))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}
