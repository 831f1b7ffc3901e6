//! Domain types shared by the fetcher, the exporter and the entrypoint.
//!
//! - `FetchRequest`: one invocation's date range and facets
//! - `RawRecord`: an upstream observation, untouched
//! - `DemandSeries`: the normalized `(timestamp, demand)` output

pub mod types;

pub use types::*;
