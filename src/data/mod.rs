//! Upstream data sources.
//!
//! `eia` holds the paginated demand fetcher and its HTTP client.

pub mod eia;

pub use eia::*;
