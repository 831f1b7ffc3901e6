//! `grid-pulse` library crate.
//!
//! The binary is a thin wrapper around this library so that:
//!
//! - the fetch/normalize core is testable without spawning processes
//! - the daily scheduler and the one-shot command share one pipeline

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod schedule;
