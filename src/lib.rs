//! Odds Signal: multi-bookmaker odds aggregation and betting signals.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod error;
pub mod types;
pub mod strategy;
pub mod engine;
pub mod feed;
pub mod notify;
