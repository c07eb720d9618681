//! Odds feeds.
//!
//! Defines the `OddsFeed` trait and provides implementations for:
//! - The Odds API v4 (live HTTP)
//! - JSON snapshots on disk (offline runs and fixtures)

pub mod odds_api;
pub mod snapshot;
pub mod wire;

use anyhow::Result;
use async_trait::async_trait;

pub use wire::OddsEvent;

/// Source of upcoming events with bookmaker quotes.
///
/// Implementors own any retry policy; the engine sees either a full list
/// of events or an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OddsFeed: Send + Sync {
    /// Fetch every event currently offered.
    async fn fetch_events(&self) -> Result<Vec<OddsEvent>>;

    /// Feed name for logging and identification.
    fn name(&self) -> String;
}
