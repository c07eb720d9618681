//! Offline feed reading a saved Odds API response from disk.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use super::{OddsEvent, OddsFeed};

pub struct SnapshotFeed {
    path: PathBuf,
}

impl SnapshotFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl OddsFeed for SnapshotFeed {
    async fn fetch_events(&self) -> Result<Vec<OddsEvent>> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read snapshot: {}", self.path.display()))?;
        let events: Vec<OddsEvent> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse snapshot: {}", self.path.display()))?;

        info!(path = %self.path.display(), events = events.len(), "Loaded odds snapshot");
        Ok(events)
    }

    fn name(&self) -> String {
        format!("snapshot:{}", self.path.display())
    }
}
