//! The Odds API client.
//!
//! API docs: https://the-odds-api.com/liveapi/guides/v4/
//! Base URL: https://api.the-odds-api.com/v4/
//! Auth: `apiKey` query parameter. Every request spends quota; the
//! remaining balance comes back in the `x-requests-remaining` header.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, info};

use super::{OddsEvent, OddsFeed};
use crate::config::{AppConfig, FeedConfig};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://api.the-odds-api.com/v4";
const FEED_NAME: &str = "the-odds-api";

/// Prices are always requested in decimal format.
const ODDS_FORMAT: &str = "decimal";

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct OddsApiClient {
    http: Client,
    api_key: SecretString,
    base_url: String,
    sport: String,
    regions: String,
    markets: String,
}

impl OddsApiClient {
    pub fn new(api_key: SecretString, config: &FeedConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("odds-signal/0.1.0")
            .build()
            .context("Failed to build HTTP client for The Odds API")?;

        Ok(Self {
            http,
            api_key,
            base_url: BASE_URL.to_string(),
            sport: config.sport.clone(),
            regions: config.regions.clone(),
            markets: config.markets.clone(),
        })
    }

    /// Build the client with the key named by `feed.api_key_env`.
    pub fn from_config(config: &FeedConfig) -> Result<Self> {
        let api_key = AppConfig::resolve_env(&config.api_key_env)?;
        Self::new(api_key, config)
    }

    /// Point the client at another host (a local mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn odds_url(&self) -> String {
        format!("{}/sports/{}/odds", self.base_url, self.sport)
    }
}

#[async_trait]
impl OddsFeed for OddsApiClient {
    async fn fetch_events(&self) -> Result<Vec<OddsEvent>> {
        let url = self.odds_url();
        debug!(url = %url, markets = %self.markets, "Fetching odds");

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("apiKey", self.api_key.expose_secret().as_str()),
                ("regions", self.regions.as_str()),
                ("markets", self.markets.as_str()),
                ("oddsFormat", ODDS_FORMAT),
            ])
            .send()
            .await
            .context("Odds API request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Odds API error {status}: {body}");
        }

        let remaining = resp
            .headers()
            .get("x-requests-remaining")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let events: Vec<OddsEvent> = resp
            .json()
            .await
            .context("Failed to parse Odds API response")?;

        info!(
            sport = %self.sport,
            events = events.len(),
            requests_remaining = remaining.as_deref().unwrap_or("unknown"),
            "Fetched odds"
        );

        Ok(events)
    }

    fn name(&self) -> String {
        FEED_NAME.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
