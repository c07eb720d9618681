//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section and key has a default, so an empty file is a valid
//! configuration. Secrets (API key, webhook URL) are referenced by env-var
//! name in the config and resolved at runtime.

use anyhow::{bail, Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::strategy::aggregate::TieBreak;
use crate::strategy::fair::MAX_HOME_BIAS;
use crate::strategy::kelly::KellyConfig;
use crate::strategy::rules::{Rule, Thresholds};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub feed: FeedConfig,
    pub report: ReportConfig,
    pub notify: NotifyConfig,
}

/// `[engine]`: everything the signal engine is built from.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngineConfig {
    /// Additive home-field nudge to the moneyline home probability.
    pub home_bias: f64,
    pub totals_tie_break: TieBreak,
    pub kelly_multiplier: f64,
    pub max_stake: f64,
    pub thresholds: Thresholds,
    /// Replaces the threshold-built table when present.
    pub rules: Option<Vec<Rule>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let kelly = KellyConfig::default();
        Self {
            home_bias: 0.0,
            totals_tie_break: TieBreak::default(),
            kelly_multiplier: kelly.multiplier,
            max_stake: kelly.max_stake,
            thresholds: Thresholds::default(),
            rules: None,
        }
    }
}

impl EngineConfig {
    pub fn kelly(&self) -> KellyConfig {
        KellyConfig {
            multiplier: self.kelly_multiplier,
            max_stake: self.max_stake,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=MAX_HOME_BIAS).contains(&self.home_bias) {
            bail!(
                "engine.home_bias must be within [0, {MAX_HOME_BIAS}], got {}",
                self.home_bias
            );
        }
        if !(self.kelly_multiplier > 0.0 && self.kelly_multiplier <= 1.0) {
            bail!(
                "engine.kelly_multiplier must be within (0, 1], got {}",
                self.kelly_multiplier
            );
        }
        if !(self.max_stake > 0.0 && self.max_stake <= 1.0) {
            bail!(
                "engine.max_stake must be within (0, 1], got {}",
                self.max_stake
            );
        }
        if let Some(rules) = &self.rules {
            if rules.is_empty() {
                bail!("engine.rules is present but empty");
            }
        }
        Ok(())
    }
}

/// Where odds come from.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeedSource {
    #[default]
    OddsApi,
    Snapshot,
}

/// `[feed]`
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeedConfig {
    pub source: FeedSource,
    pub sport: String,
    pub regions: String,
    pub markets: String,
    pub api_key_env: String,
    pub snapshot_path: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source: FeedSource::OddsApi,
            sport: "baseball_mlb".to_string(),
            regions: "us".to_string(),
            markets: "h2h,spreads,totals".to_string(),
            api_key_env: "ODDS_API_KEY".to_string(),
            snapshot_path: None,
            timeout_secs: 30,
        }
    }
}

/// `[report]`
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReportConfig {
    pub title: String,
    /// Display names for team labels. Unknown teams are shown as-is.
    pub team_names: HashMap<String, String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "MLB Betting Signals".to_string(),
            team_names: HashMap::new(),
        }
    }
}

/// `[notify]`
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NotifyConfig {
    /// Env var holding the Discord webhook URL. Unset or empty value
    /// falls back to printing the report.
    pub webhook_url_env: Option<String>,
    pub max_message_len: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url_env: Some("DISCORD_WEBHOOK".to_string()),
            max_message_len: 1900,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.engine.validate()?;
        if config.notify.max_message_len == 0 {
            bail!("notify.max_message_len must be positive");
        }
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<SecretString> {
        let value = std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))?;
        Ok(SecretString::new(value))
    }
}
