//! Odds Signal: one-shot MLB betting signal run.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! builds the odds feed, signal engine and notifier, then runs a single
//! fetch → analyze → render → notify cycle.

use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use tracing::{info, warn};

use odds_signal::config::{AppConfig, FeedSource, NotifyConfig};
use odds_signal::engine::cycle;
use odds_signal::feed::odds_api::OddsApiClient;
use odds_signal::feed::snapshot::SnapshotFeed;
use odds_signal::feed::OddsFeed;
use odds_signal::notify::discord::DiscordWebhook;
use odds_signal::notify::render::ReportRenderer;
use odds_signal::notify::{ConsoleNotifier, Notifier};
use odds_signal::strategy::SignalEngine;

const CONFIG_PATH_ENV: &str = "ODDS_SIGNAL_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = AppConfig::load(&config_path)?;

    init_logging();

    info!(
        config = %config_path,
        sport = %cfg.feed.sport,
        source = ?cfg.feed.source,
        home_bias = cfg.engine.home_bias,
        custom_rules = cfg.engine.rules.is_some(),
        "Odds Signal starting up"
    );

    // -- Initialise components -------------------------------------------

    let feed = build_feed(&cfg)?;
    let engine = SignalEngine::from_config(&cfg.engine);
    info!(rules = engine.rules().rules().len(), "Signal engine ready");
    let renderer = ReportRenderer::from_config(&cfg.report);
    let notifier = build_notifier(&cfg.notify)?;

    // -- Run one cycle ---------------------------------------------------

    let report = cycle::run_once(feed.as_ref(), &engine, &renderer, notifier.as_ref()).await?;

    let summary = report.summary();
    info!(
        analyzed = summary.analyzed,
        with_signals = summary.with_signals,
        balanced = summary.balanced,
        failed = summary.failed,
        "Done"
    );

    Ok(())
}

fn build_feed(cfg: &AppConfig) -> Result<Box<dyn OddsFeed>> {
    match cfg.feed.source {
        FeedSource::OddsApi => Ok(Box::new(OddsApiClient::from_config(&cfg.feed)?)),
        FeedSource::Snapshot => {
            let path = cfg
                .feed
                .snapshot_path
                .clone()
                .context("feed.snapshot_path is required when feed.source = \"snapshot\"")?;
            Ok(Box::new(SnapshotFeed::new(path)))
        }
    }
}

/// Discord when the webhook env var holds a URL, stdout otherwise.
fn build_notifier(cfg: &NotifyConfig) -> Result<Box<dyn Notifier>> {
    let webhook = cfg
        .webhook_url_env
        .as_deref()
        .and_then(|env| AppConfig::resolve_env(env).ok())
        .filter(|url| !url.expose_secret().trim().is_empty());

    match webhook {
        Some(url) => Ok(Box::new(DiscordWebhook::new(url, cfg.max_message_len)?)),
        None => {
            warn!("No Discord webhook configured, printing report to stdout");
            Ok(Box::new(ConsoleNotifier))
        }
    }
}

/// Initialise the tracing subscriber with env-filter and optional JSON output.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("odds_signal=info"));

    let json_logging = std::env::var("ODDS_SIGNAL_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
