//! One fetch → analyze → render → notify pass.

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info, warn};

use super::report::{Report, ReportAssembler};
use crate::feed::{OddsEvent, OddsFeed};
use crate::notify::render::ReportRenderer;
use crate::notify::Notifier;
use crate::strategy::SignalEngine;
use crate::types::ReportEntry;

/// Convert and analyze upstream events in order. An event that fails
/// conversion becomes a failure entry; the rest still run.
pub fn analyze_events(engine: &SignalEngine, events: Vec<OddsEvent>) -> Report {
    let entries: Vec<ReportEntry> = events
        .into_iter()
        .map(|event| match event.to_game() {
            Ok(game) => engine.analyze_entry(&game),
            Err(e) => {
                warn!(game_id = %event.id, error = %e, "Rejecting event");
                ReportEntry::Failed(event.failure(&e))
            }
        })
        .collect();
    ReportAssembler::assemble(entries)
}

/// Run a single cycle. A feed error is reported through the notifier and
/// returned; nothing is analyzed in that case.
pub async fn run_once(
    feed: &dyn OddsFeed,
    engine: &SignalEngine,
    renderer: &ReportRenderer,
    notifier: &dyn Notifier,
) -> Result<Report> {
    info!(feed = %feed.name(), notifier = %notifier.name(), "Cycle starting");

    let events = match feed.fetch_events().await {
        Ok(events) => events,
        Err(e) => {
            error!(error = %e, "Odds feed failed");
            if let Err(notify_err) = notifier.send(&format!("odds feed error: {e}")).await {
                warn!(error = %notify_err, "Failed to deliver feed error notice");
            }
            return Err(e.context("odds feed failed"));
        }
    };

    let report = analyze_events(engine, events);
    let text = renderer.render(&report, Utc::now());
    notifier.send(&text).await?;

    let summary = report.summary();
    info!(
        analyzed = summary.analyzed,
        with_signals = summary.with_signals,
        failed = summary.failed,
        "Cycle complete"
    );

    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
