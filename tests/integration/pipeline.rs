//! End-to-end runs over the bundled MLB odds snapshot.

use chrono::{TimeZone, Utc};
use std::collections::HashMap;

use odds_signal::config::AppConfig;
use odds_signal::engine::cycle::{analyze_events, run_once};
use odds_signal::feed::snapshot::SnapshotFeed;
use odds_signal::feed::OddsFeed;
use odds_signal::notify::render::ReportRenderer;
use odds_signal::strategy::SignalEngine;
use odds_signal::types::{MarketStatus, ReportEntry, SignalCategory, Verdict};

use crate::mocks::{MockFeed, RecordingNotifier};

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/mlb_odds.json");

fn make_renderer() -> ReportRenderer {
    let names = HashMap::from([
        ("Chicago Cubs".to_string(), "小熊".to_string()),
        ("St. Louis Cardinals".to_string(), "紅雀".to_string()),
    ]);
    ReportRenderer::new("MLB Betting Signals", names)
}

#[tokio::test]
async fn test_snapshot_report_entries_in_feed_order() {
    let events = SnapshotFeed::new(FIXTURE).fetch_events().await.unwrap();
    assert_eq!(events.len(), 4);

    let report = analyze_events(&SignalEngine::default(), events);
    let kinds: Vec<(&str, bool)> = report
        .entries
        .iter()
        .map(|e| (e.game_id(), matches!(e, ReportEntry::Failed(_))))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("4f1b2c0e9a7d4e31b8c5a6d7e8f90123", false),
            ("7a9e3d21c4b04f5e9d8c7b6a5f4e3d21", true),
            ("c0ffee00d15ea5e0b0a7f00d12345678", false),
            ("0123456789abcdef0123456789abcdef", false),
        ]
    );

    let summary = report.summary();
    assert_eq!(summary.with_signals, 1);
    assert_eq!(summary.balanced, 1);
    assert_eq!(summary.no_usable_quotes, 1);
    assert_eq!(summary.failed, 1);
}

#[tokio::test]
async fn test_snapshot_signals_for_cubs_game() {
    let events = SnapshotFeed::new(FIXTURE).fetch_events().await.unwrap();
    let report = analyze_events(&SignalEngine::default(), events);
    let cubs = report.results().next().unwrap();

    assert_eq!(cubs.verdict, Verdict::Signals);
    assert_eq!(cubs.totals_line, Some(7.5));
    assert!((cubs.fair_home.unwrap() - 0.55).abs() < 1e-9);
    assert_eq!(cubs.coverage.spread, MarketStatus::Analyzed);

    let signals: Vec<(SignalCategory, &str)> = cubs
        .recommendations
        .iter()
        .map(|r| (r.category, r.subject.as_str()))
        .collect();
    assert_eq!(
        signals,
        vec![
            (SignalCategory::ValueMoneyline, "Chicago Cubs"),
            (SignalCategory::ContrarianUpset, "St. Louis Cardinals"),
            (SignalCategory::SpreadUnderdogHedge, "St. Louis Cardinals"),
            (SignalCategory::TotalsOver, "Over"),
            (SignalCategory::GenericValue, "Chicago Cubs"),
        ]
    );

    let generic = &cubs.recommendations[4];
    assert!((generic.evidence.edge - 0.045).abs() < 1e-9);
    assert!(generic.evidence.stake > 0.0);
}

#[tokio::test]
async fn test_run_once_posts_rendered_report() {
    let notifier = RecordingNotifier::new();
    let feed = SnapshotFeed::new(FIXTURE);

    run_once(&feed, &SignalEngine::default(), &make_renderer(), &notifier)
        .await
        .unwrap();

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    let text = &messages[0];
    assert!(text.starts_with("⚾ MLB Betting Signals"));
    assert!(text.contains("**紅雀 @ 小熊** (total: 7.5)"));
    assert!(text.contains("Value: 小熊 @ 1.90 (edge 4.5%)"));
    assert!(text.contains("Skipped:"));
    assert!(text.contains("Boston Red Sox @ New York Yankees: Malformed quote"));
    assert!(!text.contains("Market balanced"));
}

#[tokio::test]
async fn test_feed_failure_is_reported() {
    let mut feed = MockFeed::new();
    feed.expect_name().return_const("mock".to_string());
    feed.expect_fetch_events()
        .times(1)
        .returning(|| Err(anyhow::anyhow!("Odds API error 401 Unauthorized")));
    let notifier = RecordingNotifier::new();

    let result = run_once(&feed, &SignalEngine::default(), &make_renderer(), &notifier).await;

    assert!(result.is_err());
    assert_eq!(
        notifier.messages(),
        vec!["odds feed error: Odds API error 401 Unauthorized".to_string()]
    );
}

#[tokio::test]
async fn test_notifier_failure_propagates() {
    let notifier = RecordingNotifier::new();
    notifier.set_error("webhook down");
    let feed = SnapshotFeed::new(FIXTURE);

    let result = run_once(&feed, &SignalEngine::default(), &make_renderer(), &notifier).await;
    assert!(result.is_err());
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn test_stricter_config_changes_signals_not_code() {
    let cfg = AppConfig::from_toml_str(
        r#"
        [engine.thresholds]
        edge_generic_threshold = 0.10
        moneyline_value_price_floor = 2.50
        marginal_edge_min = 0.10
        contrarian_price_floor = 3.00
        spread_hedge_prob_floor = 0.49
        totals_over_price_ceiling = 1.80
        "#,
    )
    .unwrap();
    let engine = SignalEngine::from_config(&cfg.engine);
    let events = SnapshotFeed::new(FIXTURE).fetch_events().await.unwrap();
    let report = analyze_events(&engine, events);

    let cubs = report.results().next().unwrap();
    assert!(cubs.recommendations.is_empty());
    assert_eq!(cubs.verdict, Verdict::Balanced);
    assert!(!report.has_signals());

    let now = Utc.with_ymd_and_hms(2024, 6, 14, 18, 0, 0).unwrap();
    let text = make_renderer().render(&report, now);
    assert!(text.contains("Market balanced, no significant mispricing."));
}
