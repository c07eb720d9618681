//! The Odds API v4 wire format.
//!
//! `GET /v4/sports/{sport}/odds` returns an array of events, each with
//! per-bookmaker markets keyed `h2h`, `spreads` or `totals`. Only the
//! fields the engine needs are deserialized; conversion into [`Game`]
//! applies the quote invariants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::QuoteError;
use crate::types::{BookmakerQuote, Game, GameFailure, MarketKind, MarketOutcome};

/// Map an upstream market key to the engine's market kind. `None` for
/// keys the engine does not analyze (e.g. `outrights`, `h2h_lay`).
pub fn market_kind(key: &str) -> Option<MarketKind> {
    match key {
        "h2h" => Some(MarketKind::Moneyline),
        "spreads" => Some(MarketKind::Spread),
        "totals" => Some(MarketKind::Totals),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsEvent {
    pub id: String,
    #[serde(default)]
    pub sport_key: Option<String>,
    #[serde(default)]
    pub commence_time: Option<DateTime<Utc>>,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub bookmakers: Vec<WireBookmaker>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireBookmaker {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub markets: Vec<WireMarket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMarket {
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<WireOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireOutcome {
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<f64>,
}

impl WireBookmaker {
    fn display_name(&self) -> &str {
        if self.title.is_empty() {
            &self.key
        } else {
            &self.title
        }
    }

    fn to_quote(&self) -> Result<BookmakerQuote, QuoteError> {
        let name = self.display_name().to_string();
        let mut outcomes = Vec::new();

        for market in &self.markets {
            let Some(kind) = market_kind(&market.key) else {
                debug!(bookmaker = %name, market = %market.key, "Skipping unsupported market");
                continue;
            };
            for o in &market.outcomes {
                let outcome = MarketOutcome::new(kind, o.name.clone(), o.price, o.point)
                    .map_err(|e| match e {
                        QuoteError::MalformedQuote(reason) => {
                            QuoteError::malformed(format!("{name}: {reason}"))
                        }
                        other => other,
                    })?;
                outcomes.push(outcome);
            }
        }

        BookmakerQuote::new(name, outcomes)
    }
}

impl OddsEvent {
    /// Build an engine game. Any malformed bookmaker rejects the whole
    /// event; the event itself stays intact for the failure note.
    pub fn to_game(&self) -> Result<Game, QuoteError> {
        let quotes = self
            .bookmakers
            .iter()
            .map(WireBookmaker::to_quote)
            .collect::<Result<Vec<_>, _>>()?;

        let game = Game::new(
            self.id.clone(),
            self.home_team.clone(),
            self.away_team.clone(),
            quotes,
        )?;
        Ok(match self.commence_time {
            Some(t) => game.with_commence_time(t),
            None => game,
        })
    }

    /// Failure note for an event that could not be converted.
    pub fn failure(&self, error: &QuoteError) -> GameFailure {
        GameFailure {
            game_id: self.id.clone(),
            home: self.home_team.clone(),
            away: self.away_team.clone(),
            reason: error.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OVER, UNDER};

    const EVENT_JSON: &str = r#"{
        "id": "e912304de2b2ce35b473ce2ecd3d1502",
        "sport_key": "baseball_mlb",
        "sport_title": "MLB",
        "commence_time": "2024-06-14T23:05:00Z",
        "home_team": "New York Yankees",
        "away_team": "Boston Red Sox",
        "bookmakers": [
            {
                "key": "draftkings",
                "title": "DraftKings",
                "last_update": "2024-06-14T18:40:11Z",
                "markets": [
                    {"key": "h2h", "outcomes": [
                        {"name": "Boston Red Sox", "price": 2.3},
                        {"name": "New York Yankees", "price": 1.65}
                    ]},
                    {"key": "spreads", "outcomes": [
                        {"name": "Boston Red Sox", "price": 1.62, "point": 1.5},
                        {"name": "New York Yankees", "price": 2.35, "point": -1.5}
                    ]},
                    {"key": "totals", "outcomes": [
                        {"name": "Over", "price": 1.91, "point": 8.5},
                        {"name": "Under", "price": 1.91, "point": 8.5}
                    ]},
                    {"key": "h2h_lay", "outcomes": [
                        {"name": "Boston Red Sox", "price": 2.4}
                    ]}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_event_converts_to_game() {
        let event: OddsEvent = serde_json::from_str(EVENT_JSON).unwrap();
        let game = event.to_game().unwrap();

        assert_eq!(game.home(), "New York Yankees");
        assert_eq!(game.away(), "Boston Red Sox");
        assert!(game.commence_time().is_some());
        assert_eq!(game.quotes().len(), 1);

        let quote = &game.quotes()[0];
        assert_eq!(quote.bookmaker(), "DraftKings");
        assert_eq!(quote.outcomes(MarketKind::Moneyline).count(), 2);
        assert_eq!(quote.outcomes(MarketKind::Spread).count(), 2);
        let totals: Vec<_> = quote.outcomes(MarketKind::Totals).collect();
        assert_eq!(totals[0].side(), OVER);
        assert_eq!(totals[1].side(), UNDER);
        assert_eq!(totals[0].point(), Some(8.5));
        // h2h_lay skipped, so no single-sided market error either
        assert_eq!(quote.all_outcomes().len(), 6);
    }

    #[test]
    fn test_totals_without_point_rejects_event() {
        let json = r#"{
            "id": "x", "home_team": "A", "away_team": "B",
            "bookmakers": [{"key": "fanduel", "markets": [
                {"key": "totals", "outcomes": [
                    {"name": "Over", "price": 1.9},
                    {"name": "Under", "price": 1.9}
                ]}
            ]}]
        }"#;
        let event: OddsEvent = serde_json::from_str(json).unwrap();
        let err = event.to_game().unwrap_err();
        assert!(matches!(err, QuoteError::MalformedQuote(_)));
        // Untitled bookmaker falls back to its key
        assert!(err.to_string().contains("fanduel"));

        let failure = event.failure(&err);
        assert_eq!(failure.game_id, "x");
        assert!(failure.reason.starts_with("Malformed quote"));
    }

    #[test]
    fn test_event_without_bookmakers() {
        let json = r#"{"id": "y", "home_team": "A", "away_team": "B"}"#;
        let event: OddsEvent = serde_json::from_str(json).unwrap();
        let game = event.to_game().unwrap();
        assert!(game.quotes().is_empty());
        assert!(game.commence_time().is_none());
    }

    #[test]
    fn test_market_kind_mapping() {
        assert_eq!(market_kind("h2h"), Some(MarketKind::Moneyline));
        assert_eq!(market_kind("spreads"), Some(MarketKind::Spread));
        assert_eq!(market_kind("totals"), Some(MarketKind::Totals));
        assert_eq!(market_kind("outrights"), None);
    }
}
