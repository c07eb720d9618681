//! Signal engine: quotes in, classified recommendations out.

pub mod aggregate;
pub mod edge;
pub mod fair;
pub mod kelly;
pub mod rules;

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::QuoteError;
use crate::types::{
    AnalysisResult, Game, GameFailure, MarketCoverage, MarketKind, MarketStatus, ReportEntry,
    Verdict, OVER, UNDER,
};
use aggregate::{AggregatedMarkets, Aggregator};
use edge::{Edge, EdgeCalculator};
use fair::{FairProbability, FairProbabilityEstimator, HomeFieldBias, NoBias, ProbabilityBias};
use kelly::KellyCalculator;
use rules::{RuleTable, SignalCandidates};

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Pipelines aggregation → fair probability → edge/stake → rule table
/// for one game at a time.
///
/// Holds configuration only. Every call is a pure function of the game
/// passed in, so games can be analyzed in any order.
#[derive(Debug)]
pub struct SignalEngine {
    aggregator: Aggregator,
    estimator: FairProbabilityEstimator,
    edges: EdgeCalculator,
    rules: RuleTable,
}

/// Priced sides of one market plus how the market fared.
struct MarketPass {
    status: MarketStatus,
    sides: Vec<Edge>,
}

impl MarketPass {
    fn analyzed(sides: Vec<Edge>) -> Self {
        Self {
            status: MarketStatus::Analyzed,
            sides,
        }
    }

    fn absent() -> Self {
        Self {
            status: MarketStatus::Absent,
            sides: Vec::new(),
        }
    }

    fn not_analyzed(reason: impl Into<String>) -> Self {
        Self {
            status: MarketStatus::NotAnalyzed {
                reason: reason.into(),
            },
            sides: Vec::new(),
        }
    }
}

impl Default for SignalEngine {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl SignalEngine {
    pub fn new(
        aggregator: Aggregator,
        estimator: FairProbabilityEstimator,
        edges: EdgeCalculator,
        rules: RuleTable,
    ) -> Self {
        Self {
            aggregator,
            estimator,
            edges,
            rules,
        }
    }

    /// Build the engine from `[engine]` configuration. A custom rule
    /// table replaces the threshold-built one entirely.
    pub fn from_config(config: &EngineConfig) -> Self {
        let bias: Box<dyn ProbabilityBias> = if config.home_bias > 0.0 {
            Box::new(HomeFieldBias::new(config.home_bias))
        } else {
            Box::new(NoBias)
        };
        let rules = match &config.rules {
            Some(custom) => RuleTable::new(custom.clone()),
            None => RuleTable::from_thresholds(&config.thresholds),
        };
        Self::new(
            Aggregator::new(config.totals_tie_break),
            FairProbabilityEstimator::new(bias),
            EdgeCalculator::new(KellyCalculator::new(config.kelly())),
            rules,
        )
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Analyze a single game.
    ///
    /// Only `MalformedQuote` escapes; missing market data downgrades the
    /// affected market to not-analyzed instead.
    pub fn analyze_game(&self, game: &Game) -> Result<AnalysisResult, QuoteError> {
        game.validate()?;

        if game.quotes().is_empty() {
            debug!(game_id = game.id(), "No bookmakers quoted, nothing to analyze");
            return Ok(AnalysisResult::unanalyzed(game));
        }

        let markets = self.aggregator.aggregate(game);
        let totals_line = markets.totals.as_ref().map(|t| t.line);

        let (moneyline, fair) = self.moneyline_pass(game, &markets, totals_line);
        let spread = self.spread_pass(game, &markets, fair.as_ref());
        let totals = self.totals_pass(&markets);

        let coverage = MarketCoverage {
            moneyline: moneyline.status,
            spread: spread.status,
            totals: totals.status,
        };
        let candidates = SignalCandidates {
            moneyline: moneyline.sides,
            spread: spread.sides,
            totals: totals.sides,
        };
        let recommendations = self.rules.classify(&candidates);

        let verdict = if !recommendations.is_empty() {
            Verdict::Signals
        } else if coverage.any_analyzed() {
            Verdict::Balanced
        } else {
            Verdict::NoUsableQuotes
        };

        debug!(
            game_id = game.id(),
            signals = recommendations.len(),
            verdict = ?verdict,
            "Game analyzed"
        );

        Ok(AnalysisResult {
            game_id: game.id().to_string(),
            home: game.home().to_string(),
            away: game.away().to_string(),
            totals_line,
            fair_home: fair.map(|f| f.first),
            fair_away: fair.map(|f| f.second),
            coverage,
            verdict,
            recommendations,
        })
    }

    /// Analyze a game, turning a malformed quote into a failure note.
    pub fn analyze_entry(&self, game: &Game) -> ReportEntry {
        match self.analyze_game(game) {
            Ok(result) => ReportEntry::Analyzed(result),
            Err(e) => {
                warn!(game_id = game.id(), error = %e, "Skipping game");
                ReportEntry::Failed(GameFailure {
                    game_id: game.id().to_string(),
                    home: game.home().to_string(),
                    away: game.away().to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Analyze a batch in supplied order. One bad game never aborts the
    /// rest.
    pub fn analyze_batch(&self, games: &[Game]) -> Vec<ReportEntry> {
        let entries: Vec<ReportEntry> = games.iter().map(|g| self.analyze_entry(g)).collect();

        info!(
            games = games.len(),
            failed = entries
                .iter()
                .filter(|e| matches!(e, ReportEntry::Failed(_)))
                .count(),
            "Batch analyzed"
        );

        entries
    }

    // -- Market passes ---------------------------------------------------

    fn moneyline_pass(
        &self,
        game: &Game,
        markets: &AggregatedMarkets,
        totals_line: Option<f64>,
    ) -> (MarketPass, Option<FairProbability>) {
        let ml = &markets.moneyline;
        if ml.is_absent() {
            return (MarketPass::absent(), None);
        }

        let fair = match self.estimator.moneyline(
            (game.home(), ml.home.as_ref()),
            (game.away(), ml.away.as_ref()),
        ) {
            Ok(fair) => fair,
            Err(e) => {
                debug!(game_id = game.id(), error = %e, "Moneyline not analyzed");
                return (MarketPass::not_analyzed(e.to_string()), None);
            }
        };

        // Both sides exist once the estimator succeeded
        let sides = match (ml.home, ml.away) {
            (Some(home), Some(away)) => vec![
                self.edges
                    .price_side(game.home(), fair.first, home.best_price, totals_line),
                self.edges
                    .price_side(game.away(), fair.second, away.best_price, totals_line),
            ],
            _ => Vec::new(),
        };

        (MarketPass::analyzed(sides), Some(fair))
    }

    fn spread_pass(
        &self,
        game: &Game,
        markets: &AggregatedMarkets,
        win: Option<&FairProbability>,
    ) -> MarketPass {
        let Some(spread) = &markets.spread else {
            return MarketPass::absent();
        };

        let cover = match self.estimator.two_way(
            MarketKind::Spread,
            (game.home(), spread.home.as_ref().map(|s| &s.side)),
            (game.away(), spread.away.as_ref().map(|s| &s.side)),
        ) {
            Ok(cover) => cover,
            Err(e) => {
                return MarketPass::not_analyzed(format!(
                    "reference bookmaker {}: {e}",
                    spread.bookmaker
                ))
            }
        };

        let Some(win) = win else {
            return MarketPass::not_analyzed("spread signals need a moneyline win probability");
        };

        match (spread.home, spread.away) {
            (Some(home), Some(away)) => MarketPass::analyzed(vec![
                self.edges
                    .price_side(game.home(), cover.first, home.side.best_price, Some(home.point))
                    .gated_on(win.first),
                self.edges
                    .price_side(game.away(), cover.second, away.side.best_price, Some(away.point))
                    .gated_on(win.second),
            ]),
            _ => MarketPass::not_analyzed("reference spread is one-sided"),
        }
    }

    fn totals_pass(&self, markets: &AggregatedMarkets) -> MarketPass {
        let Some(totals) = &markets.totals else {
            return MarketPass::absent();
        };

        match self.estimator.two_way(
            MarketKind::Totals,
            (OVER, Some(&totals.over)),
            (UNDER, Some(&totals.under)),
        ) {
            Ok(fair) => MarketPass::analyzed(vec![
                self.edges
                    .price_side(OVER, fair.first, totals.over.best_price, Some(totals.line)),
                self.edges
                    .price_side(UNDER, fair.second, totals.under.best_price, Some(totals.line)),
            ]),
            Err(e) => MarketPass::not_analyzed(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
