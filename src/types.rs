//! Shared types for the odds signal engine.
//!
//! Two halves: the quote model that feeds hand in (validated on
//! construction) and the analysis output the renderer consumes. Every
//! strategy and engine module depends on these, never the reverse.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::QuoteError;

/// Side label used by totals markets for the over outcome.
pub const OVER: &str = "Over";
/// Side label used by totals markets for the under outcome.
pub const UNDER: &str = "Under";

// ---------------------------------------------------------------------------
// Market kind
// ---------------------------------------------------------------------------

/// The three market types the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketKind {
    Moneyline,
    Spread,
    Totals,
}

impl MarketKind {
    pub const ALL: &'static [MarketKind] =
        &[MarketKind::Moneyline, MarketKind::Spread, MarketKind::Totals];

    /// Whether outcomes of this kind carry a point value.
    pub fn has_point(&self) -> bool {
        !matches!(self, MarketKind::Moneyline)
    }
}

impl fmt::Display for MarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketKind::Moneyline => write!(f, "moneyline"),
            MarketKind::Spread => write!(f, "spread"),
            MarketKind::Totals => write!(f, "totals"),
        }
    }
}

// ---------------------------------------------------------------------------
// Quote model
// ---------------------------------------------------------------------------

/// One priced side of one market at one bookmaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOutcome {
    kind: MarketKind,
    side: String,
    /// Decimal price: payout multiplier including the stake.
    price: f64,
    /// Signed handicap for spreads, the runs line for totals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    point: Option<f64>,
}

impl MarketOutcome {
    pub fn new(
        kind: MarketKind,
        side: impl Into<String>,
        price: f64,
        point: Option<f64>,
    ) -> Result<Self, QuoteError> {
        let outcome = Self {
            kind,
            side: side.into(),
            price,
            point,
        };
        outcome.validate()?;
        Ok(outcome)
    }

    /// Moneyline outcome for a team.
    pub fn moneyline(team: impl Into<String>, price: f64) -> Result<Self, QuoteError> {
        Self::new(MarketKind::Moneyline, team, price, None)
    }

    /// Spread outcome for a team at a signed handicap.
    pub fn spread(team: impl Into<String>, point: f64, price: f64) -> Result<Self, QuoteError> {
        Self::new(MarketKind::Spread, team, price, Some(point))
    }

    /// Totals outcome; `side` is [`OVER`] or [`UNDER`].
    pub fn totals(side: impl Into<String>, line: f64, price: f64) -> Result<Self, QuoteError> {
        Self::new(MarketKind::Totals, side, price, Some(line))
    }

    pub fn validate(&self) -> Result<(), QuoteError> {
        if !self.price.is_finite() || self.price <= 1.0 {
            return Err(QuoteError::malformed(format!(
                "{} price {} for '{}' is not a decimal price above 1.0",
                self.kind, self.price, self.side
            )));
        }
        if self.kind.has_point() {
            match self.point {
                Some(p) if p.is_finite() => {}
                _ => {
                    return Err(QuoteError::malformed(format!(
                        "{} outcome '{}' has no usable point value",
                        self.kind, self.side
                    )))
                }
            }
        }
        Ok(())
    }

    pub fn kind(&self) -> MarketKind {
        self.kind
    }

    pub fn side(&self) -> &str {
        &self.side
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn point(&self) -> Option<f64> {
        self.point
    }
}

/// Everything one bookmaker quotes for a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmakerQuote {
    bookmaker: String,
    #[serde(default)]
    outcomes: Vec<MarketOutcome>,
}

impl BookmakerQuote {
    pub fn new(
        bookmaker: impl Into<String>,
        outcomes: Vec<MarketOutcome>,
    ) -> Result<Self, QuoteError> {
        let quote = Self {
            bookmaker: bookmaker.into(),
            outcomes,
        };
        quote.validate()?;
        Ok(quote)
    }

    /// Every outcome must be priced, and every market kind that appears
    /// must carry at least both sides.
    pub fn validate(&self) -> Result<(), QuoteError> {
        for outcome in &self.outcomes {
            outcome.validate().map_err(|e| match e {
                QuoteError::MalformedQuote(reason) => {
                    QuoteError::malformed(format!("{}: {reason}", self.bookmaker))
                }
                other => other,
            })?;
        }
        for kind in MarketKind::ALL {
            let count = self.outcomes(*kind).count();
            if count == 1 {
                return Err(QuoteError::malformed(format!(
                    "{}: {kind} market has a single outcome, both sides are required",
                    self.bookmaker
                )));
            }
        }
        Ok(())
    }

    pub fn bookmaker(&self) -> &str {
        &self.bookmaker
    }

    /// Outcomes of one market kind, in quoted order.
    pub fn outcomes(&self, kind: MarketKind) -> impl Iterator<Item = &MarketOutcome> {
        self.outcomes.iter().filter(move |o| o.kind == kind)
    }

    /// Whether this bookmaker quotes the given market at all.
    pub fn offers(&self, kind: MarketKind) -> bool {
        self.outcomes(kind).next().is_some()
    }

    pub fn all_outcomes(&self) -> &[MarketOutcome] {
        &self.outcomes
    }
}

/// A scheduled game and the quotes collected for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    id: String,
    home: String,
    away: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    commence_time: Option<DateTime<Utc>>,
    #[serde(default)]
    quotes: Vec<BookmakerQuote>,
}

impl Game {
    pub fn new(
        id: impl Into<String>,
        home: impl Into<String>,
        away: impl Into<String>,
        quotes: Vec<BookmakerQuote>,
    ) -> Result<Self, QuoteError> {
        let game = Self {
            id: id.into(),
            home: home.into(),
            away: away.into(),
            commence_time: None,
            quotes,
        };
        game.validate()?;
        Ok(game)
    }

    pub fn with_commence_time(mut self, commence_time: DateTime<Utc>) -> Self {
        self.commence_time = Some(commence_time);
        self
    }

    /// Re-check the quote invariants. Needed for games that arrived
    /// through serde rather than the constructors.
    pub fn validate(&self) -> Result<(), QuoteError> {
        self.quotes.iter().try_for_each(BookmakerQuote::validate)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn home(&self) -> &str {
        &self.home
    }

    pub fn away(&self) -> &str {
        &self.away
    }

    pub fn commence_time(&self) -> Option<DateTime<Utc>> {
        self.commence_time
    }

    pub fn quotes(&self) -> &[BookmakerQuote] {
        &self.quotes
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} @ {} ({} bookmakers)",
            self.id,
            self.away,
            self.home,
            self.quotes.len()
        )
    }
}

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

/// Recommendation category. Declaration order is confidence order,
/// highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalCategory {
    StrongMoneyline,
    ValueMoneyline,
    MarginalEdge,
    SpreadFavorite,
    SpreadUnderdogHedge,
    TotalsOver,
    TotalsUnder,
    ContrarianUpset,
    GenericValue,
}

impl SignalCategory {
    pub const ALL: &'static [SignalCategory] = &[
        SignalCategory::StrongMoneyline,
        SignalCategory::ValueMoneyline,
        SignalCategory::MarginalEdge,
        SignalCategory::SpreadFavorite,
        SignalCategory::SpreadUnderdogHedge,
        SignalCategory::TotalsOver,
        SignalCategory::TotalsUnder,
        SignalCategory::ContrarianUpset,
        SignalCategory::GenericValue,
    ];

    /// 1 is the most confident category.
    pub fn confidence_rank(&self) -> u8 {
        *self as u8 + 1
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalCategory::StrongMoneyline => "STRONG_MONEYLINE",
            SignalCategory::ValueMoneyline => "VALUE_MONEYLINE",
            SignalCategory::MarginalEdge => "MARGINAL_EDGE",
            SignalCategory::SpreadFavorite => "SPREAD_FAVORITE",
            SignalCategory::SpreadUnderdogHedge => "SPREAD_UNDERDOG_HEDGE",
            SignalCategory::TotalsOver => "TOTALS_OVER",
            SignalCategory::TotalsUnder => "TOTALS_UNDER",
            SignalCategory::ContrarianUpset => "CONTRARIAN_UPSET",
            SignalCategory::GenericValue => "GENERIC_VALUE",
        }
    }
}

impl fmt::Display for SignalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numbers a recommendation was classified on.
///
/// `probability` is the one the rule gated on. `edge` and `stake` come
/// from the pricing probability, which differs for spread sides: they
/// gate on the moneyline win probability and price on the cover
/// probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub probability: f64,
    pub price: f64,
    pub edge: f64,
    pub stake: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<f64>,
}

/// A classified betting signal for one side of one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: SignalCategory,
    /// Team label, or Over/Under.
    pub subject: String,
    pub evidence: Evidence,
    pub rationale: String,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} @ {:.2} | fair={:.1}% edge={:+.1}% stake={:.1}%",
            self.category,
            self.subject,
            self.evidence.price,
            self.evidence.probability * 100.0,
            self.evidence.edge * 100.0,
            self.evidence.stake * 100.0,
        )
    }
}

// ---------------------------------------------------------------------------
// Analysis output
// ---------------------------------------------------------------------------

/// Whether a market kind made it through analysis for a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MarketStatus {
    Analyzed,
    /// No bookmaker quoted the market.
    Absent,
    /// Quoted, but not usable (e.g. one side missing).
    NotAnalyzed { reason: String },
}

impl MarketStatus {
    pub fn is_analyzed(&self) -> bool {
        matches!(self, MarketStatus::Analyzed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketCoverage {
    pub moneyline: MarketStatus,
    pub spread: MarketStatus,
    pub totals: MarketStatus,
}

impl MarketCoverage {
    pub fn absent() -> Self {
        Self {
            moneyline: MarketStatus::Absent,
            spread: MarketStatus::Absent,
            totals: MarketStatus::Absent,
        }
    }

    pub fn any_analyzed(&self) -> bool {
        self.moneyline.is_analyzed() || self.spread.is_analyzed() || self.totals.is_analyzed()
    }
}

/// Distinguishes "analyzed, nothing found" from "could not analyze".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Signals,
    /// Usable quotes, but no rule fired.
    Balanced,
    NoUsableQuotes,
}

/// Per-game engine output handed to the report renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub game_id: String,
    pub home: String,
    pub away: String,
    pub totals_line: Option<f64>,
    pub fair_home: Option<f64>,
    pub fair_away: Option<f64>,
    pub coverage: MarketCoverage,
    pub verdict: Verdict,
    pub recommendations: Vec<Recommendation>,
}

impl AnalysisResult {
    /// Result for a game with nothing to analyze.
    pub fn unanalyzed(game: &Game) -> Self {
        Self {
            game_id: game.id().to_string(),
            home: game.home().to_string(),
            away: game.away().to_string(),
            totals_line: None,
            fair_home: None,
            fair_away: None,
            coverage: MarketCoverage::absent(),
            verdict: Verdict::NoUsableQuotes,
            recommendations: Vec::new(),
        }
    }

    pub fn has_signals(&self) -> bool {
        !self.recommendations.is_empty()
    }

    /// Recommendations of one category.
    pub fn signals(&self, category: SignalCategory) -> impl Iterator<Item = &Recommendation> {
        self.recommendations
            .iter()
            .filter(move |r| r.category == category)
    }
}

/// Note for a game that could not be analyzed at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameFailure {
    pub game_id: String,
    pub home: String,
    pub away: String,
    pub reason: String,
}

/// One line of the report, in the order games were supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportEntry {
    Analyzed(AnalysisResult),
    Failed(GameFailure),
}

impl ReportEntry {
    pub fn game_id(&self) -> &str {
        match self {
            ReportEntry::Analyzed(r) => &r.game_id,
            ReportEntry::Failed(f) => &f.game_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
