//! Quote aggregation.
//!
//! Collapses per-bookmaker quotes into per-side best and mean prices.
//! Moneyline and totals are aggregated across every bookmaker. The
//! spread is read from a single reference bookmaker, points and prices
//! as quoted.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Game, MarketKind, OVER, UNDER};

/// Lines closer than this are the same line.
const LINE_EPSILON: f64 = 1e-9;

fn same_line(a: f64, b: f64) -> bool {
    (a - b).abs() < LINE_EPSILON
}

// ---------------------------------------------------------------------------
// Aggregated data
// ---------------------------------------------------------------------------

/// Best and mean price for one market side across contributing quotes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregatedSide {
    /// Maximum price: the one a bettor would actually take.
    pub best_price: f64,
    /// Simple average, used for the fair-probability baseline.
    pub mean_price: f64,
    pub quotes: usize,
}

impl AggregatedSide {
    /// `None` when there are no prices to aggregate.
    pub fn from_prices(prices: &[f64]) -> Option<Self> {
        if prices.is_empty() {
            return None;
        }
        let best_price = prices.iter().copied().fold(f64::MIN, f64::max);
        let mean_price = prices.iter().sum::<f64>() / prices.len() as f64;
        Some(Self {
            best_price,
            mean_price,
            quotes: prices.len(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MoneylineAggregate {
    pub home: Option<AggregatedSide>,
    pub away: Option<AggregatedSide>,
}

impl MoneylineAggregate {
    /// Neither team was quoted.
    pub fn is_absent(&self) -> bool {
        self.home.is_none() && self.away.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalsAggregate {
    pub line: f64,
    pub over: AggregatedSide,
    pub under: AggregatedSide,
    /// Bookmakers quoting the chosen line.
    pub bookmakers_at_line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpreadSide {
    pub point: f64,
    pub side: AggregatedSide,
}

/// Spread as quoted by the reference bookmaker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadAggregate {
    pub bookmaker: String,
    pub home: Option<SpreadSide>,
    pub away: Option<SpreadSide>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedMarkets {
    pub moneyline: MoneylineAggregate,
    pub spread: Option<SpreadAggregate>,
    pub totals: Option<TotalsAggregate>,
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Which line wins when several totals lines are offered by the same
/// number of bookmakers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    #[default]
    Lowest,
    Highest,
}

#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    tie_break: TieBreak,
}

impl Aggregator {
    pub fn new(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }

    /// Aggregate every market kind of a game. Fresh on every call.
    pub fn aggregate(&self, game: &Game) -> AggregatedMarkets {
        AggregatedMarkets {
            moneyline: Self::moneyline(game),
            spread: Self::spread(game),
            totals: self.totals(game),
        }
    }

    /// Team prices across all bookmakers. Labels matching neither team
    /// are ignored.
    fn moneyline(game: &Game) -> MoneylineAggregate {
        let mut home_prices = Vec::new();
        let mut away_prices = Vec::new();

        for quote in game.quotes() {
            for outcome in quote.outcomes(MarketKind::Moneyline) {
                if outcome.side() == game.home() {
                    home_prices.push(outcome.price());
                } else if outcome.side() == game.away() {
                    away_prices.push(outcome.price());
                } else {
                    debug!(
                        game_id = game.id(),
                        bookmaker = quote.bookmaker(),
                        side = outcome.side(),
                        "Ignoring moneyline outcome for unknown team"
                    );
                }
            }
        }

        MoneylineAggregate {
            home: AggregatedSide::from_prices(&home_prices),
            away: AggregatedSide::from_prices(&away_prices),
        }
    }

    /// Over/Under prices at the most commonly offered line.
    fn totals(&self, game: &Game) -> Option<TotalsAggregate> {
        let (line, bookmakers_at_line) = self.select_totals_line(game)?;

        let mut over_prices = Vec::new();
        let mut under_prices = Vec::new();
        for quote in game.quotes() {
            for outcome in quote.outcomes(MarketKind::Totals) {
                if !outcome.point().is_some_and(|p| same_line(p, line)) {
                    continue;
                }
                match outcome.side() {
                    OVER => over_prices.push(outcome.price()),
                    UNDER => under_prices.push(outcome.price()),
                    _ => {}
                }
            }
        }

        match (
            AggregatedSide::from_prices(&over_prices),
            AggregatedSide::from_prices(&under_prices),
        ) {
            (Some(over), Some(under)) => Some(TotalsAggregate {
                line,
                over,
                under,
                bookmakers_at_line,
            }),
            _ => {
                debug!(
                    game_id = game.id(),
                    line,
                    "Totals line lacks an Over/Under pair, treating as absent"
                );
                None
            }
        }
    }

    /// The line quoted by the most bookmakers (each counted once per
    /// line), with its bookmaker count.
    pub fn select_totals_line(&self, game: &Game) -> Option<(f64, usize)> {
        let mut counts: Vec<(f64, usize)> = Vec::new();

        for quote in game.quotes() {
            let mut seen: Vec<f64> = Vec::new();
            for point in quote
                .outcomes(MarketKind::Totals)
                .filter_map(|o| o.point())
            {
                if seen.iter().any(|s| same_line(*s, point)) {
                    continue;
                }
                seen.push(point);
                match counts.iter_mut().find(|(line, _)| same_line(*line, point)) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((point, 1)),
                }
            }
        }

        counts.into_iter().reduce(|best, candidate| {
            let better = match candidate.1.cmp(&best.1) {
                std::cmp::Ordering::Greater => true,
                std::cmp::Ordering::Less => false,
                std::cmp::Ordering::Equal => match self.tie_break {
                    TieBreak::Lowest => candidate.0 < best.0,
                    TieBreak::Highest => candidate.0 > best.0,
                },
            };
            if better {
                candidate
            } else {
                best
            }
        })
    }

    /// Spread from the first bookmaker in sequence that quotes one.
    fn spread(game: &Game) -> Option<SpreadAggregate> {
        let reference = game
            .quotes()
            .iter()
            .find(|q| q.offers(MarketKind::Spread))?;

        let side_for = |team: &str| {
            reference
                .outcomes(MarketKind::Spread)
                .find(|o| o.side() == team)
                .and_then(|o| {
                    Some(SpreadSide {
                        point: o.point()?,
                        side: AggregatedSide::from_prices(&[o.price()])?,
                    })
                })
        };

        Some(SpreadAggregate {
            bookmaker: reference.bookmaker().to_string(),
            home: side_for(game.home()),
            away: side_for(game.away()),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BookmakerQuote, MarketOutcome};

    const HOME: &str = "Los Angeles Dodgers";
    const AWAY: &str = "San Diego Padres";

    fn make_book(name: &str, home: f64, away: f64, totals: &[(f64, f64, f64)]) -> BookmakerQuote {
        let mut outcomes = vec![
            MarketOutcome::moneyline(HOME, home).unwrap(),
            MarketOutcome::moneyline(AWAY, away).unwrap(),
        ];
        for &(line, over, under) in totals {
            outcomes.push(MarketOutcome::totals(OVER, line, over).unwrap());
            outcomes.push(MarketOutcome::totals(UNDER, line, under).unwrap());
        }
        BookmakerQuote::new(name, outcomes).unwrap()
    }

    fn make_game(quotes: Vec<BookmakerQuote>) -> Game {
        Game::new("g1", HOME, AWAY, quotes).unwrap()
    }

    #[test]
    fn test_best_and_mean_prices() {
        let game = make_game(vec![
            make_book("a", 1.80, 2.10, &[]),
            make_book("b", 1.90, 2.00, &[]),
            make_book("c", 1.70, 2.30, &[]),
        ]);
        let markets = Aggregator::default().aggregate(&game);
        let home = markets.moneyline.home.unwrap();
        let away = markets.moneyline.away.unwrap();

        assert_eq!(home.best_price, 1.90);
        assert!((home.mean_price - 1.80).abs() < 1e-12);
        assert_eq!(home.quotes, 3);
        assert_eq!(away.best_price, 2.30);
        assert!((away.mean_price - 6.4 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_best_price_dominates_every_quote() {
        let prices = [1.71, 1.95, 1.83, 1.95, 1.6];
        let side = AggregatedSide::from_prices(&prices).unwrap();
        assert!(prices.iter().all(|p| side.best_price >= *p));

        // Idempotent under re-aggregation of the same set
        let again = AggregatedSide::from_prices(&prices).unwrap();
        assert_eq!(side, again);
    }

    #[test]
    fn test_empty_prices_yield_none() {
        assert!(AggregatedSide::from_prices(&[]).is_none());
    }

    #[test]
    fn test_unknown_team_labels_ignored() {
        let quote = BookmakerQuote::new(
            "a",
            vec![
                MarketOutcome::moneyline(HOME, 1.8).unwrap(),
                MarketOutcome::moneyline("Oakland Athletics", 2.1).unwrap(),
            ],
        )
        .unwrap();
        let markets = Aggregator::default().aggregate(&make_game(vec![quote]));
        assert!(markets.moneyline.home.is_some());
        assert!(markets.moneyline.away.is_none());
        assert!(!markets.moneyline.is_absent());
    }

    #[test]
    fn test_no_moneyline_outcomes_is_absent() {
        let quote = BookmakerQuote::new(
            "a",
            vec![
                MarketOutcome::totals(OVER, 8.5, 1.9).unwrap(),
                MarketOutcome::totals(UNDER, 8.5, 1.9).unwrap(),
            ],
        )
        .unwrap();
        let markets = Aggregator::default().aggregate(&make_game(vec![quote]));
        assert!(markets.moneyline.is_absent());
        assert!(markets.totals.is_some());
    }

    #[test]
    fn test_totals_line_plurality() {
        let game = make_game(vec![
            make_book("a", 1.8, 2.1, &[(8.5, 1.90, 1.90)]),
            make_book("b", 1.8, 2.1, &[(9.0, 1.85, 1.95)]),
            make_book("c", 1.8, 2.1, &[(9.0, 1.87, 1.93)]),
        ]);
        let totals = Aggregator::default().aggregate(&game).totals.unwrap();
        assert_eq!(totals.line, 9.0);
        assert_eq!(totals.bookmakers_at_line, 2);
        assert_eq!(totals.over.quotes, 2);
        assert_eq!(totals.over.best_price, 1.87);
        assert_eq!(totals.under.best_price, 1.95);
    }

    #[test]
    fn test_totals_tie_breaks() {
        let game = make_game(vec![
            make_book("a", 1.8, 2.1, &[(9.5, 1.90, 1.90)]),
            make_book("b", 1.8, 2.1, &[(8.5, 1.85, 1.95)]),
        ]);
        let lowest = Aggregator::new(TieBreak::Lowest).select_totals_line(&game);
        let highest = Aggregator::new(TieBreak::Highest).select_totals_line(&game);
        assert_eq!(lowest, Some((8.5, 1)));
        assert_eq!(highest, Some((9.5, 1)));
    }

    #[test]
    fn test_bookmaker_counted_once_per_line() {
        // "a" quotes 8.5 twice (e.g. main + duplicate feed row); still one vote
        let quote = BookmakerQuote::new(
            "a",
            vec![
                MarketOutcome::totals(OVER, 8.5, 1.9).unwrap(),
                MarketOutcome::totals(UNDER, 8.5, 1.9).unwrap(),
                MarketOutcome::totals(OVER, 8.5, 1.92).unwrap(),
                MarketOutcome::totals(UNDER, 8.5, 1.88).unwrap(),
            ],
        )
        .unwrap();
        let game = make_game(vec![quote, make_book("b", 1.8, 2.1, &[(9.5, 1.9, 1.9)])]);
        assert_eq!(Aggregator::default().select_totals_line(&game), Some((8.5, 1)));
    }

    #[test]
    fn test_totals_without_pair_is_absent() {
        let quote = BookmakerQuote::new(
            "a",
            vec![
                MarketOutcome::totals(OVER, 8.5, 1.9).unwrap(),
                MarketOutcome::totals(OVER, 9.5, 2.1).unwrap(),
            ],
        )
        .unwrap();
        let markets = Aggregator::default().aggregate(&make_game(vec![quote]));
        assert!(markets.totals.is_none());
    }

    #[test]
    fn test_spread_uses_reference_bookmaker() {
        let no_spread = make_book("a", 1.8, 2.1, &[]);
        let reference = BookmakerQuote::new(
            "b",
            vec![
                MarketOutcome::spread(HOME, -1.5, 2.20).unwrap(),
                MarketOutcome::spread(AWAY, 1.5, 1.70).unwrap(),
            ],
        )
        .unwrap();
        let later = BookmakerQuote::new(
            "c",
            vec![
                MarketOutcome::spread(HOME, -2.5, 3.00).unwrap(),
                MarketOutcome::spread(AWAY, 2.5, 1.40).unwrap(),
            ],
        )
        .unwrap();
        let game = make_game(vec![no_spread, reference, later]);
        let spread = Aggregator::default().aggregate(&game).spread.unwrap();

        assert_eq!(spread.bookmaker, "b");
        let home = spread.home.unwrap();
        assert_eq!(home.point, -1.5);
        assert_eq!(home.side.best_price, 2.20);
        assert_eq!(home.side.quotes, 1);
        assert_eq!(spread.away.unwrap().point, 1.5);
    }

    #[test]
    fn test_no_quotes_aggregates_to_nothing() {
        let markets = Aggregator::default().aggregate(&make_game(vec![]));
        assert!(markets.moneyline.is_absent());
        assert!(markets.spread.is_none());
        assert!(markets.totals.is_none());
    }
}
