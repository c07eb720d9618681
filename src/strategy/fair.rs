//! Fair-probability estimation.
//!
//! Removes the bookmaker margin from a two-outcome market by
//! renormalizing the implied probabilities of the mean prices. A
//! pluggable [`ProbabilityBias`] can nudge the moneyline home side
//! afterwards without touching the de-vig math.

use serde::Serialize;
use std::fmt;
use tracing::debug;

use super::aggregate::AggregatedSide;
use crate::error::QuoteError;
use crate::types::MarketKind;

/// A biased probability is never pushed above this.
pub const PROBABILITY_CEILING: f64 = 0.98;

/// Largest home bias accepted from configuration.
pub const MAX_HOME_BIAS: f64 = 0.1;

/// Break-even probability of a decimal price, margin included.
pub fn implied_probability(price: f64) -> f64 {
    if price > 0.0 {
        1.0 / price
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Bias
// ---------------------------------------------------------------------------

/// Adjustment layered on the de-vigorized home probability.
pub trait ProbabilityBias: Send + Sync + fmt::Debug {
    /// Return the adjusted home probability. The away side is re-split
    /// as `1 - home` by the caller.
    fn adjust(&self, home_probability: f64) -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoBias;

impl ProbabilityBias for NoBias {
    fn adjust(&self, home_probability: f64) -> f64 {
        home_probability
    }
}

/// Additive home-field nudge, clamped at [`PROBABILITY_CEILING`].
#[derive(Debug, Clone, Copy)]
pub struct HomeFieldBias {
    magnitude: f64,
}

impl HomeFieldBias {
    pub fn new(magnitude: f64) -> Self {
        Self {
            magnitude: magnitude.clamp(0.0, MAX_HOME_BIAS),
        }
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }
}

impl ProbabilityBias for HomeFieldBias {
    fn adjust(&self, home_probability: f64) -> f64 {
        (home_probability + self.magnitude).min(PROBABILITY_CEILING)
    }
}

// ---------------------------------------------------------------------------
// Estimator
// ---------------------------------------------------------------------------

/// De-vigorized two-way distribution. `first + second == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FairProbability {
    pub first: f64,
    pub second: f64,
}

impl FairProbability {
    /// Renormalize the implied probabilities of two mean prices.
    pub fn devig(first_price: f64, second_price: f64) -> Self {
        let first = implied_probability(first_price);
        let second = implied_probability(second_price);
        let total = first + second;
        let first = first / total;
        Self {
            first,
            second: 1.0 - first,
        }
    }

    /// Bookmaker margin embedded in a price pair (`sum of implied - 1`).
    pub fn overround(first_price: f64, second_price: f64) -> f64 {
        implied_probability(first_price) + implied_probability(second_price) - 1.0
    }
}

#[derive(Debug)]
pub struct FairProbabilityEstimator {
    bias: Box<dyn ProbabilityBias>,
}

impl Default for FairProbabilityEstimator {
    fn default() -> Self {
        Self::new(Box::new(NoBias))
    }
}

impl FairProbabilityEstimator {
    pub fn new(bias: Box<dyn ProbabilityBias>) -> Self {
        Self { bias }
    }

    /// Fair probabilities for a two-sided market from its mean prices.
    ///
    /// Fails with `InsufficientQuoteData` naming the first side that has
    /// no contributing quotes.
    pub fn two_way(
        &self,
        market: MarketKind,
        first: (&str, Option<&AggregatedSide>),
        second: (&str, Option<&AggregatedSide>),
    ) -> Result<FairProbability, QuoteError> {
        let first_side = Self::usable(market, first)?;
        let second_side = Self::usable(market, second)?;

        let fair = FairProbability::devig(first_side.mean_price, second_side.mean_price);

        debug!(
            market = %market,
            first = first.0,
            second = second.0,
            overround = format!(
                "{:.2}%",
                FairProbability::overround(first_side.mean_price, second_side.mean_price) * 100.0
            ),
            fair_first = format!("{:.4}", fair.first),
            "De-vigorized pair"
        );

        Ok(fair)
    }

    /// Moneyline fair probabilities with the bias applied to the home
    /// side. `first` is home, `second` is away.
    pub fn moneyline(
        &self,
        home: (&str, Option<&AggregatedSide>),
        away: (&str, Option<&AggregatedSide>),
    ) -> Result<FairProbability, QuoteError> {
        let fair = self.two_way(MarketKind::Moneyline, home, away)?;
        let biased_home = self.bias.adjust(fair.first);
        Ok(FairProbability {
            first: biased_home,
            second: 1.0 - biased_home,
        })
    }

    fn usable<'a>(
        market: MarketKind,
        (label, side): (&str, Option<&'a AggregatedSide>),
    ) -> Result<&'a AggregatedSide, QuoteError> {
        side.filter(|s| s.quotes > 0)
            .ok_or_else(|| QuoteError::InsufficientQuoteData {
                market,
                side: label.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
