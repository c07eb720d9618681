//! Edge (value) computation.
//!
//! Prices a market side against the model's fair probability and
//! attaches a Kelly stake. The result is the input every classification
//! rule is evaluated against.

use serde::Serialize;
use tracing::debug;

use super::kelly::KellyCalculator;
use crate::types::Evidence;

/// Expected value per unit staked: `p * price - 1`.
///
/// Positive means the price pays more than the fair probability
/// justifies under the model's own estimate.
pub fn expected_edge(probability: f64, price: f64) -> f64 {
    probability * price - 1.0
}

/// A priced market side, ready for classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    /// Team label, or Over/Under.
    pub subject: String,
    /// Probability the rules gate on. For spread sides this is the
    /// moneyline win probability, so `edge` and `stake` are not derived
    /// from it.
    pub probability: f64,
    pub price: f64,
    pub edge: f64,
    pub stake: f64,
    /// Point line relevant to the side (totals line for moneyline and
    /// totals sides, the handicap for spread sides).
    pub line: Option<f64>,
}

impl Edge {
    /// Gate on a different probability while keeping the priced edge.
    /// Spread sides are gated on the team's win probability but valued
    /// against their cover probability, after which
    /// `probability * price - 1` no longer equals `edge`.
    pub fn gated_on(mut self, probability: f64) -> Self {
        self.probability = probability;
        self
    }

    pub fn evidence(&self) -> Evidence {
        Evidence {
            probability: self.probability,
            price: self.price,
            edge: self.edge,
            stake: self.stake,
            line: self.line,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EdgeCalculator {
    kelly: KellyCalculator,
}

impl EdgeCalculator {
    pub fn new(kelly: KellyCalculator) -> Self {
        Self { kelly }
    }

    /// Price one side at its best available price.
    pub fn price_side(
        &self,
        subject: &str,
        probability: f64,
        price: f64,
        line: Option<f64>,
    ) -> Edge {
        let edge = expected_edge(probability, price);
        let stake = self.kelly.stake(probability, price);

        debug!(
            subject,
            fair = format!("{:.1}%", probability * 100.0),
            price = format!("{price:.2}"),
            edge = format!("{:+.1}%", edge * 100.0),
            stake = format!("{:.2}%", stake * 100.0),
            "Side priced"
        );

        Edge {
            subject: subject.to_string(),
            probability,
            price,
            edge,
            stake,
            line,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::kelly::KellyConfig;

    #[test]
    fn test_worked_example_edge() {
        let calc = EdgeCalculator::default();
        let e = calc.price_side("Home", 0.55, 1.90, None);
        assert!((e.edge - 0.045).abs() < 1e-12);
        assert!(e.stake > 0.0);
    }

    #[test]
    fn test_negative_edge_has_zero_stake() {
        let calc = EdgeCalculator::default();
        let e = calc.price_side("Away", 0.45, 2.10, Some(8.5));
        assert!(e.edge < 0.0);
        assert_eq!(e.stake, 0.0);
        assert_eq!(e.line, Some(8.5));
    }

    #[test]
    fn test_stake_follows_kelly_config() {
        let calc = EdgeCalculator::new(KellyCalculator::new(KellyConfig {
            multiplier: 0.5,
            max_stake: 1.0,
        }));
        let e = calc.price_side("Home", 0.55, 1.90, None);
        assert!((e.stake - 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_gated_on_keeps_priced_edge() {
        let calc = EdgeCalculator::default();
        let e = calc.price_side("Home", 0.40, 2.40, Some(-1.5)).gated_on(0.66);
        assert_eq!(e.probability, 0.66);
        assert!((e.edge - (0.40 * 2.40 - 1.0)).abs() < 1e-12);

        let evidence = e.evidence();
        assert_eq!(evidence.probability, 0.66);
        assert_eq!(evidence.line, Some(-1.5));
    }
}
