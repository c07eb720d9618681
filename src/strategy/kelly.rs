//! Kelly criterion stake sizing.
//!
//! Stake is advisory output attached to a recommendation as a fraction
//! of bankroll. It never gates classification on its own.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Kelly sizing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KellyConfig {
    /// Fractional Kelly multiplier (1.0 = full Kelly, 0.25 = quarter-Kelly).
    pub multiplier: f64,
    /// Maximum stake as a fraction of bankroll.
    pub max_stake: f64,
}

impl Default for KellyConfig {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            max_stake: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Kelly calculator
// ---------------------------------------------------------------------------

/// Raw Kelly fraction for a win probability at a decimal price.
///
/// Kelly formula: f* = (bp - q) / b
/// where:
///   b = price - 1 (net odds)
///   p = win probability
///   q = 1 - p
///
/// `bp - q` is written as `p * price - 1`, the same quantity, so the
/// fraction is exactly zero whenever the edge is not positive.
pub fn kelly_fraction(probability: f64, price: f64) -> f64 {
    if price <= 1.0 {
        return 0.0;
    }
    let net_odds = price - 1.0;
    let numerator = probability * price - 1.0;
    (numerator / net_odds).max(0.0)
}

#[derive(Debug, Clone, Default)]
pub struct KellyCalculator {
    config: KellyConfig,
}

impl KellyCalculator {
    pub fn new(config: KellyConfig) -> Self {
        Self { config }
    }

    /// Recommended stake fraction after multiplier and cap. Never negative.
    pub fn stake(&self, probability: f64, price: f64) -> f64 {
        let raw = kelly_fraction(probability, price);
        (raw * self.config.multiplier)
            .min(self.config.max_stake)
            .max(0.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
