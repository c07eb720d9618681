//! Signal classification.
//!
//! An ordered rule table maps priced sides to recommendation categories.
//! Rules are grouped by market (moneyline, spread, totals, generic); each
//! group is evaluated independently and, per side, the first rule that
//! fires in a group wins. Behavioral variants are new tables or new
//! thresholds, not new code paths.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::edge::Edge;
use crate::types::{Recommendation, SignalCategory, OVER, UNDER};

/// Tolerance for `LineEquals`.
const LINE_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Thresholds (defaults, overridden by [engine.thresholds])
// ---------------------------------------------------------------------------

/// Named cut-points the default rule table is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub moneyline_strong_prob: f64,
    pub moneyline_strong_price_floor: f64,
    pub moneyline_value_prob: f64,
    pub moneyline_value_price_floor: f64,
    pub value_stake_min: f64,
    pub marginal_prob_floor: f64,
    pub marginal_prob_ceiling: f64,
    pub marginal_edge_min: f64,
    pub contrarian_prob_ceiling: f64,
    pub contrarian_price_floor: f64,
    /// Absolute run line the spread rules look for (favorite lays it,
    /// underdog gets it).
    pub spread_line: f64,
    pub spread_favorite_prob: f64,
    pub spread_hedge_prob_floor: f64,
    /// Win probability above which a +line underdog is no longer a hedge.
    pub spread_hedge_prob_ceiling: f64,
    pub totals_over_price_ceiling: f64,
    /// Highest totals line at which an Under signal is considered.
    pub totals_low_line: f64,
    pub totals_under_price_ceiling: f64,
    pub edge_generic_threshold: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            moneyline_strong_prob: 0.58,
            moneyline_strong_price_floor: 1.65,
            moneyline_value_prob: 0.53,
            moneyline_value_price_floor: 1.80,
            value_stake_min: 0.0,
            marginal_prob_floor: 0.50,
            marginal_prob_ceiling: 0.55,
            marginal_edge_min: 0.01,
            contrarian_prob_ceiling: 0.48,
            contrarian_price_floor: 2.10,
            spread_line: 1.5,
            spread_favorite_prob: 0.60,
            spread_hedge_prob_floor: 0.42,
            spread_hedge_prob_ceiling: 0.50,
            totals_over_price_ceiling: 1.90,
            totals_low_line: 8.5,
            totals_under_price_ceiling: 1.80,
            edge_generic_threshold: 0.03,
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Rule groups, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleGroup {
    Moneyline,
    Spread,
    Totals,
    Generic,
}

impl RuleGroup {
    pub const ORDER: [RuleGroup; 4] = [
        RuleGroup::Moneyline,
        RuleGroup::Spread,
        RuleGroup::Totals,
        RuleGroup::Generic,
    ];
}

/// One predicate over a priced side. Comparisons against an absent line
/// are false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "when", content = "value", rename_all = "snake_case")]
pub enum Condition {
    ProbabilityAbove(f64),
    ProbabilityAtMost(f64),
    ProbabilityBelow(f64),
    PriceAtLeast(f64),
    PriceAtMost(f64),
    EdgeAbove(f64),
    StakeAtLeast(f64),
    LineAtMost(f64),
    LineAbove(f64),
    LineEquals(f64),
    Subject(String),
}

impl Condition {
    pub fn holds(&self, side: &Edge) -> bool {
        match self {
            Condition::ProbabilityAbove(x) => side.probability > *x,
            Condition::ProbabilityAtMost(x) => side.probability <= *x,
            Condition::ProbabilityBelow(x) => side.probability < *x,
            Condition::PriceAtLeast(x) => side.price >= *x,
            Condition::PriceAtMost(x) => side.price <= *x,
            Condition::EdgeAbove(x) => side.edge > *x,
            Condition::StakeAtLeast(x) => side.stake >= *x,
            Condition::LineAtMost(x) => side.line.is_some_and(|l| l <= *x),
            Condition::LineAbove(x) => side.line.is_some_and(|l| l > *x),
            Condition::LineEquals(x) => side.line.is_some_and(|l| (l - x).abs() < LINE_EPSILON),
            Condition::Subject(s) => side.subject == *s,
        }
    }
}

/// A predicate → category mapping with a rationale template.
///
/// Template placeholders: `{subject}`, `{prob}`, `{price}`, `{edge}`,
/// `{stake}`, `{line}`, `{line_signed}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub group: RuleGroup,
    pub category: SignalCategory,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub rationale: String,
}

impl Rule {
    pub fn new(
        name: &str,
        group: RuleGroup,
        category: SignalCategory,
        conditions: Vec<Condition>,
        rationale: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            group,
            category,
            conditions,
            rationale: rationale.to_string(),
        }
    }

    /// All conditions hold. A rule without conditions always fires.
    pub fn matches(&self, side: &Edge) -> bool {
        self.conditions.iter().all(|c| c.holds(side))
    }

    pub fn recommend(&self, side: &Edge) -> Recommendation {
        Recommendation {
            category: self.category,
            subject: side.subject.clone(),
            evidence: side.evidence(),
            rationale: render_rationale(&self.rationale, side),
        }
    }
}

fn render_rationale(template: &str, side: &Edge) -> String {
    let (line, line_signed) = match side.line {
        Some(l) => (format!("{l}"), format!("{l:+}")),
        None => ("-".to_string(), "-".to_string()),
    };
    template
        .replace("{subject}", &side.subject)
        .replace("{prob}", &format!("{:.1}%", side.probability * 100.0))
        .replace("{price}", &format!("{:.2}", side.price))
        .replace("{edge}", &format!("{:.1}%", side.edge * 100.0))
        .replace("{stake}", &format!("{:.1}%", side.stake * 100.0))
        .replace("{line_signed}", &line_signed)
        .replace("{line}", &line)
}

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// Priced sides of one game, per market. Generic rules run over the
/// moneyline sides.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignalCandidates {
    pub moneyline: Vec<Edge>,
    pub spread: Vec<Edge>,
    pub totals: Vec<Edge>,
}

impl SignalCandidates {
    pub fn for_group(&self, group: RuleGroup) -> &[Edge] {
        match group {
            RuleGroup::Moneyline | RuleGroup::Generic => &self.moneyline,
            RuleGroup::Spread => &self.spread,
            RuleGroup::Totals => &self.totals,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.moneyline.is_empty() && self.spread.is_empty() && self.totals.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::from_thresholds(&Thresholds::default())
    }
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The standard table, ordered by confidence inside each group.
    pub fn from_thresholds(t: &Thresholds) -> Self {
        use Condition::*;
        use RuleGroup as G;
        use SignalCategory as C;

        Self::new(vec![
            Rule::new(
                "strong_moneyline",
                G::Moneyline,
                C::StrongMoneyline,
                vec![
                    ProbabilityAbove(t.moneyline_strong_prob),
                    PriceAtLeast(t.moneyline_strong_price_floor),
                ],
                "Strong pick: {subject} @ {price} (fair {prob})",
            ),
            Rule::new(
                "value_moneyline",
                G::Moneyline,
                C::ValueMoneyline,
                vec![
                    ProbabilityAbove(t.moneyline_value_prob),
                    PriceAtLeast(t.moneyline_value_price_floor),
                    StakeAtLeast(t.value_stake_min),
                ],
                "Value pick: {subject} @ {price} (fair {prob}, stake {stake})",
            ),
            Rule::new(
                "marginal_edge",
                G::Moneyline,
                C::MarginalEdge,
                vec![
                    ProbabilityAbove(t.marginal_prob_floor),
                    ProbabilityAtMost(t.marginal_prob_ceiling),
                    EdgeAbove(t.marginal_edge_min),
                ],
                "Slight lean: {subject} @ {price} (fair {prob}, edge {edge})",
            ),
            Rule::new(
                "contrarian_upset",
                G::Moneyline,
                C::ContrarianUpset,
                vec![
                    ProbabilityBelow(t.contrarian_prob_ceiling),
                    PriceAtLeast(t.contrarian_price_floor),
                ],
                "Upset chance: {subject} @ {price} (fair {prob})",
            ),
            Rule::new(
                "spread_favorite",
                G::Spread,
                C::SpreadFavorite,
                vec![
                    LineEquals(-t.spread_line),
                    ProbabilityAbove(t.spread_favorite_prob),
                ],
                "Run line favorite: {subject} {line_signed} @ {price} (win {prob})",
            ),
            Rule::new(
                "spread_underdog_hedge",
                G::Spread,
                C::SpreadUnderdogHedge,
                vec![
                    LineEquals(t.spread_line),
                    ProbabilityAbove(t.spread_hedge_prob_floor),
                    ProbabilityAtMost(t.spread_hedge_prob_ceiling),
                ],
                "Underdog hedge: {subject} {line_signed} @ {price} (win {prob})",
            ),
            Rule::new(
                "totals_over",
                G::Totals,
                C::TotalsOver,
                vec![
                    Subject(OVER.to_string()),
                    PriceAtMost(t.totals_over_price_ceiling),
                ],
                "Over lean: Over {line} @ {price}",
            ),
            Rule::new(
                "totals_under",
                G::Totals,
                C::TotalsUnder,
                vec![
                    Subject(UNDER.to_string()),
                    LineAtMost(t.totals_low_line),
                    PriceAtMost(t.totals_under_price_ceiling),
                ],
                "Under value: Under {line} @ {price}",
            ),
            Rule::new(
                "generic_value",
                G::Generic,
                C::GenericValue,
                vec![EdgeAbove(t.edge_generic_threshold)],
                "Value: {subject} @ {price} (edge {edge})",
            ),
        ])
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules of one group, in table order.
    pub fn group(&self, group: RuleGroup) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |r| r.group == group)
    }

    /// First rule of the group that fires for this side.
    pub fn first_match(&self, group: RuleGroup, side: &Edge) -> Option<&Rule> {
        self.group(group).find(|rule| rule.matches(side))
    }

    /// Classify every candidate side. At most one recommendation per side
    /// per group; groups never suppress each other.
    pub fn classify(&self, candidates: &SignalCandidates) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        for group in RuleGroup::ORDER {
            for side in candidates.for_group(group) {
                if let Some(rule) = self.first_match(group, side) {
                    debug!(
                        rule = %rule.name,
                        group = ?group,
                        subject = %side.subject,
                        "Rule fired"
                    );
                    recommendations.push(rule.recommend(side));
                }
            }
        }

        recommendations
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
