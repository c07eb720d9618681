//! Plain-text rendering of a report for chat delivery.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt::Write;

use crate::config::ReportConfig;
use crate::engine::report::Report;
use crate::types::{AnalysisResult, Recommendation, SignalCategory};

const BALANCED_LINE: &str = "Market balanced, no significant mispricing.";

/// Line marker per category.
pub fn category_marker(category: SignalCategory) -> &'static str {
    match category {
        SignalCategory::StrongMoneyline => "🔵",
        SignalCategory::ValueMoneyline => "💎",
        SignalCategory::MarginalEdge => "⚪",
        SignalCategory::SpreadFavorite => "🟠",
        SignalCategory::SpreadUnderdogHedge => "🟡",
        SignalCategory::TotalsOver => "🟢",
        SignalCategory::TotalsUnder => "🟣",
        SignalCategory::ContrarianUpset => "⭐",
        SignalCategory::GenericValue => "💰",
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportRenderer {
    title: String,
    team_names: HashMap<String, String>,
}

impl ReportRenderer {
    pub fn new(title: impl Into<String>, team_names: HashMap<String, String>) -> Self {
        Self {
            title: title.into(),
            team_names,
        }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(config.title.clone(), config.team_names.clone())
    }

    /// Display name for a team label; unknown labels pass through.
    pub fn team<'a>(&'a self, label: &'a str) -> &'a str {
        self.team_names.get(label).map(String::as_str).unwrap_or(label)
    }

    pub fn render(&self, report: &Report, now: DateTime<Utc>) -> String {
        let mut text = String::new();
        let _ = writeln!(text, "⚾ {}", self.title);
        let _ = writeln!(text, "Updated: {} UTC", now.format("%m/%d %H:%M"));

        let mut any_signals = false;
        for result in report.results().filter(|r| r.has_signals()) {
            any_signals = true;
            self.render_game(&mut text, result);
        }

        let failures: Vec<_> = report.failures().collect();
        if !failures.is_empty() {
            let _ = writeln!(text, "\nSkipped:");
            for f in failures {
                let _ = writeln!(
                    text,
                    "  - {} @ {}: {}",
                    self.team(&f.away),
                    self.team(&f.home),
                    f.reason
                );
            }
        }

        if !any_signals {
            let _ = writeln!(text, "\n{BALANCED_LINE}");
        }

        text
    }

    fn render_game(&self, text: &mut String, result: &AnalysisResult) {
        let total = result
            .totals_line
            .map(|l| l.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            text,
            "\n**{} @ {}** (total: {total})",
            self.team(&result.away),
            self.team(&result.home)
        );
        for rec in &result.recommendations {
            let _ = writeln!(
                text,
                "  {} {}",
                category_marker(rec.category),
                self.localize(rec)
            );
        }
    }

    fn localize(&self, rec: &Recommendation) -> String {
        match self.team_names.get(&rec.subject) {
            Some(name) => rec.rationale.replace(&rec.subject, name),
            None => rec.rationale.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
