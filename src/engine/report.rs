//! Report assembly.
//!
//! Collects per-game entries into the single artifact handed to the
//! renderer. Supplied order is preserved; nothing is re-ranked.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{AnalysisResult, GameFailure, ReportEntry, Verdict};

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
}

/// Counts over a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub analyzed: usize,
    pub with_signals: usize,
    pub balanced: usize,
    pub no_usable_quotes: usize,
    pub failed: usize,
    pub recommendations: usize,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Successfully analyzed games, in order.
    pub fn results(&self) -> impl Iterator<Item = &AnalysisResult> {
        self.entries.iter().filter_map(|e| match e {
            ReportEntry::Analyzed(r) => Some(r),
            ReportEntry::Failed(_) => None,
        })
    }

    /// Games that could not be analyzed, in order.
    pub fn failures(&self) -> impl Iterator<Item = &GameFailure> {
        self.entries.iter().filter_map(|e| match e {
            ReportEntry::Failed(f) => Some(f),
            ReportEntry::Analyzed(_) => None,
        })
    }

    pub fn has_signals(&self) -> bool {
        self.results().any(|r| r.has_signals())
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::default();
        for entry in &self.entries {
            match entry {
                ReportEntry::Analyzed(r) => {
                    summary.analyzed += 1;
                    summary.recommendations += r.recommendations.len();
                    match r.verdict {
                        Verdict::Signals => summary.with_signals += 1,
                        Verdict::Balanced => summary.balanced += 1,
                        Verdict::NoUsableQuotes => summary.no_usable_quotes += 1,
                    }
                }
                ReportEntry::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }
}

// ---------------------------------------------------------------------------
// Assembler
// ---------------------------------------------------------------------------

pub struct ReportAssembler;

impl ReportAssembler {
    /// Build a report from entries in the order they were produced.
    pub fn assemble(entries: impl IntoIterator<Item = ReportEntry>) -> Report {
        let report = Report {
            entries: entries.into_iter().collect(),
        };

        let summary = report.summary();
        info!(
            analyzed = summary.analyzed,
            with_signals = summary.with_signals,
            balanced = summary.balanced,
            failed = summary.failed,
            recommendations = summary.recommendations,
            "Report assembled"
        );

        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MarketCoverage, MarketStatus};

    fn make_result(id: &str, verdict: Verdict) -> ReportEntry {
        let mut coverage = MarketCoverage::absent();
        if verdict != Verdict::NoUsableQuotes {
            coverage.moneyline = MarketStatus::Analyzed;
        }
        ReportEntry::Analyzed(AnalysisResult {
            game_id: id.to_string(),
            home: "Home".to_string(),
            away: "Away".to_string(),
            totals_line: None,
            fair_home: None,
            fair_away: None,
            coverage,
            verdict,
            recommendations: Vec::new(),
        })
    }

    fn make_failure(id: &str) -> ReportEntry {
        ReportEntry::Failed(GameFailure {
            game_id: id.to_string(),
            home: "Home".to_string(),
            away: "Away".to_string(),
            reason: "Malformed quote: x".to_string(),
        })
    }

    #[test]
    fn test_preserves_supplied_order() {
        let report = ReportAssembler::assemble(vec![
            make_result("c", Verdict::Balanced),
            make_failure("a"),
            make_result("b", Verdict::NoUsableQuotes),
        ]);
        let ids: Vec<&str> = report.entries.iter().map(|e| e.game_id()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(report.results().count(), 2);
        assert_eq!(report.failures().next().unwrap().game_id, "a");
    }

    #[test]
    fn test_summary_counts() {
        let report = ReportAssembler::assemble(vec![
            make_result("1", Verdict::Balanced),
            make_result("2", Verdict::NoUsableQuotes),
            make_failure("3"),
        ]);
        let summary = report.summary();
        assert_eq!(summary.analyzed, 2);
        assert_eq!(summary.balanced, 1);
        assert_eq!(summary.no_usable_quotes, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.with_signals, 0);
        assert!(!report.has_signals());
    }

    #[test]
    fn test_empty_report() {
        let report = ReportAssembler::assemble(Vec::new());
        assert!(report.is_empty());
        assert_eq!(report.summary(), ReportSummary::default());
    }

    #[test]
    fn test_report_round_trips_as_json() {
        let report = ReportAssembler::assemble(vec![make_result("1", Verdict::Balanced)]);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"kind\":\"analyzed\""));
        let back: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
