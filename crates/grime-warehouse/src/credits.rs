use std::time::Duration;

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Table};
use serde::{Deserialize, Serialize};

/// One credit buys sixty seconds of tracked query time.
pub const CREDITS_PER_SECOND: f64 = 1.0 / 60.0;

const EMPTY_REPORT: &str = "No queries tracked yet.";

/// Cost of one tracked query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditEntry {
    pub label: String,
    pub elapsed_s: f64,
    pub credits: f64,
}

/// Ledger totals plus every tracked entry in execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditReport {
    pub entries: Vec<CreditEntry>,
    pub total_elapsed_s: f64,
    pub total_credits: f64,
}

/// Append-only list of tracked queries.
#[derive(Debug, Clone, Default)]
pub struct CreditLedger {
    entries: Vec<CreditEntry>,
}

impl CreditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, label: impl Into<String>, elapsed: Duration) -> &CreditEntry {
        let seconds = elapsed.as_secs_f64();
        let index = self.entries.len();
        self.entries.push(CreditEntry {
            label: label.into(),
            elapsed_s: round_to(seconds, 6),
            credits: round_to(seconds * CREDITS_PER_SECOND, 8),
        });
        &self.entries[index]
    }

    pub fn entries(&self) -> &[CreditEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn report(&self) -> CreditReport {
        let total_elapsed_s: f64 = self.entries.iter().map(|e| e.elapsed_s).sum();
        let total_credits: f64 = self.entries.iter().map(|e| e.credits).sum();
        CreditReport {
            entries: self.entries.clone(),
            total_elapsed_s: round_to(total_elapsed_s, 6),
            total_credits: round_to(total_credits, 8),
        }
    }
}

/// Grid table of a credit report, with a trailing TOTAL row.
pub fn render_credit_table(report: &CreditReport) -> String {
    if report.entries.is_empty() {
        return EMPTY_REPORT.to_string();
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Query Label", "Time (s)", "Credits"]);
    for entry in &report.entries {
        table.add_row(vec![
            Cell::new(&entry.label),
            Cell::new(format!("{:.4}", entry.elapsed_s)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.6}", entry.credits)).set_alignment(CellAlignment::Right),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL"),
        Cell::new(format!("{:.4}", report.total_elapsed_s)).set_alignment(CellAlignment::Right),
        Cell::new(format!("{:.6}", report.total_credits)).set_alignment(CellAlignment::Right),
    ]);
    table.to_string()
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credits_are_elapsed_over_sixty() {
        let mut ledger = CreditLedger::new();
        let entry = ledger.record("daily revenue", Duration::from_secs(30)).clone();
        assert_eq!(entry.elapsed_s, 30.0);
        assert_eq!(entry.credits, 0.5);

        ledger.record("dedupe users", Duration::from_millis(1500));
        let report = ledger.report();
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.total_elapsed_s, 31.5);
        assert_eq!(report.total_credits, 0.525);
    }

    #[test]
    fn entries_are_rounded() {
        let mut ledger = CreditLedger::new();
        let entry = ledger.record("q", Duration::from_nanos(1_234_567_891)).clone();
        assert_eq!(entry.elapsed_s, 1.234568);
        assert_eq!(entry.credits, 0.02057613);
    }

    #[test]
    fn empty_ledger_reports_zero() {
        let report = CreditLedger::new().report();
        assert!(report.entries.is_empty());
        assert_eq!(report.total_elapsed_s, 0.0);
        assert_eq!(report.total_credits, 0.0);
        assert_eq!(render_credit_table(&report), "No queries tracked yet.");
    }

    #[test]
    fn table_lists_entries_and_total() {
        let mut ledger = CreditLedger::new();
        ledger.record("load bronze", Duration::from_secs(6));
        ledger.record("build gold", Duration::from_secs(12));
        let rendered = render_credit_table(&ledger.report());

        assert!(rendered.contains("Query Label"));
        assert!(rendered.contains("load bronze"));
        assert!(rendered.contains("build gold"));
        assert!(rendered.contains("TOTAL"));
        assert!(rendered.contains("18.0000"));
        assert!(rendered.contains("0.300000"));
        let total_line = rendered.lines().position(|l| l.contains("TOTAL")).unwrap();
        let gold_line = rendered.lines().position(|l| l.contains("build gold")).unwrap();
        assert!(total_line > gold_line);
    }
}
