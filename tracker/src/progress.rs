//! Progress aggregation: pure reductions over the selection, the length
//! table, and connector status.
//!
//! Nothing here is stored; every figure is recomputed on read.

#[cfg(test)]
#[path = "progress_test.rs"]
mod progress_test;

use serde::Serialize;

use crate::connectors::ConnectorStats;
use crate::lengths::LengthTable;
use crate::selection::SelectionSet;

/// Summed `plus` / `minus` lengths over a selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub plus: f64,
    pub minus: f64,
}

impl Totals {
    /// Combined DC cable length.
    #[must_use]
    pub fn dc(&self) -> f64 {
        self.plus + self.minus
    }
}

/// Sum lengths of every selected id. Ids missing from a map contribute zero.
#[must_use]
pub fn totals(selection: &SelectionSet, lengths: &LengthTable) -> Totals {
    selection.iter().fold(Totals::default(), |acc, id| Totals {
        plus: acc.plus + lengths.plus(id).unwrap_or(0.0),
        minus: acc.minus + lengths.minus(id).unwrap_or(0.0),
    })
}

/// `part / whole` as a percentage; `0` when there is nothing to measure against.
#[must_use]
pub fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole * 100.0 } else { 0.0 }
}

/// Everything the stats panel shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub selected: usize,
    pub totals: Totals,
    /// Sum of every `plus` and `minus` length in the table.
    pub field_total: f64,
    pub dc_percent: f64,
    pub connectors: ConnectorStats,
    pub mc4_percent: f64,
}

impl ProgressSummary {
    #[must_use]
    pub fn compute(selection: &SelectionSet, lengths: &LengthTable, connectors: ConnectorStats) -> Self {
        let totals = totals(selection, lengths);
        let field_total = lengths.field_total();
        #[allow(clippy::cast_precision_loss)]
        let mc4_percent = percent(connectors.installed as f64, connectors.total as f64);
        Self {
            selected: selection.len(),
            totals,
            field_total,
            dc_percent: percent(totals.dc(), field_total),
            connectors,
            mc4_percent,
        }
    }
}

/// One day's submitted work, handed to the external daily log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRecord {
    pub date: String,
    pub subcontractor: String,
    pub workers: u32,
    /// DC length selected since the previous submit, in metres.
    pub installed_length: f64,
}

impl DailyRecord {
    /// Short axis label for progress charts, e.g. `BZ-23` or `ACM-4`.
    #[must_use]
    pub fn chart_label(&self) -> String {
        let sub: String = self.subcontractor.chars().take(3).collect::<String>().to_uppercase();
        format!("{sub}-{}", self.workers)
    }
}
