//! # Session Summary & Variance Report
//!
//! Totals for the header of the stock-take screen and the list of lines
//! whose count differs from the expected stock.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::filter::compare_names;
use crate::ledger::Ledger;
use crate::types::StockTakeItem;

/// Header totals of a stock-take.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionSummary {
    pub item_count: usize,
    pub counted_count: usize,
    pub remaining_count: usize,
    pub total_expected: i64,
    pub total_counted: i64,
    /// Sum of all line differences (counted − expected).
    pub net_difference: i64,
}

impl SessionSummary {
    pub fn from_ledger(ledger: &Ledger) -> Self {
        let mut summary = SessionSummary {
            item_count: ledger.len(),
            ..Default::default()
        };

        for item in ledger.items() {
            if item.is_counted() {
                summary.counted_count += 1;
            }
            summary.total_expected += item.expected_qty;
            summary.total_counted += item.counted_qty;
        }

        summary.remaining_count = summary.item_count - summary.counted_count;
        summary.net_difference = summary.total_counted - summary.total_expected;
        summary
    }

    /// True when at least one line has been counted.
    pub fn can_complete(&self) -> bool {
        self.counted_count > 0
    }
}

/// One line of the variance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VarianceLine {
    pub item_id: String,
    pub product_name: String,
    pub expected_qty: i64,
    pub counted_qty: i64,
    pub difference: i64,
}

impl From<&StockTakeItem> for VarianceLine {
    fn from(item: &StockTakeItem) -> Self {
        VarianceLine {
            item_id: item.id.clone(),
            product_name: item.product_name.clone(),
            expected_qty: item.expected_qty,
            counted_qty: item.counted_qty,
            difference: item.difference(),
        }
    }
}

/// Lines with a non-zero difference, split into shortages and overages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VarianceReport {
    pub summary: SessionSummary,
    /// Counted below expected.
    pub shortages: Vec<VarianceLine>,
    /// Counted above expected.
    pub overages: Vec<VarianceLine>,
}

impl VarianceReport {
    /// Builds the report. Uncounted lines are included: completing the
    /// session books them as shortages.
    pub fn from_ledger(ledger: &Ledger) -> Self {
        let mut lines: Vec<&StockTakeItem> = ledger
            .items()
            .iter()
            .filter(|i| i.difference() != 0)
            .collect();
        lines.sort_by(|a, b| compare_names(a, b));

        let (short, over): (Vec<&StockTakeItem>, Vec<&StockTakeItem>) =
            lines.into_iter().partition(|i| i.difference() < 0);

        VarianceReport {
            summary: SessionSummary::from_ledger(ledger),
            shortages: short.into_iter().map(VarianceLine::from).collect(),
            overages: over.into_iter().map(VarianceLine::from).collect(),
        }
    }

    pub fn is_balanced(&self) -> bool {
        self.shortages.is_empty() && self.overages.is_empty()
    }
}
