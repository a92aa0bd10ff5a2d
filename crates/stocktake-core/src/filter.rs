//! # Search / Filter Index
//!
//! Read-only views over the [`Ledger`]. Nothing here mutates it.
//!
//! ## Two Independent Views
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Ledger ──┬──► ItemFilter { text, status } ──► search dropdown         │
//! │            │    (text AND status must both hold)                        │
//! │            │                                                            │
//! │            └──► counted_view()  ─────────────► results table            │
//! │                 (is_counted, sorted by name, ignores the search box)    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use ts_rs::TS;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::ValidationError;
use crate::ledger::Ledger;
use crate::types::StockTakeItem;

// =============================================================================
// Status Filter
// =============================================================================

/// Which lines to show by count status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    /// Not counted yet.
    Remaining,
    /// Already counted.
    Counted,
}

impl StatusFilter {
    pub fn accepts(&self, item: &StockTakeItem) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Remaining => !item.is_counted(),
            StatusFilter::Counted => item.is_counted(),
        }
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusFilter::All => write!(f, "all"),
            StatusFilter::Remaining => write!(f, "remaining"),
            StatusFilter::Counted => write!(f, "counted"),
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "remaining" => Ok(StatusFilter::Remaining),
            "counted" => Ok(StatusFilter::Counted),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec!["all".into(), "remaining".into(), "counted".into()],
            }),
        }
    }
}

// =============================================================================
// Item Filter
// =============================================================================

/// Search box text plus status filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemFilter {
    /// Case-insensitive substring of product name or barcode.
    pub text: Option<String>,
    pub status: StatusFilter,
}

impl ItemFilter {
    pub fn new(text: impl Into<String>, status: StatusFilter) -> Self {
        ItemFilter {
            text: Some(text.into()),
            status,
        }
    }

    /// Only filters by status.
    pub fn status(status: StatusFilter) -> Self {
        ItemFilter { text: None, status }
    }

    /// Returns true if the item satisfies both predicates.
    pub fn matches(&self, item: &StockTakeItem) -> bool {
        self.status.accepts(item) && self.text_matches(item)
    }

    fn text_matches(&self, item: &StockTakeItem) -> bool {
        let needle = match self.text.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_lowercase(),
            _ => return true,
        };

        item.product_name.to_lowercase().contains(&needle)
            || item
                .barcode
                .as_deref()
                .is_some_and(|b| b.to_lowercase().contains(&needle))
    }

    /// Applies the filter, keeping ledger order.
    pub fn apply<'a>(&self, ledger: &'a Ledger) -> Vec<&'a StockTakeItem> {
        ledger.items().iter().filter(|i| self.matches(i)).collect()
    }
}

// =============================================================================
// Counted View
// =============================================================================

/// Counted lines for the results table, sorted by product name.
pub fn counted_view(ledger: &Ledger) -> Vec<&StockTakeItem> {
    let mut rows: Vec<&StockTakeItem> = ledger.counted().collect();
    rows.sort_by(|a, b| compare_names(a, b));
    rows
}

/// Collation used for every name-sorted listing.
///
/// Primary key is the name with accents and case folded away, so "Éclair"
/// sorts between "apple" and "Zebra". Case-folded name, raw name and line id
/// break ties so the order is total and stable across reloads.
pub fn compare_names(a: &StockTakeItem, b: &StockTakeItem) -> Ordering {
    collation_key(&a.product_name)
        .cmp(&collation_key(&b.product_name))
        .then_with(|| {
            a.product_name
                .to_lowercase()
                .cmp(&b.product_name.to_lowercase())
        })
        .then_with(|| a.product_name.cmp(&b.product_name))
        .then_with(|| a.id.cmp(&b.id))
}

/// NFD-decomposes, drops combining marks and lowercases.
fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, name: &str, barcode: Option<&str>, counted: i64) -> StockTakeItem {
        StockTakeItem {
            id: id.into(),
            product_id: format!("P{}", id),
            product_name: name.into(),
            barcode: barcode.map(Into::into),
            expected_qty: 4,
            counted_qty: counted,
        }
    }

    fn ledger() -> Ledger {
        Ledger::new(vec![
            line("1", "Cola 330ml", Some("5449000000996"), 2),
            line("2", "cola zero", Some("5449000131805"), 0),
            line("3", "Water 1L", Some("4001234"), 5),
            line("4", "Chips", None, 0),
            line("5", "apple juice", Some("7612345"), 1),
        ])
    }

    fn ids(rows: Vec<&StockTakeItem>) -> Vec<String> {
        rows.into_iter().map(|i| i.id.clone()).collect()
    }

    #[test]
    fn test_text_matches_name_case_insensitive() {
        let f = ItemFilter::new("COLA", StatusFilter::All);
        assert_eq!(ids(f.apply(&ledger())), vec!["1", "2"]);
    }

    #[test]
    fn test_text_matches_barcode() {
        let f = ItemFilter::new("4001", StatusFilter::All);
        assert_eq!(ids(f.apply(&ledger())), vec!["3"]);
    }

    #[test]
    fn test_status_only() {
        let ledger = ledger();
        assert_eq!(
            ids(ItemFilter::status(StatusFilter::Remaining).apply(&ledger)),
            vec!["2", "4"]
        );
        assert_eq!(
            ids(ItemFilter::status(StatusFilter::Counted).apply(&ledger)),
            vec!["1", "3", "5"]
        );
        assert_eq!(ItemFilter::default().apply(&ledger).len(), 5);
    }

    #[test]
    fn test_conjunction_has_no_false_positives_or_negatives() {
        let ledger = ledger();
        for status in [StatusFilter::All, StatusFilter::Remaining, StatusFilter::Counted] {
            for text in ["", "cola", "54490", "ch", "zzz", "  "] {
                let f = ItemFilter::new(text, status);
                let got = ids(f.apply(&ledger));
                let expected: Vec<String> = ledger
                    .items()
                    .iter()
                    .filter(|i| {
                        let t = text.trim().to_lowercase();
                        let text_ok = t.is_empty()
                            || i.product_name.to_lowercase().contains(&t)
                            || i.barcode.as_deref().is_some_and(|b| b.contains(&t));
                        let status_ok = match status {
                            StatusFilter::All => true,
                            StatusFilter::Remaining => i.counted_qty == 0,
                            StatusFilter::Counted => i.counted_qty > 0,
                        };
                        text_ok && status_ok
                    })
                    .map(|i| i.id.clone())
                    .collect();
                assert_eq!(got, expected, "status={} text={:?}", status, text);
            }
        }
    }

    #[test]
    fn test_counted_view_sorts_accented_names_in_place() {
        let ledger = Ledger::new(vec![
            line("1", "Zebra", None, 1),
            line("2", "Éclair", None, 1),
            line("3", "apple", None, 1),
            line("4", "eclair", None, 1),
        ]);
        let names: Vec<&str> = counted_view(&ledger)
            .into_iter()
            .map(|i| i.product_name.as_str())
            .collect();
        assert_eq!(names, vec!["apple", "eclair", "Éclair", "Zebra"]);
    }

    #[test]
    fn test_counted_view_sorted_and_ignores_search() {
        let ledger = ledger();
        assert_eq!(ids(counted_view(&ledger)), vec!["5", "1", "3"]);
    }

    #[test]
    fn test_status_filter_parse() {
        assert_eq!("Remaining".parse::<StatusFilter>().unwrap(), StatusFilter::Remaining);
        assert_eq!("counted".parse::<StatusFilter>().unwrap(), StatusFilter::Counted);
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert!("done".parse::<StatusFilter>().is_err());
    }
}
