//! # Domain Types
//!
//! Core domain types of the stock-taking reconciliation flow.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐        ┌─────────────────────────┐             │
//! │  │  StockTakeSession   │ 1    * │    StockTakeItem        │             │
//! │  │  ─────────────────  │◄───────│  ─────────────────────  │             │
//! │  │  id                 │        │  id (server assigned)   │             │
//! │  │  outlet_id          │        │  product_id / name      │             │
//! │  │  operating_date     │        │  barcode                │             │
//! │  │  status             │        │  expected_qty (r/o)     │             │
//! │  └─────────────────────┘        │  counted_qty            │             │
//! │                                 │  difference()  derived  │             │
//! │  ┌─────────────────────┐        │  is_counted()  derived  │             │
//! │  │   SessionStatus     │        └─────────────────────────┘             │
//! │  │  Running ──► Completed (terminal)                                    │
//! │  └─────────────────────┘                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Derived Fields
//! `difference` and `is_counted` are never stored. Both are computed from
//! `counted_qty` and `expected_qty` on every read, so they cannot drift from
//! the quantities the backend last reported.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Session Status
// =============================================================================

/// Lifecycle status of a stock-take session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Counting in progress; items may be edited.
    #[default]
    Running,
    /// Finalized; stock adjustments applied. Terminal.
    Completed,
}

impl SessionStatus {
    /// Returns true once the session can no longer change.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Running => write!(f, "RUNNING"),
            SessionStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

// =============================================================================
// Stock-Take Session
// =============================================================================

/// A stock-take session for one outlet on one operating date.
///
/// Sessions are created by the backend ("start stock take"); the client only
/// reads them and eventually asks the backend to complete them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockTakeSession {
    /// Session identifier.
    pub id: String,

    /// Outlet whose stock is being counted.
    pub outlet_id: String,

    /// Business day the count belongs to.
    #[ts(as = "String")]
    pub operating_date: NaiveDate,

    /// Free-text description entered when the session was started.
    pub description: Option<String>,

    /// Current lifecycle status.
    pub status: SessionStatus,
}

impl StockTakeSession {
    /// Returns true while item counts may still be edited.
    #[inline]
    pub fn is_editable(&self) -> bool {
        !self.status.is_terminal()
    }
}

// =============================================================================
// Stock-Take Item
// =============================================================================

/// One line of a stock-take: a product with its expected and counted stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockTakeItem {
    /// Line identifier (server assigned).
    pub id: String,

    /// Product being counted.
    pub product_id: String,

    /// Product display name.
    pub product_name: String,

    /// Product barcode, when the product has one.
    pub barcode: Option<String>,

    /// Baseline computed by the backend when the session started.
    pub expected_qty: i64,

    /// Quantity physically counted so far (never negative).
    pub counted_qty: i64,
}

impl StockTakeItem {
    /// Counted minus expected. Negative means shortage.
    #[inline]
    pub fn difference(&self) -> i64 {
        self.counted_qty - self.expected_qty
    }

    /// A line counts as counted once any quantity has been recorded.
    #[inline]
    pub fn is_counted(&self) -> bool {
        self.counted_qty > 0
    }

    /// Returns true if the scanned code is this line's own barcode.
    pub fn has_barcode(&self, code: &str) -> bool {
        self.barcode.as_deref() == Some(code)
    }
}

// =============================================================================
// Product Lookup
// =============================================================================

/// A product returned by the product-lookup service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductHit {
    pub id: String,
    pub name: Option<String>,
    pub barcode: Option<String>,
}

/// A product variation returned by the product-lookup service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VariationHit {
    pub id: String,
    /// Owning product.
    pub product_id: String,
    pub barcode: Option<String>,
}

/// Result of looking up a barcode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LookupResult {
    #[serde(default)]
    pub products: Vec<ProductHit>,
    #[serde(default)]
    pub variations: Vec<VariationHit>,
}

impl LookupResult {
    /// Resolves the product a scan refers to.
    ///
    /// A matched variation wins (its owning product is used), otherwise the
    /// first matched product.
    pub fn resolve_product_id(&self) -> Option<&str> {
        self.variations
            .first()
            .map(|v| v.product_id.as_str())
            .or_else(|| self.products.first().map(|p| p.id.as_str()))
    }

    /// Returns true when the lookup matched nothing at all.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.variations.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(counted: i64, expected: i64) -> StockTakeItem {
        StockTakeItem {
            id: "line-1".into(),
            product_id: "P1".into(),
            product_name: "Cola 330ml".into(),
            barcode: Some("123456".into()),
            expected_qty: expected,
            counted_qty: counted,
        }
    }

    #[test]
    fn test_difference_is_derived() {
        assert_eq!(item(3, 10).difference(), -7);
        assert_eq!(item(12, 10).difference(), 2);
        assert_eq!(item(0, 0).difference(), 0);
    }

    #[test]
    fn test_is_counted() {
        assert!(!item(0, 10).is_counted());
        assert!(item(1, 10).is_counted());
    }

    #[test]
    fn test_status_terminal() {
        assert!(!SessionStatus::Running.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
        assert_eq!(SessionStatus::default(), SessionStatus::Running);
    }

    #[test]
    fn test_status_serializes_uppercase() {
        let json = serde_json::to_string(&SessionStatus::Completed).unwrap();
        assert_eq!(json, "\"COMPLETED\"");
    }

    #[test]
    fn test_lookup_prefers_variation() {
        let result = LookupResult {
            products: vec![ProductHit {
                id: "P2".into(),
                name: None,
                barcode: None,
            }],
            variations: vec![VariationHit {
                id: "V1".into(),
                product_id: "P1".into(),
                barcode: Some("123456".into()),
            }],
        };
        assert_eq!(result.resolve_product_id(), Some("P1"));
    }

    #[test]
    fn test_lookup_falls_back_to_product() {
        let result = LookupResult {
            products: vec![ProductHit {
                id: "P2".into(),
                name: Some("Water".into()),
                barcode: None,
            }],
            variations: vec![],
        };
        assert_eq!(result.resolve_product_id(), Some("P2"));
        assert_eq!(LookupResult::default().resolve_product_id(), None);
        assert!(LookupResult::default().is_empty());
    }
}
