//! # Item Ledger
//!
//! The in-memory set of line items of the active stock-take.
//!
//! ## Read-After-Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Ledger Refresh Discipline                            │
//! │                                                                         │
//! │   mutation ──► backend ──► (settle) ──► GET items ──► Ledger::replace   │
//! │                                                                         │
//! │   The ledger is NEVER patched field-by-field. After every write the     │
//! │   whole list is fetched again and swapped in, so server-computed        │
//! │   fields can't diverge from what the client shows.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::StockTakeItem;

/// All line items of one stock-take session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    items: Vec<StockTakeItem>,
}

impl Ledger {
    /// Creates a ledger from a freshly fetched item list.
    pub fn new(items: Vec<StockTakeItem>) -> Self {
        Ledger { items }
    }

    /// Replaces every item with the backend's current list.
    pub fn replace(&mut self, items: Vec<StockTakeItem>) {
        self.items = items;
    }

    /// All items in backend order.
    pub fn items(&self) -> &[StockTakeItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Looks up an item by its line id.
    pub fn get(&self, item_id: &str) -> Option<&StockTakeItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    /// Like [`Ledger::get`], but a missing line is an error.
    pub fn require(&self, item_id: &str) -> CoreResult<&StockTakeItem> {
        self.get(item_id)
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))
    }

    /// Finds the line a scan refers to.
    ///
    /// A line matches when its product is the one the lookup resolved to, or
    /// when its own barcode equals the scanned code. First match wins.
    pub fn find_scan_match(
        &self,
        resolved_product_id: Option<&str>,
        barcode: &str,
    ) -> Option<&StockTakeItem> {
        self.items.iter().find(|item| {
            resolved_product_id.is_some_and(|pid| item.product_id == pid)
                || item.has_barcode(barcode)
        })
    }

    /// Number of lines with a recorded count.
    pub fn counted_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_counted()).count()
    }

    /// Lines still waiting to be counted.
    pub fn remaining(&self) -> impl Iterator<Item = &StockTakeItem> {
        self.items.iter().filter(|i| !i.is_counted())
    }

    /// Lines with a recorded count.
    pub fn counted(&self) -> impl Iterator<Item = &StockTakeItem> {
        self.items.iter().filter(|i| i.is_counted())
    }
}
