//! # stocktake-core: Pure Domain Logic for Stock-Taking
//!
//! Everything the reconciliation flow decides without touching the network:
//! what a line item is, how backend JSON becomes one, which lines a search
//! shows, and when a session may be edited or completed.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Stocktake Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              apps/stocktake-cli (or any frontend)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │   stocktake-client: REST backend, mutation controller, bulk     │   │
//! │  │   operations, scan listener, session lifecycle                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stocktake-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌────────┐ ┌────────┐ ┌────────┐ ┌────────────┐  │   │
//! │  │   │  types  │ │  wire  │ │ ledger │ │ filter │ │ validation │  │   │
//! │  │   └─────────┘ └────────┘ └────────┘ └────────┘ └────────────┘  │   │
//! │  │   ┌─────────┐ ┌────────┐                                       │   │
//! │  │   │  count  │ │ report │     NO I/O • NO NETWORK • NO TIMERS   │   │
//! │  │   └─────────┘ └────────┘                                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Session, line item, lookup result
//! - [`wire`] - Backend JSON → strict types (fails loudly)
//! - [`ledger`] - In-memory line items of the active session
//! - [`filter`] - Search/status views over the ledger
//! - [`count`] - Count input coercion
//! - [`report`] - Summary totals and variance report
//! - [`validation`] - Input validation and session gating
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use stocktake_core::filter::{ItemFilter, StatusFilter};
//! use stocktake_core::wire::parse_items;
//! use stocktake_core::Ledger;
//!
//! let payload = serde_json::json!([
//!     {"id": 1, "product": {"id": "P1", "name": "Cola", "barcode": "123456"},
//!      "expected_quantity": 10, "counted_quantity": 3},
//!     {"id": 2, "product": {"id": "P2", "name": "Water"},
//!      "expected_quantity": 4, "counted_quantity": 0},
//! ]);
//!
//! let ledger = Ledger::new(parse_items(&payload).unwrap());
//! let remaining = ItemFilter::status(StatusFilter::Remaining).apply(&ledger);
//!
//! assert_eq!(remaining.len(), 1);
//! assert_eq!(ledger.get("1").unwrap().difference(), -7);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod count;
pub mod error;
pub mod filter;
pub mod ledger;
pub mod report;
pub mod types;
pub mod validation;
pub mod wire;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use filter::{ItemFilter, StatusFilter};
pub use ledger::Ledger;
pub use report::{SessionSummary, VarianceLine, VarianceReport};
pub use types::*;
