//! # stocktake-client: Reconciliation Flow over the Inventory Backend
//!
//! Drives one stock-take against the REST backend: loading the session,
//! counting lines by hand or by scanner, bulk-filling and saving, and the
//! final commit.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock-Take Client Architecture                       │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │          StockTakeSessionController (one per open session)       │  │
//! │  │                                                                  │  │
//! │  │  Owns session header + Arc<RwLock<Ledger>>                      │  │
//! │  │  Gates edits on status, asks for confirmation                    │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ BarcodeScanner │  │ CountMutation  │  │  BulkOperations        │    │
//! │  │ + ScanListener │─►│ Controller     │  │                        │    │
//! │  │                │  │                │  │ auto-complete, save    │    │
//! │  │ lookup → +1    │  │ per-item lanes │  │ bounded fan-out        │    │
//! │  └────────────────┘  └───────┬────────┘  └───────────┬────────────┘    │
//! │                              │                       │                  │
//! │                              ▼                       ▼                  │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  StockTakeBackend / ProductLookup  (HttpBackend over reqwest)    │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  CAPABILITIES (injected):                                              │
//! │  • Notifier   - success / info / failure toasts                        │
//! │  • Confirmer  - yes/no before irreversible or bulk actions             │
//! │  • SessionContext - outlet and shift the operator works in             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`session`] - Session lifecycle and gating
//! - [`mutation`] - Single-line count writes with read-after-write reload
//! - [`bulk`] - Auto-complete and save progress
//! - [`scanner`] - Barcode resolution and the scan event loop
//! - [`backend`] - Backend traits
//! - [`http`] - `reqwest` backend
//! - [`config`] - TOML + environment configuration
//! - [`notify`] / [`confirm`] - Operator capabilities
//! - [`error`] - Client error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stocktake_client::{
//!     AutoConfirm, ClientConfig, HttpBackend, SessionDeps, StockTakeSessionController,
//!     TracingNotifier,
//! };
//!
//! let config = ClientConfig::load_or_default(None);
//! let backend = Arc::new(HttpBackend::new(&config.backend)?);
//! let deps = SessionDeps {
//!     notifier: Arc::new(TracingNotifier),
//!     confirmer: Arc::new(AutoConfirm),
//!     settings: config.session.clone(),
//!     context: config.context.clone(),
//! };
//!
//! let controller =
//!     StockTakeSessionController::open(backend.clone(), backend, deps, "st-1").await?;
//! controller.scan("5449000000996").await?;
//! println!("{:?}", controller.summary().await);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod bulk;
pub mod config;
pub mod confirm;
pub mod error;
pub mod http;
pub mod mutation;
pub mod notify;
pub mod scanner;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::{ProductLookup, StockTakeBackend};
pub use bulk::BulkOperations;
pub use config::{BackendSettings, ClientConfig, SessionContext, SessionSettings};
pub use confirm::{AutoConfirm, ConfirmPrompt, Confirmer, DenyAll};
pub use error::{ClientError, ClientResult};
pub use http::HttpBackend;
pub use mutation::{CountIntent, CountMutationController, MutationOutcome};
pub use notify::{NoOpNotifier, Notification, Notifier, Tone, TracingNotifier};
pub use scanner::{BarcodeScanner, ScanListener, ScanOutcome};
pub use session::{Completion, SessionDeps, StockTakeSessionController};

// Domain types callers need alongside the controllers
pub use stocktake_core::{
    ItemFilter, Ledger, SessionStatus, SessionSummary, StatusFilter, StockTakeItem,
    StockTakeSession, VarianceReport,
};
