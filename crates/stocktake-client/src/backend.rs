//! # Backend Traits
//!
//! The two remote collaborators of the flow, expressed as object-safe async
//! traits so controllers can run against the HTTP backend or an in-memory
//! fake.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  StockTakeBackend                                                       │
//! │  ├── fetch_session      GET    {base}/stock-takes/{id}                  │
//! │  ├── fetch_items        GET    {base}/stock-takes/{id}/items            │
//! │  ├── update_item_count  PATCH  {base}/stock-takes/{id}/items/{item}     │
//! │  ├── complete_session   POST   {base}/stock-takes/{id}/complete         │
//! │  └── delete_session     DELETE {base}/stock-takes/{id}                  │
//! │                                                                         │
//! │  ProductLookup                                                          │
//! │  └── lookup             GET    {base}/products/lookup?barcode=          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Implementations return already-normalized domain types; raw JSON never
//! leaves the implementation.

use async_trait::async_trait;
use stocktake_core::{LookupResult, StockTakeItem, StockTakeSession};

use crate::error::ClientResult;

/// Inventory backend holding stock-take sessions and their lines.
#[async_trait]
pub trait StockTakeBackend: Send + Sync {
    async fn fetch_session(&self, session_id: &str) -> ClientResult<StockTakeSession>;

    async fn fetch_items(&self, session_id: &str) -> ClientResult<Vec<StockTakeItem>>;

    /// Persists an absolute count. The backend recomputes its derived fields.
    async fn update_item_count(
        &self,
        session_id: &str,
        item_id: &str,
        counted_qty: i64,
    ) -> ClientResult<()>;

    /// Commits the session; the backend applies the stock adjustments.
    async fn complete_session(&self, session_id: &str) -> ClientResult<()>;

    async fn delete_session(&self, session_id: &str) -> ClientResult<()>;
}

/// Barcode → product resolution.
#[async_trait]
pub trait ProductLookup: Send + Sync {
    async fn lookup(&self, barcode: &str) -> ClientResult<LookupResult>;
}
