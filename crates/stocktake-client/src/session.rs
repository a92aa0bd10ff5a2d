//! # Stock-Take Session Controller
//!
//! Owns one stock-take for the lifetime of a screen: the session header, the
//! ledger, and the controllers that change them.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Stock-Take Session Lifecycle                          │
//! │                                                                         │
//! │   (created elsewhere)                                                   │
//! │          │                                                              │
//! │          ▼                                                              │
//! │   ┌─────────────┐  edit_count / scan / auto_complete / save_progress    │
//! │   │   RUNNING   │◄──────────────────────────────────────────┐           │
//! │   └──────┬──────┘                                           │           │
//! │          │ complete()                                       │           │
//! │          │  • ≥ 1 line counted      (else NothingCounted)   │           │
//! │          │  • operator confirms     (else NotConfirmed)     │           │
//! │          │  • POST complete ── failure ─────────────────────┘           │
//! │          ▼                                                              │
//! │   ┌─────────────┐                                                       │
//! │   │  COMPLETED  │  terminal: every edit rejected before the network     │
//! │   └─────────────┘                                                       │
//! │                                                                         │
//! │   delete(): confirmation, then DELETE; the backend decides whether a    │
//! │   completed session may still be removed.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Gating
//! Edits are checked against the session status here, before anything is
//! sent. The [`CountMutationController`] below does not check it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use stocktake_core::count::coerce_count;
use stocktake_core::filter::counted_view;
use stocktake_core::validation::{ensure_completable, ensure_editable, validate_item_id};
use stocktake_core::{
    ItemFilter, Ledger, SessionStatus, SessionSummary, StockTakeItem, StockTakeSession,
    VarianceReport,
};

use crate::backend::{ProductLookup, StockTakeBackend};
use crate::bulk::BulkOperations;
use crate::config::{SessionContext, SessionSettings};
use crate::confirm::{ConfirmPrompt, Confirmer};
use crate::error::{ClientError, ClientResult};
use crate::mutation::{refresh_ledger, CountMutationController, MutationOutcome};
use crate::notify::{Notification, Notifier};
use crate::scanner::{BarcodeScanner, ScanListener, ScanOutcome};

const COMPLETE: &str = "Complete stock-take";
const DELETE: &str = "Delete stock-take";

/// Capabilities and settings a controller is built with.
#[derive(Clone)]
pub struct SessionDeps {
    pub notifier: Arc<dyn Notifier>,
    pub confirmer: Arc<dyn Confirmer>,
    pub settings: SessionSettings,
    pub context: SessionContext,
}

/// Returned by a successful [`StockTakeSessionController::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// How long a frontend waits before leaving the screen.
    pub navigate_after: Duration,
}

pub struct StockTakeSessionController {
    session_id: String,
    backend: Arc<dyn StockTakeBackend>,
    session: Arc<RwLock<StockTakeSession>>,
    ledger: Arc<RwLock<Ledger>>,
    mutations: Arc<CountMutationController>,
    bulk: BulkOperations,
    scanner: Arc<BarcodeScanner>,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
    settings: SessionSettings,
    context: SessionContext,
}

impl StockTakeSessionController {
    /// Loads the session header and its lines.
    #[instrument(skip(backend, lookup, deps))]
    pub async fn open(
        backend: Arc<dyn StockTakeBackend>,
        lookup: Arc<dyn ProductLookup>,
        deps: SessionDeps,
        session_id: &str,
    ) -> ClientResult<Self> {
        let loaded = async {
            let session = backend.fetch_session(session_id).await?;
            let items = backend.fetch_items(session_id).await?;
            Ok::<_, ClientError>((session, items))
        }
        .await;

        let (session, items) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                deps.notifier.notify(Notification::failure(
                    "Stock-take not loaded",
                    e.user_message(),
                ));
                return Err(e);
            }
        };

        if let Some(outlet) = &deps.context.outlet_id {
            if outlet != &session.outlet_id {
                warn!(
                    configured = %outlet,
                    session_outlet = %session.outlet_id,
                    "Stock-take belongs to a different outlet"
                );
            }
        }

        info!(
            status = %session.status,
            items = items.len(),
            "Stock-take opened"
        );

        let session = Arc::new(RwLock::new(session));
        let ledger = Arc::new(RwLock::new(Ledger::new(items)));

        let mutations = Arc::new(CountMutationController::new(
            session_id,
            backend.clone(),
            deps.notifier.clone(),
            ledger.clone(),
            deps.settings.settle_delay(),
        ));
        let bulk = BulkOperations::new(
            mutations.clone(),
            deps.notifier.clone(),
            deps.confirmer.clone(),
            deps.settings.bulk_concurrency,
        );
        let scanner = Arc::new(BarcodeScanner::new(
            lookup,
            mutations.clone(),
            deps.notifier.clone(),
            session.clone(),
        ));

        Ok(StockTakeSessionController {
            session_id: session_id.to_string(),
            backend,
            session,
            ledger,
            mutations,
            bulk,
            scanner,
            notifier: deps.notifier,
            confirmer: deps.confirmer,
            settings: deps.settings,
            context: deps.context,
        })
    }

    // =========================================================================
    // State
    // =========================================================================

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub async fn session(&self) -> StockTakeSession {
        self.session.read().await.clone()
    }

    pub async fn ledger(&self) -> Ledger {
        self.ledger.read().await.clone()
    }

    /// Fetches header and lines again.
    pub async fn reload(&self) -> ClientResult<()> {
        let session = self.backend.fetch_session(&self.session_id).await?;
        *self.session.write().await = session;
        refresh_ledger(self.backend.as_ref(), &self.session_id, &self.ledger).await?;
        Ok(())
    }

    pub async fn can_edit(&self) -> bool {
        self.session.read().await.is_editable()
    }

    /// Running and at least one line counted.
    pub async fn can_complete(&self) -> bool {
        let session = self.session.read().await;
        let ledger = self.ledger.read().await;
        ensure_completable(&session, &ledger).is_ok()
    }

    pub fn is_saving(&self) -> bool {
        self.bulk.is_saving()
    }

    pub fn is_auto_completing(&self) -> bool {
        self.bulk.is_auto_completing()
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub async fn filtered(&self, filter: &ItemFilter) -> Vec<StockTakeItem> {
        let ledger = self.ledger.read().await;
        filter.apply(&ledger).into_iter().cloned().collect()
    }

    /// Counted lines by product name, regardless of any search.
    pub async fn counted_items(&self) -> Vec<StockTakeItem> {
        let ledger = self.ledger.read().await;
        counted_view(&ledger).into_iter().cloned().collect()
    }

    pub async fn summary(&self) -> SessionSummary {
        SessionSummary::from_ledger(&*self.ledger.read().await)
    }

    pub async fn variance_report(&self) -> VarianceReport {
        VarianceReport::from_ledger(&*self.ledger.read().await)
    }

    // =========================================================================
    // Edits
    // =========================================================================

    /// Sets a line's count from raw operator input ("7", "2.9", "-1", "").
    pub async fn edit_count(&self, item_id: &str, input: &str) -> ClientResult<MutationOutcome> {
        if let Err(e) = self.ensure_editable().await {
            return Err(self.reject("Count not saved", e));
        }
        if let Err(e) = validate_item_id(item_id) {
            return Err(self.reject("Count not saved", e.into()));
        }

        self.mutations.set_count(item_id, coerce_count(input)).await
    }

    pub async fn scan(&self, code: &str) -> ClientResult<ScanOutcome> {
        self.scanner.handle_scan(code).await
    }

    pub async fn auto_complete(&self) -> ClientResult<usize> {
        if let Err(e) = self.ensure_editable().await {
            return Err(self.reject("Auto-complete", e));
        }
        self.bulk.auto_complete().await
    }

    pub async fn save_progress(&self) -> ClientResult<usize> {
        if let Err(e) = self.ensure_editable().await {
            return Err(self.reject("Save progress", e));
        }
        self.bulk.save_progress().await
    }

    /// A listener that feeds scan events into this session.
    pub fn scan_listener(&self) -> ScanListener {
        ScanListener::new(self.scanner.clone())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Commits the stock-take.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn complete(&self) -> ClientResult<Completion> {
        let gate = {
            let session = self.session.read().await;
            let ledger = self.ledger.read().await;
            ensure_completable(&session, &ledger)
        };
        if let Err(e) = gate {
            return Err(self.reject(COMPLETE, e.into()));
        }

        let counted = self.ledger.read().await.counted_count();
        let prompt = ConfirmPrompt::new(
            COMPLETE,
            format!(
                "Complete this stock-take with {} counted item(s)? Stock levels will be adjusted and counts can no longer change.",
                counted
            ),
        );
        if !self.confirmer.confirm(&prompt).await {
            return Err(ClientError::NotConfirmed {
                action: COMPLETE.to_string(),
            });
        }

        if let Err(e) = self.backend.complete_session(&self.session_id).await {
            warn!(error = %e, "Completing stock-take failed");
            if let Err(reload_err) = self.reload().await {
                warn!(error = %reload_err, "Reload after failed completion also failed");
            }
            self.notifier
                .notify(Notification::failure(COMPLETE, e.user_message()));
            return Err(e);
        }

        if let Err(e) = self.reload().await {
            // committed, but we can't show the final state
            warn!(error = %e, "Reload after completion failed");
            self.session.write().await.status = SessionStatus::Completed;
        }

        info!(counted, "Stock-take completed");
        self.notifier.notify(Notification::success(
            COMPLETE,
            "Stock-take completed. Stock levels have been adjusted.",
        ));

        Ok(Completion {
            navigate_after: self.settings.redirect_delay(),
        })
    }

    /// Removes the stock-take.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn delete(&self) -> ClientResult<()> {
        let prompt = ConfirmPrompt::new(
            DELETE,
            "Delete this stock-take and all of its counts? This cannot be undone.",
        );
        if !self.confirmer.confirm(&prompt).await {
            return Err(ClientError::NotConfirmed {
                action: DELETE.to_string(),
            });
        }

        match self.backend.delete_session(&self.session_id).await {
            Ok(()) => {
                info!("Stock-take deleted");
                self.notifier
                    .notify(Notification::success(DELETE, "Stock-take deleted."));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Deleting stock-take failed");
                self.notifier
                    .notify(Notification::failure(DELETE, e.user_message()));
                Err(e)
            }
        }
    }

    async fn ensure_editable(&self) -> ClientResult<()> {
        ensure_editable(&*self.session.read().await)?;
        Ok(())
    }

    fn reject(&self, title: &str, err: ClientError) -> ClientError {
        self.notifier
            .notify(Notification::failure(title, err.user_message()));
        err
    }
}
