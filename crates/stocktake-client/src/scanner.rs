//! # Barcode Scan Listener
//!
//! Turns a scanned code into "+1" on the matching line.
//!
//! ## Scan Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  code ──► trim ──► empty? ──────────────────────────────► Ignored       │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │            ProductLookup::lookup ──► error ──► notify, Err (no retry)   │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │     resolve product (variation's product first, else product)          │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │   ledger line with that product OR that barcode?                        │
//! │        │ yes                               │ no                         │
//! │        ▼                                   ▼                            │
//! │   increment by 1 (reload)             UnknownItem, info notification    │
//! │   → Counted                           (no write)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Event Loop
//! [`ScanListener`] drains a channel of raw scan events (hardware wedge,
//! virtual keypad, stdin) one at a time, so scans are applied in the order
//! they arrived.

use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use stocktake_core::validation::{ensure_editable, validate_barcode};
use stocktake_core::StockTakeSession;

use crate::backend::ProductLookup;
use crate::error::{ClientError, ClientResult};
use crate::mutation::CountMutationController;
use crate::notify::{Notification, Notifier};

/// What a scan did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Blank input.
    Ignored,
    /// The matching line was incremented.
    Counted { item_id: String, counted_qty: i64 },
    /// No line in this stock-take matches the code.
    UnknownItem { barcode: String },
}

// =============================================================================
// Scanner
// =============================================================================

pub struct BarcodeScanner {
    lookup: Arc<dyn ProductLookup>,
    mutations: Arc<CountMutationController>,
    notifier: Arc<dyn Notifier>,
    session: Arc<RwLock<StockTakeSession>>,
}

impl BarcodeScanner {
    pub fn new(
        lookup: Arc<dyn ProductLookup>,
        mutations: Arc<CountMutationController>,
        notifier: Arc<dyn Notifier>,
        session: Arc<RwLock<StockTakeSession>>,
    ) -> Self {
        BarcodeScanner {
            lookup,
            mutations,
            notifier,
            session,
        }
    }

    /// Handles one scanned code.
    pub async fn handle_scan(&self, code: &str) -> ClientResult<ScanOutcome> {
        if code.trim().is_empty() {
            return Ok(ScanOutcome::Ignored);
        }

        let barcode = match validate_barcode(code) {
            Ok(barcode) => barcode,
            Err(e) => return Err(self.fail(e.into())),
        };

        if let Err(e) = ensure_editable(&*self.session.read().await) {
            return Err(self.fail(e.into()));
        }

        let lookup = match self.lookup.lookup(&barcode).await {
            Ok(result) => result,
            Err(e) => {
                warn!(barcode = %barcode, error = %e, "Product lookup failed");
                return Err(self.fail(e));
            }
        };

        let matched = self
            .mutations
            .ledger()
            .read()
            .await
            .find_scan_match(lookup.resolve_product_id(), &barcode)
            .map(|item| item.id.clone());

        let Some(item_id) = matched else {
            info!(barcode = %barcode, "Scanned code matches no line");
            self.notifier.notify(Notification::info(
                "Item not in this stock-take",
                format!(
                    "No item matches barcode {}. Create a product with this barcode to count it.",
                    barcode
                ),
            ));
            return Ok(ScanOutcome::UnknownItem { barcode });
        };

        debug!(barcode = %barcode, item_id = %item_id, "Scan matched line");

        let outcome = self.mutations.increment(&item_id, 1).await?;
        Ok(ScanOutcome::Counted {
            counted_qty: outcome.counted_qty().unwrap_or_default(),
            item_id,
        })
    }

    fn fail(&self, err: ClientError) -> ClientError {
        self.notifier
            .notify(Notification::failure("Scan failed", err.user_message()));
        err
    }
}

// =============================================================================
// Listener Loop
// =============================================================================

/// Feeds raw scan events through a [`BarcodeScanner`].
pub struct ScanListener {
    scanner: Arc<BarcodeScanner>,
    outcomes: Option<mpsc::Sender<ClientResult<ScanOutcome>>>,
    shutdown_rx: Option<mpsc::Receiver<()>>,
}

impl ScanListener {
    pub fn new(scanner: Arc<BarcodeScanner>) -> Self {
        ScanListener {
            scanner,
            outcomes: None,
            shutdown_rx: None,
        }
    }

    /// Forwards every scan result on `tx`.
    pub fn with_outcomes(mut self, tx: mpsc::Sender<ClientResult<ScanOutcome>>) -> Self {
        self.outcomes = Some(tx);
        self
    }

    /// Stops the loop when a message arrives (or the sender is dropped).
    pub fn with_shutdown(mut self, rx: mpsc::Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Processes events until the channel closes or shutdown is signalled.
    ///
    /// Returns the number of events handled. A failing scan doesn't stop
    /// the loop; its error is forwarded like any other outcome.
    pub async fn run(mut self, mut events: mpsc::Receiver<String>) -> usize {
        info!("Scan listener started");
        let mut handled = 0usize;

        loop {
            let code = tokio::select! {
                biased;

                _ = wait_shutdown(&mut self.shutdown_rx) => {
                    info!("Scan listener shutting down");
                    break;
                }

                event = events.recv() => match event {
                    Some(code) => code,
                    None => {
                        debug!("Scan channel closed");
                        break;
                    }
                },
            };

            let result = self.scanner.handle_scan(&code).await;
            handled += 1;

            if let Some(tx) = &self.outcomes {
                if tx.send(result).await.is_err() {
                    debug!("Outcome receiver dropped, stopping listener");
                    break;
                }
            }
        }

        handled
    }
}

async fn wait_shutdown(rx: &mut Option<mpsc::Receiver<()>>) {
    match rx {
        Some(rx) => {
            rx.recv().await;
        }
        None => std::future::pending::<()>().await,
    }
}
