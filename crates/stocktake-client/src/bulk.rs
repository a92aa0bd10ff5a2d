//! # Bulk Operations
//!
//! Multi-line writes: auto-complete (fill every uncounted line with its
//! expected quantity) and save progress (re-submit every counted line).
//!
//! ## Fan-Out
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  snapshot ledger ──► [PATCH, PATCH, PATCH, ...]  ──► GET items (once)   │
//! │                       at most `bulk_concurrency`                        │
//! │                       in flight; first failure                          │
//! │                       stops the batch                                   │
//! │                                                                         │
//! │  Every PATCH waits for its line's lane and is re-checked against the    │
//! │  ledger there; lines changed since the snapshot are skipped. The lanes  │
//! │  stay taken until the trailing reload, which runs on success and on     │
//! │  failure.                                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each operation has a busy flag; starting the same operation twice returns
//! [`ClientError::AlreadyInProgress`]. The flags don't block anything else.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt, TryStreamExt};
use tracing::{info, warn};

use crate::confirm::{ConfirmPrompt, Confirmer};
use crate::error::{ClientError, ClientResult, GENERIC_FAILURE};
use crate::mutation::{CountIntent, CountMutationController, HeldLanes, MutationOutcome};
use crate::notify::{Notification, Notifier};

const AUTO_COMPLETE: &str = "Auto-complete";
const SAVE_PROGRESS: &str = "Save progress";

// =============================================================================
// Busy Flag
// =============================================================================

/// Marks one operation as running.
#[derive(Default)]
pub(crate) struct BusyFlag(AtomicBool);

impl BusyFlag {
    pub(crate) fn try_acquire(&self, operation: &'static str) -> ClientResult<BusyGuard<'_>> {
        if self
            .0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ClientError::AlreadyInProgress(operation));
        }
        Ok(BusyGuard(&self.0))
    }

    pub(crate) fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Clears the flag when dropped.
pub(crate) struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// =============================================================================
// Bulk Operations
// =============================================================================

pub struct BulkOperations {
    mutations: Arc<CountMutationController>,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
    concurrency: usize,
    saving: BusyFlag,
    auto_completing: BusyFlag,
}

impl BulkOperations {
    pub fn new(
        mutations: Arc<CountMutationController>,
        notifier: Arc<dyn Notifier>,
        confirmer: Arc<dyn Confirmer>,
        concurrency: usize,
    ) -> Self {
        BulkOperations {
            mutations,
            notifier,
            confirmer,
            concurrency: concurrency.max(1),
            saving: BusyFlag::default(),
            auto_completing: BusyFlag::default(),
        }
    }

    pub fn is_saving(&self) -> bool {
        self.saving.is_set()
    }

    pub fn is_auto_completing(&self) -> bool {
        self.auto_completing.is_set()
    }

    /// Sets every uncounted line to its expected quantity.
    ///
    /// Returns the number of lines written. With nothing left to count no
    /// question is asked and nothing is sent.
    pub async fn auto_complete(&self) -> ClientResult<usize> {
        let _busy = self.auto_completing.try_acquire(AUTO_COMPLETE)?;

        let lines: Vec<String> = self
            .mutations
            .ledger()
            .read()
            .await
            .remaining()
            .map(|item| item.id.clone())
            .collect();

        if lines.is_empty() {
            self.notifier.notify(Notification::info(
                AUTO_COMPLETE,
                "Every item has already been counted.",
            ));
            return Ok(0);
        }

        let prompt = ConfirmPrompt::new(
            AUTO_COMPLETE,
            format!(
                "Set {} uncounted item(s) to their expected quantity?",
                lines.len()
            ),
        );
        if !self.confirmer.confirm(&prompt).await {
            return Err(ClientError::NotConfirmed {
                action: AUTO_COMPLETE.to_string(),
            });
        }

        let written = self.run(AUTO_COMPLETE, CountIntent::FillExpected, lines).await?;
        self.notifier.notify(Notification::success(
            AUTO_COMPLETE,
            format!("{} item(s) set to their expected quantity.", written),
        ));
        Ok(written)
    }

    /// Re-submits every counted line's current count.
    ///
    /// Writes are absolute, so running it twice changes nothing.
    pub async fn save_progress(&self) -> ClientResult<usize> {
        let _busy = self.saving.try_acquire(SAVE_PROGRESS)?;

        let lines: Vec<String> = self
            .mutations
            .ledger()
            .read()
            .await
            .counted()
            .map(|item| item.id.clone())
            .collect();

        let written = self.run(SAVE_PROGRESS, CountIntent::Resubmit, lines).await?;
        self.notifier.notify(Notification::success(
            SAVE_PROGRESS,
            format!("Progress saved ({} item(s)).", written),
        ));
        Ok(written)
    }

    /// Sends all writes with bounded concurrency, then reloads once.
    ///
    /// Returns the number of lines actually written.
    async fn run(
        &self,
        operation: &'static str,
        intent: CountIntent,
        lines: Vec<String>,
    ) -> ClientResult<usize> {
        if lines.is_empty() {
            return Ok(0);
        }

        let _batch = self.mutations.bulk_turn().await;
        let total = lines.len();
        let dispatched = AtomicUsize::new(0);
        let held = HeldLanes::default();

        let result = stream::iter(lines)
            .map(|item_id| {
                let dispatched = &dispatched;
                let held = &held;
                async move {
                    dispatched.fetch_add(1, Ordering::Relaxed);
                    self.mutations.write_held(&item_id, intent, held).await
                }
            })
            .buffer_unordered(self.concurrency)
            .try_collect::<Vec<MutationOutcome>>()
            .await;

        let reloaded = self.mutations.reload().await;
        drop(held);

        match result {
            Ok(outcomes) => {
                let written = outcomes.iter().filter(|o| o.is_applied()).count();
                info!(operation, written, total, "Bulk write finished");
                reloaded?;
                Ok(written)
            }
            Err(e) => {
                let attempted = dispatched.load(Ordering::Relaxed);
                warn!(operation, attempted, total, error = %e, "Bulk write failed");
                if let Err(reload_err) = reloaded {
                    warn!(error = %reload_err, "Reload after failed bulk write also failed");
                }
                self.notifier
                    .notify(Notification::failure(operation, GENERIC_FAILURE));
                Err(ClientError::BulkFailed {
                    operation,
                    attempted,
                    reason: e.user_message(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::AutoConfirm;
    use crate::notify::Tone;
    use crate::testing::{Call, FakeBackend, RecordingNotifier, ScriptedConfirmer, SESSION_ID};
    use std::time::Duration;
    use stocktake_core::Ledger;
    use tokio::sync::RwLock;

    struct Harness {
        backend: Arc<FakeBackend>,
        notifier: Arc<RecordingNotifier>,
        mutations: Arc<CountMutationController>,
        bulk: BulkOperations,
    }

    fn harness(backend: FakeBackend, confirmer: Arc<dyn Confirmer>) -> Harness {
        let backend = Arc::new(backend);
        let notifier = Arc::new(RecordingNotifier::default());
        let ledger = Arc::new(RwLock::new(Ledger::new(backend.items())));
        let mutations = Arc::new(CountMutationController::new(
            SESSION_ID,
            backend.clone(),
            notifier.clone(),
            ledger,
            Duration::ZERO,
        ));
        let bulk = BulkOperations::new(mutations.clone(), notifier.clone(), confirmer, 2);
        Harness {
            backend,
            notifier,
            mutations,
            bulk,
        }
    }

    async fn snapshot(h: &Harness) -> Ledger {
        h.mutations.ledger().read().await.clone()
    }

    #[tokio::test]
    async fn test_auto_complete_fills_every_uncounted_line() {
        let h = harness(FakeBackend::standard(), Arc::new(AutoConfirm));

        let written = h.bulk.auto_complete().await.unwrap();

        assert_eq!(written, 2);
        let mut updates = h.backend.updates();
        updates.sort();
        assert_eq!(updates, vec![("2".to_string(), 4), ("3".to_string(), 6)]);
        assert_eq!(h.backend.count_calls(|c| *c == Call::FetchItems), 1);

        let ledger = snapshot(&h).await;
        assert!(ledger.items().iter().all(|i| i.is_counted()));
        // untouched line keeps its own count
        assert_eq!(ledger.get("1").unwrap().counted_qty, 3);
        assert_eq!(ledger.get("2").unwrap().difference(), 0);
        assert_eq!(ledger.get("3").unwrap().difference(), 0);
    }

    #[tokio::test]
    async fn test_auto_complete_nothing_left() {
        let h = harness(FakeBackend::standard(), Arc::new(AutoConfirm));
        h.bulk.auto_complete().await.unwrap();
        h.backend.clear_calls();

        assert_eq!(h.bulk.auto_complete().await.unwrap(), 0);
        assert!(h.backend.calls().is_empty());
        assert_eq!(h.notifier.last().unwrap().tone, Tone::Info);
    }

    #[tokio::test]
    async fn test_auto_complete_declined_sends_nothing() {
        let confirmer = Arc::new(ScriptedConfirmer::new(false));
        let h = harness(FakeBackend::standard(), confirmer.clone());

        let err = h.bulk.auto_complete().await.unwrap_err();

        assert!(matches!(err, ClientError::NotConfirmed { .. }));
        assert_eq!(confirmer.asked(), 1);
        assert!(h.backend.calls().is_empty());
        assert!(!h.bulk.is_auto_completing());
    }

    #[tokio::test]
    async fn test_save_progress_twice_is_idempotent() {
        let h = harness(FakeBackend::standard(), Arc::new(AutoConfirm));

        assert_eq!(h.bulk.save_progress().await.unwrap(), 1);
        let first = snapshot(&h).await;
        assert_eq!(h.bulk.save_progress().await.unwrap(), 1);
        let second = snapshot(&h).await;

        assert_eq!(first, second);
        assert_eq!(
            h.backend.updates(),
            vec![("1".to_string(), 3), ("1".to_string(), 3)]
        );
        let diffs: Vec<i64> = second.items().iter().map(|i| i.difference()).collect();
        assert_eq!(diffs, vec![-7, -4, -6]);
    }

    #[tokio::test]
    async fn test_failure_reports_generic_message_and_reloads() {
        let h = harness(
            FakeBackend::standard().fail_update("3", "Product archived"),
            Arc::new(AutoConfirm),
        );

        let err = h.bulk.auto_complete().await.unwrap_err();

        match err {
            ClientError::BulkFailed {
                operation,
                attempted,
                ..
            } => {
                assert_eq!(operation, AUTO_COMPLETE);
                assert!(attempted >= 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(h.backend.count_calls(|c| *c == Call::FetchItems), 1);
        let note = h.notifier.last().unwrap();
        assert_eq!(note.tone, Tone::Failure);
        assert_eq!(note.message, GENERIC_FAILURE);
        assert!(!h.bulk.is_auto_completing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_submission_rejected_while_busy() {
        let h = harness(
            FakeBackend::standard().with_update_delay(Duration::from_millis(100)),
            Arc::new(AutoConfirm),
        );

        let (first, second, other) = tokio::join!(
            h.bulk.save_progress(),
            h.bulk.save_progress(),
            h.bulk.auto_complete(),
        );

        assert_eq!(first.unwrap(), 1);
        assert!(matches!(
            second,
            Err(ClientError::AlreadyInProgress(SAVE_PROGRESS))
        ));
        // a different operation is not blocked
        assert_eq!(other.unwrap(), 2);
        assert!(!h.bulk.is_saving());
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_complete_skips_line_counted_meanwhile() {
        let h = harness(
            FakeBackend::standard().with_update_delay(Duration::from_millis(50)),
            Arc::new(AutoConfirm),
        );

        let (typed, filled) = tokio::join!(h.mutations.set_count("2", 1), h.bulk.auto_complete());

        assert!(typed.unwrap().is_applied());
        assert_eq!(filled.unwrap(), 1);
        let mut updates = h.backend.updates();
        updates.sort();
        assert_eq!(updates, vec![("2".to_string(), 1), ("3".to_string(), 6)]);
        assert_eq!(snapshot(&h).await.get("2").unwrap().counted_qty, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_progress_keeps_concurrent_increment() {
        let h = harness(
            FakeBackend::standard().with_update_delay(Duration::from_millis(50)),
            Arc::new(AutoConfirm),
        );

        let (scanned, saved) = tokio::join!(h.mutations.increment("1", 1), h.bulk.save_progress());

        assert_eq!(
            scanned.unwrap(),
            MutationOutcome::Applied {
                item_id: "1".into(),
                counted_qty: 4
            }
        );
        assert_eq!(saved.unwrap(), 1);
        assert_eq!(
            h.backend.updates(),
            vec![("1".to_string(), 4), ("1".to_string(), 4)]
        );
        let server = h.backend.items();
        assert_eq!(server.iter().find(|i| i.id == "1").unwrap().counted_qty, 4);
        assert_eq!(snapshot(&h).await.get("1").unwrap().counted_qty, 4);
    }
}
