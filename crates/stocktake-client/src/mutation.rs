//! # Count Mutation Controller
//!
//! Writes a single line's counted quantity and brings the ledger back in
//! line with the backend.
//!
//! ## Write Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      One Count Write                                    │
//! │                                                                         │
//! │  intent ──► take item sequence ──► wait for item lane                   │
//! │                                          │                              │
//! │                       overtaken (absolute count)? ──► Superseded        │
//! │                                          │                              │
//! │                                          ▼                              │
//! │               PATCH counted_quantity ──► settle ──► GET items           │
//! │                      │                                │                 │
//! │                      │ failure                        ▼                 │
//! │                      └──────────────► GET items   Ledger::replace       │
//! │                                       + failure       + success         │
//! │                                       notification    notification      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Per-Item Ordering
//! Each line has its own lane: a monotonically increasing sequence number
//! plus an async mutex that serializes writes for that line. An absolute
//! count that has been overtaken by a newer absolute count while waiting is
//! skipped, so the most recent typed edit wins. Every other intent is
//! resolved against the ledger once it holds the lane, and the ledger is
//! reloaded before the lane is released. Two quick scans of the same product
//! both count, and a scan queued behind a typed count adds to that count.
//!
//! Bulk writes go through the same lanes (see [`HeldLanes`]), so a bulk
//! write never overwrites a scan or edit that landed after its snapshot.
//!
//! This controller does not check the session status. Callers that must
//! refuse edits on a completed session go through the session controller.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, warn};

use stocktake_core::count::clamp_count;
use stocktake_core::Ledger;

use crate::backend::StockTakeBackend;
use crate::error::{ClientError, ClientResult};
use crate::notify::{Notification, Notifier};

// =============================================================================
// Intents & Outcomes
// =============================================================================

/// What the operator asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountIntent {
    /// Set the count to this absolute value.
    Set(i64),
    /// Add to whatever the ledger holds when the write runs.
    Increment(i64),
    /// Re-send the ledger's count; skipped if the line is no longer counted.
    Resubmit,
    /// Set the expected quantity; skipped if the line has been counted since.
    FillExpected,
}

/// Result of a count write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Persisted and reloaded.
    Applied { item_id: String, counted_qty: i64 },
    /// Nothing was sent: a newer count replaced this one, or the line no
    /// longer needs the write.
    Superseded { item_id: String },
}

impl MutationOutcome {
    pub fn item_id(&self) -> &str {
        match self {
            MutationOutcome::Applied { item_id, .. } | MutationOutcome::Superseded { item_id } => {
                item_id
            }
        }
    }

    /// The persisted count, if the write was sent.
    pub fn counted_qty(&self) -> Option<i64> {
        match self {
            MutationOutcome::Applied { counted_qty, .. } => Some(*counted_qty),
            MutationOutcome::Superseded { .. } => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied { .. })
    }
}

/// Ordering state of one line.
#[derive(Default)]
struct ItemLane {
    issued: AtomicU64,
    latest_set: AtomicU64,
    turn: Arc<AsyncMutex<()>>,
}

impl ItemLane {
    fn enqueue(&self, intent: CountIntent) -> u64 {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        if let CountIntent::Set(_) = intent {
            self.latest_set.fetch_max(seq, Ordering::SeqCst);
        }
        seq
    }

    async fn take_turn(&self) -> OwnedMutexGuard<()> {
        self.turn.clone().lock_owned().await
    }

    /// An absolute count only loses to a newer absolute count.
    fn overtaken(&self, seq: u64, intent: CountIntent) -> bool {
        matches!(intent, CountIntent::Set(_)) && self.latest_set.load(Ordering::SeqCst) != seq
    }
}

/// Lane turns a bulk operation keeps until its single trailing reload.
///
/// Until the reload lands the ledger still shows the pre-write counts, so
/// nothing else may resolve against those lines.
#[derive(Default)]
pub(crate) struct HeldLanes(Mutex<Vec<OwnedMutexGuard<()>>>);

impl HeldLanes {
    fn keep(&self, turn: OwnedMutexGuard<()>) {
        self.0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(turn);
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Persists single-line count changes with read-after-write reloads.
pub struct CountMutationController {
    session_id: String,
    backend: Arc<dyn StockTakeBackend>,
    notifier: Arc<dyn Notifier>,
    ledger: Arc<RwLock<Ledger>>,
    settle_delay: Duration,
    lanes: Mutex<HashMap<String, Arc<ItemLane>>>,
    bulk_turn: AsyncMutex<()>,
}

impl CountMutationController {
    pub fn new(
        session_id: impl Into<String>,
        backend: Arc<dyn StockTakeBackend>,
        notifier: Arc<dyn Notifier>,
        ledger: Arc<RwLock<Ledger>>,
        settle_delay: Duration,
    ) -> Self {
        CountMutationController {
            session_id: session_id.into(),
            backend,
            notifier,
            ledger,
            settle_delay,
            lanes: Mutex::new(HashMap::new()),
            bulk_turn: AsyncMutex::new(()),
        }
    }

    /// The ledger this controller keeps in sync.
    pub fn ledger(&self) -> &Arc<RwLock<Ledger>> {
        &self.ledger
    }

    /// Sets a line's count. Negative values are stored as 0.
    pub async fn set_count(&self, item_id: &str, new_count: i64) -> ClientResult<MutationOutcome> {
        self.submit(item_id, CountIntent::Set(clamp_count(new_count)))
            .await
    }

    /// Adds `by` to a line's current count. Increments are never skipped.
    pub async fn increment(&self, item_id: &str, by: i64) -> ClientResult<MutationOutcome> {
        self.submit(item_id, CountIntent::Increment(by)).await
    }

    /// Runs one intent through the line's lane.
    pub async fn submit(&self, item_id: &str, intent: CountIntent) -> ClientResult<MutationOutcome> {
        let lane = self.lane(item_id);
        let seq = lane.enqueue(intent);
        let _turn = lane.take_turn().await;

        let target = match self.resolve(&lane, seq, item_id, intent).await {
            Ok(Some(target)) => target,
            Ok(None) => {
                return Ok(MutationOutcome::Superseded {
                    item_id: item_id.to_string(),
                })
            }
            Err(e) => {
                self.notify_failure(&e);
                return Err(e);
            }
        };

        debug!(session_id = %self.session_id, item_id, counted = target, "Persisting count");

        match self
            .backend
            .update_item_count(&self.session_id, item_id, target)
            .await
        {
            Ok(()) => {
                if !self.settle_delay.is_zero() {
                    tokio::time::sleep(self.settle_delay).await;
                }
                if let Err(e) = self.reload().await {
                    self.notify_failure(&e);
                    return Err(e);
                }

                let name = self.product_name(item_id).await;
                info!(item_id, counted = target, "Count updated");
                self.notifier.notify(Notification::success(
                    "Count updated",
                    format!("{}: {}", name, target),
                ));

                Ok(MutationOutcome::Applied {
                    item_id: item_id.to_string(),
                    counted_qty: target,
                })
            }
            Err(e) => {
                warn!(item_id, error = %e, "Count update failed");
                if let Err(reload_err) = self.reload().await {
                    warn!(error = %reload_err, "Reload after failed update also failed");
                }
                self.notify_failure(&e);
                Err(e)
            }
        }
    }

    /// Sends one bulk write through the line's lane without reloading.
    ///
    /// The lane stays taken in `held` until the caller has reloaded, and no
    /// notification is sent; the bulk operation reports once for the batch.
    pub(crate) async fn write_held(
        &self,
        item_id: &str,
        intent: CountIntent,
        held: &HeldLanes,
    ) -> ClientResult<MutationOutcome> {
        let lane = self.lane(item_id);
        let seq = lane.enqueue(intent);
        let turn = lane.take_turn().await;

        let Some(target) = self.resolve(&lane, seq, item_id, intent).await? else {
            return Ok(MutationOutcome::Superseded {
                item_id: item_id.to_string(),
            });
        };

        held.keep(turn);
        self.backend
            .update_item_count(&self.session_id, item_id, target)
            .await?;
        Ok(MutationOutcome::Applied {
            item_id: item_id.to_string(),
            counted_qty: target,
        })
    }

    /// Serializes bulk operations against each other.
    ///
    /// Two batches holding lanes while waiting on each other's would never
    /// finish.
    pub(crate) async fn bulk_turn(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.bulk_turn.lock().await
    }

    /// Fetches every line again and swaps the ledger wholesale.
    pub async fn reload(&self) -> ClientResult<usize> {
        refresh_ledger(self.backend.as_ref(), &self.session_id, &self.ledger).await
    }

    /// Turns an intent into the count to send, or `None` when it is skipped.
    /// Must be called while holding the line's turn.
    async fn resolve(
        &self,
        lane: &ItemLane,
        seq: u64,
        item_id: &str,
        intent: CountIntent,
    ) -> ClientResult<Option<i64>> {
        if lane.overtaken(seq, intent) {
            debug!(item_id, seq, "Count intent overtaken, skipping");
            return Ok(None);
        }
        if let CountIntent::Set(n) = intent {
            return Ok(Some(n));
        }

        let ledger = self.ledger.read().await;
        let item = ledger.require(item_id)?;
        let target = match intent {
            CountIntent::Set(n) => Some(n),
            CountIntent::Increment(by) => Some(clamp_count(item.counted_qty.saturating_add(by))),
            CountIntent::Resubmit => item.is_counted().then_some(item.counted_qty),
            CountIntent::FillExpected => (!item.is_counted()).then_some(item.expected_qty),
        };
        if target.is_none() {
            debug!(item_id, ?intent, "Line changed since the snapshot, skipping");
        }
        Ok(target)
    }

    fn lane(&self, item_id: &str) -> Arc<ItemLane> {
        let mut lanes = self.lanes.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        lanes.entry(item_id.to_string()).or_default().clone()
    }

    async fn product_name(&self, item_id: &str) -> String {
        self.ledger
            .read()
            .await
            .get(item_id)
            .map(|i| i.product_name.clone())
            .unwrap_or_else(|| item_id.to_string())
    }

    fn notify_failure(&self, err: &ClientError) {
        self.notifier.notify(Notification::failure(
            "Count not saved",
            err.user_message(),
        ));
    }
}

/// Replaces the ledger with the backend's current line list.
pub(crate) async fn refresh_ledger(
    backend: &dyn StockTakeBackend,
    session_id: &str,
    ledger: &RwLock<Ledger>,
) -> ClientResult<usize> {
    let items = backend.fetch_items(session_id).await?;
    let count = items.len();
    ledger.write().await.replace(items);
    debug!(session_id, items = count, "Ledger reloaded");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeBackend, RecordingNotifier, SESSION_ID};
    use crate::notify::Tone;

    struct Harness {
        backend: Arc<FakeBackend>,
        notifier: Arc<RecordingNotifier>,
        controller: CountMutationController,
    }

    async fn harness(backend: FakeBackend, settle: Duration) -> Harness {
        let backend = Arc::new(backend);
        let notifier = Arc::new(RecordingNotifier::default());
        let ledger = Arc::new(RwLock::new(Ledger::new(backend.items())));
        let controller = CountMutationController::new(
            SESSION_ID,
            backend.clone(),
            notifier.clone(),
            ledger,
            settle,
        );
        Harness {
            backend,
            notifier,
            controller,
        }
    }

    async fn counted(h: &Harness, item_id: &str) -> i64 {
        h.controller.ledger().read().await.get(item_id).unwrap().counted_qty
    }

    #[tokio::test]
    async fn test_set_count_persists_then_reloads() {
        let h = harness(FakeBackend::standard(), Duration::ZERO).await;

        let outcome = h.controller.set_count("2", 7).await.unwrap();

        assert_eq!(
            outcome,
            MutationOutcome::Applied {
                item_id: "2".into(),
                counted_qty: 7
            }
        );
        assert_eq!(
            h.backend.calls(),
            vec![
                Call::Update {
                    item_id: "2".into(),
                    counted_qty: 7
                },
                Call::FetchItems
            ]
        );
        assert_eq!(counted(&h, "2").await, 7);
        let note = h.notifier.last().unwrap();
        assert_eq!(note.tone, Tone::Success);
        assert_eq!(note.message, "Water: 7");
    }

    #[tokio::test]
    async fn test_negative_count_is_clamped() {
        let h = harness(FakeBackend::standard(), Duration::ZERO).await;
        h.controller.set_count("1", -4).await.unwrap();
        assert_eq!(h.backend.updates(), vec![("1".to_string(), 0)]);
    }

    #[tokio::test]
    async fn test_failure_still_reloads_and_reports_server_detail() {
        let h = harness(
            FakeBackend::standard().fail_update("1", "Counted quantity exceeds limit"),
            Duration::ZERO,
        )
        .await;

        let err = h.controller.set_count("1", 9).await.unwrap_err();

        assert!(matches!(err, ClientError::Status { status: 422, .. }));
        assert_eq!(h.backend.count_calls(|c| *c == Call::FetchItems), 1);
        assert_eq!(counted(&h, "1").await, 3);
        let note = h.notifier.last().unwrap();
        assert_eq!(note.tone, Tone::Failure);
        assert_eq!(note.message, "Counted quantity exceeds limit");
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_delay_precedes_reload() {
        let h = harness(FakeBackend::standard(), Duration::from_millis(300)).await;
        let started = tokio::time::Instant::now();

        h.controller.set_count("3", 2).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(300));
        assert_eq!(counted(&h, "3").await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_absolute_count_wins() {
        let h = harness(
            FakeBackend::standard().with_update_delay(Duration::from_millis(50)),
            Duration::from_millis(300),
        )
        .await;

        let (a, b, c) = tokio::join!(
            h.controller.set_count("2", 1),
            h.controller.set_count("2", 2),
            h.controller.set_count("2", 3),
        );

        assert!(a.unwrap().is_applied());
        assert_eq!(
            b.unwrap(),
            MutationOutcome::Superseded {
                item_id: "2".into()
            }
        );
        assert!(c.unwrap().is_applied());
        assert_eq!(
            h.backend.updates(),
            vec![("2".to_string(), 1), ("2".to_string(), 3)]
        );
        assert_eq!(counted(&h, "2").await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_increments_both_count() {
        let h = harness(FakeBackend::standard(), Duration::from_millis(300)).await;

        let (a, b) = tokio::join!(
            h.controller.increment("1", 1),
            h.controller.increment("1", 1),
        );

        assert!(a.unwrap().is_applied());
        assert!(b.unwrap().is_applied());
        assert_eq!(
            h.backend.updates(),
            vec![("1".to_string(), 4), ("1".to_string(), 5)]
        );
        assert_eq!(counted(&h, "1").await, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_increment_queued_behind_typed_count_adds_to_it() {
        let h = harness(
            FakeBackend::standard().with_update_delay(Duration::from_millis(50)),
            Duration::from_millis(300),
        )
        .await;

        let (a, typed, b) = tokio::join!(
            h.controller.increment("1", 1),
            h.controller.set_count("1", 10),
            h.controller.increment("1", 1),
        );

        assert_eq!(a.unwrap().counted_qty(), Some(4));
        assert_eq!(typed.unwrap().counted_qty(), Some(10));
        assert_eq!(b.unwrap().counted_qty(), Some(11));
        assert_eq!(
            h.backend.updates(),
            vec![
                ("1".to_string(), 4),
                ("1".to_string(), 10),
                ("1".to_string(), 11)
            ]
        );
        assert_eq!(counted(&h, "1").await, 11);
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_a_newer_typed_count_skips_a_typed_count() {
        let h = harness(
            FakeBackend::standard().with_update_delay(Duration::from_millis(50)),
            Duration::ZERO,
        )
        .await;

        let (a, first, b, second) = tokio::join!(
            h.controller.increment("2", 1),
            h.controller.set_count("2", 5),
            h.controller.increment("2", 1),
            h.controller.set_count("2", 8),
        );

        assert!(a.unwrap().is_applied());
        assert_eq!(
            first.unwrap(),
            MutationOutcome::Superseded {
                item_id: "2".into()
            }
        );
        assert_eq!(b.unwrap().counted_qty(), Some(2));
        assert_eq!(second.unwrap().counted_qty(), Some(8));
        assert_eq!(counted(&h, "2").await, 8);
    }

    #[tokio::test]
    async fn test_resubmit_and_fill_follow_the_ledger() {
        let h = harness(FakeBackend::standard(), Duration::ZERO).await;

        let resent = h.controller.submit("1", CountIntent::Resubmit).await.unwrap();
        let skipped = h.controller.submit("2", CountIntent::Resubmit).await.unwrap();
        let filled = h.controller.submit("3", CountIntent::FillExpected).await.unwrap();
        let kept = h.controller.submit("1", CountIntent::FillExpected).await.unwrap();

        assert_eq!(resent.counted_qty(), Some(3));
        assert!(!skipped.is_applied());
        assert_eq!(filled.counted_qty(), Some(6));
        assert!(!kept.is_applied());
        assert_eq!(
            h.backend.updates(),
            vec![("1".to_string(), 3), ("3".to_string(), 6)]
        );
    }

    #[tokio::test]
    async fn test_increment_unknown_line_sends_nothing() {
        let h = harness(FakeBackend::standard(), Duration::ZERO).await;
        let err = h.controller.increment("404", 1).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Core(stocktake_core::CoreError::ItemNotFound(_))
        ));
        assert!(h.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_writes_to_different_lines_are_independent() {
        let h = harness(FakeBackend::standard(), Duration::ZERO).await;
        let (a, b) = tokio::join!(h.controller.set_count("2", 4), h.controller.set_count("3", 6));
        assert!(a.unwrap().is_applied());
        assert!(b.unwrap().is_applied());
        assert_eq!(counted(&h, "2").await, 4);
        assert_eq!(counted(&h, "3").await, 6);
    }
}
