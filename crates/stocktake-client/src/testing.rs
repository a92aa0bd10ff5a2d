//! In-memory backend and recording capabilities for controller tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use stocktake_core::{
    LookupResult, ProductHit, SessionStatus, StockTakeItem, StockTakeSession, VariationHit,
};

use crate::backend::{ProductLookup, StockTakeBackend};
use crate::confirm::{ConfirmPrompt, Confirmer};
use crate::error::{ClientError, ClientResult};
use crate::notify::{Notification, Notifier, Tone};

pub const SESSION_ID: &str = "st-1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FetchSession,
    FetchItems,
    Update { item_id: String, counted_qty: i64 },
    Complete,
    Delete,
    Lookup(String),
}

#[derive(Default)]
struct State {
    session: Option<StockTakeSession>,
    items: Vec<StockTakeItem>,
    calls: Vec<Call>,
    lookups: HashMap<String, LookupResult>,
    failing_updates: HashMap<String, String>,
    complete_error: Option<String>,
    lookup_error: Option<String>,
}

/// Backend that keeps the session in memory and records every call.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<State>,
    update_delay: Duration,
}

impl FakeBackend {
    pub fn new(session: StockTakeSession, items: Vec<StockTakeItem>) -> Self {
        FakeBackend {
            state: Mutex::new(State {
                session: Some(session),
                items,
                ..Default::default()
            }),
            update_delay: Duration::ZERO,
        }
    }

    /// Standard fixture: Cola (P1, barcode 123456) counted 3 of 10,
    /// Water (P2) and Chips (P3) not counted yet.
    pub fn standard() -> Self {
        Self::new(
            session(SessionStatus::Running),
            vec![
                item("1", "P1", "Cola", Some("123456"), 10, 3),
                item("2", "P2", "Water", Some("222"), 4, 0),
                item("3", "P3", "Chips", None, 6, 0),
            ],
        )
    }

    /// Makes every count write wait before answering.
    pub fn with_update_delay(mut self, delay: Duration) -> Self {
        self.update_delay = delay;
        self
    }

    pub fn with_lookup(self, barcode: &str, result: LookupResult) -> Self {
        self.lock().lookups.insert(barcode.to_string(), result);
        self
    }

    pub fn fail_update(self, item_id: &str, message: &str) -> Self {
        self.lock()
            .failing_updates
            .insert(item_id.to_string(), message.to_string());
        self
    }

    pub fn fail_complete(self, message: &str) -> Self {
        self.lock().complete_error = Some(message.to_string());
        self
    }

    pub fn fail_lookup(self, message: &str) -> Self {
        self.lock().lookup_error = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// `(item_id, counted_qty)` of every count write, in arrival order.
    pub fn updates(&self) -> Vec<(String, i64)> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Update {
                    item_id,
                    counted_qty,
                } => Some((item_id.clone(), *counted_qty)),
                _ => None,
            })
            .collect()
    }

    pub fn count_calls(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn items(&self) -> Vec<StockTakeItem> {
        self.lock().items.clone()
    }

    pub fn status(&self) -> Option<SessionStatus> {
        self.lock().session.as_ref().map(|s| s.status)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

fn rejected(message: &str) -> ClientError {
    ClientError::Status {
        status: 422,
        message: message.to_string(),
    }
}

fn not_found() -> ClientError {
    ClientError::Status {
        status: 404,
        message: "Stock take not found".to_string(),
    }
}

#[async_trait]
impl StockTakeBackend for FakeBackend {
    async fn fetch_session(&self, _session_id: &str) -> ClientResult<StockTakeSession> {
        let mut state = self.lock();
        state.calls.push(Call::FetchSession);
        state.session.clone().ok_or_else(not_found)
    }

    async fn fetch_items(&self, _session_id: &str) -> ClientResult<Vec<StockTakeItem>> {
        let mut state = self.lock();
        state.calls.push(Call::FetchItems);
        if state.session.is_none() {
            return Err(not_found());
        }
        Ok(state.items.clone())
    }

    async fn update_item_count(
        &self,
        _session_id: &str,
        item_id: &str,
        counted_qty: i64,
    ) -> ClientResult<()> {
        {
            let mut state = self.lock();
            state.calls.push(Call::Update {
                item_id: item_id.to_string(),
                counted_qty,
            });
        }

        if !self.update_delay.is_zero() {
            tokio::time::sleep(self.update_delay).await;
        }

        let mut state = self.lock();
        if let Some(message) = state.failing_updates.get(item_id) {
            return Err(rejected(message));
        }
        match state.items.iter_mut().find(|i| i.id == item_id) {
            Some(item) => {
                item.counted_qty = counted_qty;
                Ok(())
            }
            None => Err(rejected("Item not found")),
        }
    }

    async fn complete_session(&self, _session_id: &str) -> ClientResult<()> {
        let mut state = self.lock();
        state.calls.push(Call::Complete);
        if let Some(message) = state.complete_error.clone() {
            return Err(rejected(&message));
        }
        match state.session.as_mut() {
            Some(session) => {
                session.status = SessionStatus::Completed;
                Ok(())
            }
            None => Err(not_found()),
        }
    }

    async fn delete_session(&self, _session_id: &str) -> ClientResult<()> {
        let mut state = self.lock();
        state.calls.push(Call::Delete);
        match state.session.take() {
            Some(_) => {
                state.items.clear();
                Ok(())
            }
            None => Err(not_found()),
        }
    }
}

#[async_trait]
impl ProductLookup for FakeBackend {
    async fn lookup(&self, barcode: &str) -> ClientResult<LookupResult> {
        let mut state = self.lock();
        state.calls.push(Call::Lookup(barcode.to_string()));
        if let Some(message) = state.lookup_error.clone() {
            return Err(ClientError::ConnectionFailed(message));
        }
        Ok(state.lookups.get(barcode).cloned().unwrap_or_default())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn session(status: SessionStatus) -> StockTakeSession {
    StockTakeSession {
        id: SESSION_ID.to_string(),
        outlet_id: "outlet-1".to_string(),
        operating_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
        description: Some("October count".to_string()),
        status,
    }
}

pub fn item(
    id: &str,
    product_id: &str,
    name: &str,
    barcode: Option<&str>,
    expected: i64,
    counted: i64,
) -> StockTakeItem {
    StockTakeItem {
        id: id.to_string(),
        product_id: product_id.to_string(),
        product_name: name.to_string(),
        barcode: barcode.map(str::to_string),
        expected_qty: expected,
        counted_qty: counted,
    }
}

pub fn product_hit(id: &str, barcode: &str) -> LookupResult {
    LookupResult {
        products: vec![ProductHit {
            id: id.to_string(),
            name: None,
            barcode: Some(barcode.to_string()),
        }],
        variations: Vec::new(),
    }
}

pub fn variation_hit(variation_id: &str, product_id: &str, barcode: &str) -> LookupResult {
    LookupResult {
        products: Vec::new(),
        variations: vec![VariationHit {
            id: variation_id.to_string(),
            product_id: product_id.to_string(),
            barcode: Some(barcode.to_string()),
        }],
    }
}

// =============================================================================
// Recording Capabilities
// =============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn all(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn tones(&self) -> Vec<Tone> {
        self.all().iter().map(|n| n.tone).collect()
    }

    pub fn last(&self) -> Option<Notification> {
        self.all().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

/// Answers with a fixed value and remembers what it was asked.
pub struct ScriptedConfirmer {
    answer: bool,
    asked: Mutex<Vec<ConfirmPrompt>>,
}

impl ScriptedConfirmer {
    pub fn new(answer: bool) -> Self {
        ScriptedConfirmer {
            answer,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> usize {
        self.asked.lock().unwrap().len()
    }
}

#[async_trait]
impl Confirmer for ScriptedConfirmer {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        self.asked.lock().unwrap().push(prompt.clone());
        self.answer
    }
}
