//! In-memory record store
//!
//! Holds records and pin rows in process memory with the same ordering,
//! idempotence and pin-capacity rules a real backend applies. Used by the
//! `feedctl` simulator and by tests; failures can be injected per operation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use super::{NewRecord, PageQuery, RecordStore};
use crate::error::{StoreError, StoreResult};
use crate::model::{FeedItem, PinContext, PinnedRef, RecordKind, DEFAULT_PIN_CAPACITY};

/// Store operations, for fault injection and call accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    FetchPage,
    FetchPinned,
    UpsertPin,
    DeletePin,
    DeleteRecord,
    CreateRecord,
}

#[derive(Default)]
struct MemoryState {
    records: HashMap<String, FeedItem>,
    /// Insertion order, oldest first
    pins: Vec<PinnedRef>,
    pending_failures: HashMap<StoreOp, usize>,
    calls: HashMap<StoreOp, usize>,
}

impl MemoryState {
    fn enter(&mut self, op: StoreOp) -> StoreResult<()> {
        *self.calls.entry(op).or_default() += 1;
        match self.pending_failures.get_mut(&op) {
            Some(n) if *n > 0 => {
                *n -= 1;
                Err(StoreError::Unavailable(format!("injected {:?} failure", op)))
            }
            _ => Ok(()),
        }
    }

    fn pins_for<'a>(
        &'a self,
        owner: &'a str,
        context: &'a PinContext,
    ) -> impl DoubleEndedIterator<Item = &'a PinnedRef> + 'a {
        self.pins
            .iter()
            .filter(move |p| p.owner == owner && &p.pinned_context == context)
    }
}

/// Record store backed by process memory
pub struct MemoryRecordStore {
    pin_capacity: usize,
    state: Mutex<MemoryState>,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::with_pin_capacity(DEFAULT_PIN_CAPACITY)
    }

    /// Store enforcing a lower server-side pin limit. Values above
    /// `DEFAULT_PIN_CAPACITY` are clamped to it.
    pub fn with_pin_capacity(pin_capacity: usize) -> Self {
        Self {
            pin_capacity: pin_capacity.min(DEFAULT_PIN_CAPACITY),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Insert records as-is, replacing any with the same id
    pub async fn seed_records(&self, records: impl IntoIterator<Item = FeedItem>) {
        let mut state = self.state.lock().await;
        for record in records {
            state.records.insert(record.id.clone(), record);
        }
    }

    /// Insert pin rows as-is, bypassing the capacity check
    pub async fn seed_pins(&self, pins: impl IntoIterator<Item = PinnedRef>) {
        let mut state = self.state.lock().await;
        for pin in pins {
            let key = pin.key();
            state.pins.retain(|p| p.key() != key);
            state.pins.push(pin);
        }
    }

    /// Make the next `op` call fail with `StoreError::Unavailable`
    pub async fn fail_next(&self, op: StoreOp) {
        let mut state = self.state.lock().await;
        *state.pending_failures.entry(op).or_default() += 1;
    }

    /// Number of times `op` has been called
    pub async fn calls(&self, op: StoreOp) -> usize {
        let state = self.state.lock().await;
        state.calls.get(&op).copied().unwrap_or(0)
    }

    pub async fn record(&self, id: &str) -> Option<FeedItem> {
        let state = self.state.lock().await;
        state.records.get(id).cloned()
    }

    pub async fn record_count(&self) -> usize {
        self.state.lock().await.records.len()
    }

    /// Pin rows for (owner, context), newest first
    pub async fn pinned_refs(&self, owner: &str, context: &PinContext) -> Vec<PinnedRef> {
        let state = self.state.lock().await;
        let mut pins: Vec<PinnedRef> = state.pins_for(owner, context).rev().cloned().collect();
        pins.sort_by(|a, b| b.pinned_at.cmp(&a.pinned_at));
        pins
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn fetch_page(&self, query: &PageQuery) -> StoreResult<Vec<FeedItem>> {
        let mut state = self.state.lock().await;
        state.enter(StoreOp::FetchPage)?;

        let mut items: Vec<&FeedItem> = state
            .records
            .values()
            .filter(|r| r.owner == query.owner)
            .filter(|r| query.kind.map_or(true, |k| r.kind() == k))
            .collect();
        items.sort_by(|a, b| {
            b.occurred_at
                .cmp(&a.occurred_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(items
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn fetch_pinned(&self, owner: &str, context: &PinContext) -> StoreResult<Vec<FeedItem>> {
        let mut state = self.state.lock().await;
        state.enter(StoreOp::FetchPinned)?;

        let mut pins: Vec<&PinnedRef> = state.pins_for(owner, context).rev().collect();
        pins.sort_by(|a, b| b.pinned_at.cmp(&a.pinned_at));

        Ok(pins
            .into_iter()
            .filter_map(|p| state.records.get(&p.item_id).cloned())
            .collect())
    }

    async fn upsert_pin(
        &self,
        owner: &str,
        context: &PinContext,
        item_id: &str,
        kind: RecordKind,
    ) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.enter(StoreOp::UpsertPin)?;

        if state.pins_for(owner, context).any(|p| p.item_id == item_id) {
            return Ok(());
        }
        match state.records.get(item_id) {
            Some(r) if r.owner == owner => {}
            _ => return Err(StoreError::NotFound(item_id.to_string())),
        }
        let pinned = state.pins_for(owner, context).count();
        if pinned >= self.pin_capacity {
            return Err(StoreError::Rejected(format!(
                "pin limit {} reached for context {}",
                self.pin_capacity, context
            )));
        }

        state.pins.push(PinnedRef {
            owner: owner.to_string(),
            pinned_context: context.clone(),
            item_id: item_id.to_string(),
            kind,
            pinned_at: Utc::now(),
        });
        debug!(owner, context = %context, item_id, "Pin stored");
        Ok(())
    }

    async fn delete_pin(
        &self,
        owner: &str,
        context: &PinContext,
        item_id: &str,
        _kind: RecordKind,
    ) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.enter(StoreOp::DeletePin)?;

        state
            .pins
            .retain(|p| !(p.owner == owner && &p.pinned_context == context && p.item_id == item_id));
        Ok(())
    }

    async fn delete_record(&self, owner: &str, kind: RecordKind, id: &str) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.enter(StoreOp::DeleteRecord)?;

        match state.records.get(id) {
            Some(r) if r.owner == owner && r.kind() == kind => {}
            _ => return Err(StoreError::NotFound(id.to_string())),
        }
        state.records.remove(id);
        state.pins.retain(|p| p.item_id != id);
        debug!(owner, kind = %kind, id, "Record deleted");
        Ok(())
    }

    async fn create_record(&self, owner: &str, record: NewRecord) -> StoreResult<FeedItem> {
        let mut state = self.state.lock().await;
        state.enter(StoreOp::CreateRecord)?;

        let now = Utc::now();
        let item = FeedItem {
            id: uuid::Uuid::new_v4().to_string(),
            owner: owner.to_string(),
            source_id: uuid::Uuid::new_v4().to_string(),
            title: record.title,
            occurred_at: record.occurred_at.unwrap_or(now),
            created_at: now,
            updated_at: None,
            extra: record.extra,
        };
        state.records.insert(item.id.clone(), item.clone());
        Ok(item)
    }
}
