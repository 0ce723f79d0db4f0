//! Shared fixtures for the feed integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Notify;

use lifelog_feed::error::StoreResult;
use lifelog_feed::{
    ExtraFields, FeedClient, FeedConfig, FeedItem, MemoryRecordStore, NewRecord, PageQuery,
    PinContext, PinnedRef, RecordKind, RecordStore, RecordingNotifier, Session, ViewHooks,
};

pub const OWNER: &str = "owner-1";

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
}

/// A record of `kind` occurring `minutes` after the base time
pub fn record(id: &str, kind: RecordKind, minutes: i64) -> FeedItem {
    let extra = match kind {
        RecordKind::Note => ExtraFields::Note {
            body: format!("body of {}", id),
            tags: vec![],
        },
        RecordKind::GymSession => ExtraFields::GymSession {
            exercises: vec![],
            duration_minutes: Some(60),
        },
        RecordKind::WeightEntry => ExtraFields::WeightEntry {
            weight_kg: 80.5,
            note: None,
        },
        RecordKind::TodoList => ExtraFields::TodoList { tasks: vec![] },
        RecordKind::Reminder => ExtraFields::Reminder {
            remind_at: base_time() + Duration::days(1),
            notify_before_minutes: None,
            delivered: false,
        },
        RecordKind::Activity => ExtraFields::Activity {
            activity_type: "walk".into(),
            duration_seconds: Some(1800),
            distance_meters: None,
            calories: None,
        },
    };
    FeedItem {
        id: id.to_string(),
        owner: OWNER.to_string(),
        source_id: format!("src-{}", id),
        title: format!("Title {}", id),
        occurred_at: base_time() + Duration::minutes(minutes),
        created_at: base_time(),
        updated_at: None,
        extra,
    }
}

pub fn note(id: &str, minutes: i64) -> FeedItem {
    record(id, RecordKind::Note, minutes)
}

/// `count` notes `item_1..=item_count`, newest last
pub fn notes(count: usize) -> Vec<FeedItem> {
    (1..=count)
        .map(|i| note(&format!("item_{}", i), i as i64))
        .collect()
}

pub fn pin_row(item: &FeedItem, context: &PinContext, minutes: i64) -> PinnedRef {
    PinnedRef {
        owner: item.owner.clone(),
        pinned_context: context.clone(),
        item_id: item.id.clone(),
        kind: item.kind(),
        pinned_at: base_time() + Duration::days(30) + Duration::minutes(minutes),
    }
}

pub fn new_note(title: &str) -> NewRecord {
    NewRecord::new(
        title,
        ExtraFields::Note {
            body: "written in a test".into(),
            tags: vec![],
        },
    )
}

/// Hooks that answer confirmations with a fixed value and record navigation
#[derive(Default)]
pub struct TestHooks {
    decline: AtomicBool,
    pub left: Mutex<Vec<RecordKind>>,
}

impl TestHooks {
    pub fn declining() -> Self {
        let hooks = Self::default();
        hooks.decline.store(true, Ordering::SeqCst);
        hooks
    }

    pub fn left_views(&self) -> Vec<RecordKind> {
        self.left.lock().unwrap().clone()
    }
}

#[async_trait]
impl ViewHooks for TestHooks {
    async fn confirm_delete(&self, _item_id: &str, _kind: RecordKind) -> bool {
        !self.decline.load(Ordering::SeqCst)
    }

    fn leave_creation_view(&self, kind: RecordKind) {
        self.left.lock().unwrap().push(kind);
    }
}

/// Wraps a memory store and parks `upsert_pin` calls until released
pub struct GatedStore {
    pub inner: Arc<MemoryRecordStore>,
    armed: AtomicBool,
    pub entered: Notify,
    release: Notify,
}

impl GatedStore {
    pub fn new(inner: Arc<MemoryRecordStore>) -> Self {
        Self {
            inner,
            armed: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Hold the next `upsert_pin` until [`GatedStore::open_gate`]
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn open_gate(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl RecordStore for GatedStore {
    async fn fetch_page(&self, query: &PageQuery) -> StoreResult<Vec<FeedItem>> {
        self.inner.fetch_page(query).await
    }

    async fn fetch_pinned(&self, owner: &str, context: &PinContext) -> StoreResult<Vec<FeedItem>> {
        self.inner.fetch_pinned(owner, context).await
    }

    async fn upsert_pin(
        &self,
        owner: &str,
        context: &PinContext,
        item_id: &str,
        kind: RecordKind,
    ) -> StoreResult<()> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.upsert_pin(owner, context, item_id, kind).await
    }

    async fn delete_pin(
        &self,
        owner: &str,
        context: &PinContext,
        item_id: &str,
        kind: RecordKind,
    ) -> StoreResult<()> {
        self.inner.delete_pin(owner, context, item_id, kind).await
    }

    async fn delete_record(&self, owner: &str, kind: RecordKind, id: &str) -> StoreResult<()> {
        self.inner.delete_record(owner, kind, id).await
    }

    async fn create_record(&self, owner: &str, record: NewRecord) -> StoreResult<FeedItem> {
        self.inner.create_record(owner, record).await
    }
}

/// Everything a test needs to drive and inspect one session
pub struct Harness {
    pub store: Arc<MemoryRecordStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub hooks: Arc<TestHooks>,
    pub client: FeedClient,
}

impl Harness {
    pub fn new(store: Arc<MemoryRecordStore>) -> Self {
        Self::with(store, Arc::new(TestHooks::default()), FeedConfig::default())
    }

    pub fn with(store: Arc<MemoryRecordStore>, hooks: Arc<TestHooks>, config: FeedConfig) -> Self {
        let notifier = Arc::new(RecordingNotifier::new());
        let client = FeedClient::with_collaborators(
            store.clone(),
            Session::for_owner(OWNER),
            config,
            notifier.clone(),
            hooks.clone(),
        );
        Self {
            store,
            notifier,
            hooks,
            client,
        }
    }
}

pub async fn seeded_store(records: Vec<FeedItem>, pins: Vec<PinnedRef>) -> Arc<MemoryRecordStore> {
    let store = Arc::new(MemoryRecordStore::new());
    store.seed_records(records).await;
    store.seed_pins(pins).await;
    store
}
