//! Record store contract
//!
//! The feed never owns records; it reads pages and pins through a
//! [`RecordStore`] and writes pins, deletions and creations back through it.
//! Timeouts and retries are the transport's business: a failed call is
//! reported once and never retried here.

mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::model::{ExtraFields, FeedItem, PinContext, RecordKind};

pub use memory::{MemoryRecordStore, StoreOp};

/// Regular-slice query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub owner: String,
    /// Restrict to one record kind
    pub kind: Option<RecordKind>,
    pub offset: usize,
    pub limit: usize,
}

impl PageQuery {
    pub fn new(owner: impl Into<String>, offset: usize, limit: usize) -> Self {
        Self {
            owner: owner.into(),
            kind: None,
            offset,
            limit,
        }
    }

    pub fn with_kind(mut self, kind: Option<RecordKind>) -> Self {
        self.kind = kind;
        self
    }
}

/// Payload for creating a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub title: String,
    /// Defaults to the creation time when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl NewRecord {
    pub fn new(title: impl Into<String>, extra: ExtraFields) -> Self {
        Self {
            title: title.into(),
            occurred_at: None,
            extra,
        }
    }

    pub fn occurred_at(mut self, at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(at);
        self
    }

    pub fn kind(&self) -> RecordKind {
        self.extra.kind()
    }
}

/// Backend giving typed access to every record kind on the timeline.
///
/// Implementations must return `fetch_page` results ordered by
/// `occurred_at` descending and `fetch_pinned` results ordered by
/// `pinned_at` descending. `upsert_pin` and `delete_pin` must be idempotent.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// One slice of the regular timeline
    async fn fetch_page(&self, query: &PageQuery) -> StoreResult<Vec<FeedItem>>;

    /// Full records for every pin in `context`
    async fn fetch_pinned(&self, owner: &str, context: &PinContext) -> StoreResult<Vec<FeedItem>>;

    async fn upsert_pin(
        &self,
        owner: &str,
        context: &PinContext,
        item_id: &str,
        kind: RecordKind,
    ) -> StoreResult<()>;

    async fn delete_pin(
        &self,
        owner: &str,
        context: &PinContext,
        item_id: &str,
        kind: RecordKind,
    ) -> StoreResult<()>;

    async fn delete_record(&self, owner: &str, kind: RecordKind, id: &str) -> StoreResult<()>;

    async fn create_record(&self, owner: &str, record: NewRecord) -> StoreResult<FeedItem>;
}
