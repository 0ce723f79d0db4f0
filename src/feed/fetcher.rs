//! Feed fetcher
//!
//! Retrieves one page of the aggregated timeline. Page 0 runs the pinned
//! and regular requests concurrently and fails as a whole if either fails.

use std::sync::Arc;

use tracing::{debug, warn};

use super::merge::merge_page;
use crate::cache::FeedKey;
use crate::error::{FeedError, FetchLeg, Result};
use crate::model::{Page, PinContext, RecordKind};
use crate::store::{PageQuery, RecordStore};

/// Parameters of one page fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    pub owner: String,
    pub page_index: u32,
    pub limit: usize,
    pub kind: Option<RecordKind>,
    /// Defaults to the global context
    pub pinned_context: Option<PinContext>,
}

impl FeedRequest {
    pub fn new(owner: impl Into<String>, page_index: u32, limit: usize) -> Self {
        Self {
            owner: owner.into(),
            page_index,
            limit,
            kind: None,
            pinned_context: None,
        }
    }

    /// Request for a page of a cached feed
    pub fn for_key(key: &FeedKey, page_index: u32, limit: usize) -> Self {
        Self {
            owner: key.owner.clone(),
            page_index,
            limit,
            kind: key.kind,
            pinned_context: Some(key.pinned_context.clone()),
        }
    }

    pub fn with_kind(mut self, kind: RecordKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_context(mut self, context: PinContext) -> Self {
        self.pinned_context = Some(context);
        self
    }

    /// Regular-slice query, or `InvalidRequest` when the page offset or the
    /// following cursor would overflow
    fn regular_query(&self) -> Result<PageQuery> {
        let offset = (self.page_index as usize)
            .checked_mul(self.limit)
            .filter(|_| self.page_index.checked_add(1).is_some())
            .ok_or_else(|| {
                FeedError::InvalidRequest(format!(
                    "page {} of size {} is out of range",
                    self.page_index, self.limit
                ))
            })?;
        Ok(PageQuery::new(self.owner.clone(), offset, self.limit).with_kind(self.kind))
    }
}

/// Fetches and merges timeline pages from a record store
#[derive(Clone)]
pub struct FeedFetcher {
    store: Arc<dyn RecordStore>,
}

impl FeedFetcher {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn fetch_page(&self, request: &FeedRequest) -> Result<Page> {
        if request.limit == 0 {
            return Err(FeedError::InvalidRequest("page limit must be at least 1".into()));
        }

        let query = request.regular_query()?;

        let fetched = if request.page_index == 0 {
            let context = request.pinned_context.clone().unwrap_or_default();
            let pinned = async {
                self.store
                    .fetch_pinned(&request.owner, &context)
                    .await
                    .map_err(FeedError::fetch(FetchLeg::Pinned))
            };
            let regular = async {
                self.store
                    .fetch_page(&query)
                    .await
                    .map_err(FeedError::fetch(FetchLeg::Regular))
            };
            tokio::try_join!(pinned, regular)
        } else {
            self.store
                .fetch_page(&query)
                .await
                .map(|regular| (Vec::new(), regular))
                .map_err(FeedError::fetch(FetchLeg::Regular))
        };
        let (pinned, regular) = fetched.map_err(|e| {
            warn!(owner = %request.owner, page = request.page_index, error = %e, "Feed page fetch failed");
            e
        })?;

        debug!(
            owner = %request.owner,
            page = request.page_index,
            pinned = pinned.len(),
            regular = regular.len(),
            "Fetched feed page"
        );

        Ok(merge_page(pinned, regular, request.page_index, request.limit))
    }
}
