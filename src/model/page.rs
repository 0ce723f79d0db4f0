//! Merged feed pages

use serde::{Deserialize, Serialize};

use super::item::{FeedContext, FeedItem};

/// An item together with the group it is rendered from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageEntry {
    pub item: FeedItem,
    pub feed_context: FeedContext,
}

impl PageEntry {
    pub fn pinned(item: FeedItem) -> Self {
        Self {
            item,
            feed_context: FeedContext::Pinned,
        }
    }

    pub fn regular(item: FeedItem) -> Self {
        Self {
            item,
            feed_context: FeedContext::Feed,
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.feed_context == FeedContext::Pinned
    }
}

/// One page of the aggregated timeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<PageEntry>,
    /// Index of the next page, `None` when the regular slice is exhausted
    pub next_cursor: Option<u32>,
}

impl Page {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|e| e.item.id.as_str())
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.ids().any(|id| id == item_id)
    }

    pub fn pinned_count(&self) -> usize {
        self.items.iter().filter(|e| e.is_pinned()).count()
    }
}
