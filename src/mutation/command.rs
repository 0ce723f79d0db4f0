//! Optimistic cache commands
//!
//! Each command knows how to apply its change to the cache and how to take
//! just that change back out of a cache that may have moved on since.

use crate::cache::{CacheSnapshot, FeedCache, FeedEntry};
use crate::model::{FeedItem, PageEntry, PinAction, PinContext};

pub trait CacheCommand: Send + Sync {
    fn label(&self) -> &'static str;

    /// The item this command changes
    fn item_id(&self) -> &str;

    fn apply(&self, cache: &mut FeedCache);

    /// Restore this command's item to its snapshot placement
    fn undo(&self, cache: &mut FeedCache, snapshot: &CacheSnapshot) {
        cache.restore_item(self.item_id(), snapshot);
    }
}

/// Drop an item from every cached page
#[derive(Debug, Clone)]
pub struct RemoveItem {
    item_id: String,
}

impl RemoveItem {
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
        }
    }
}

impl CacheCommand for RemoveItem {
    fn label(&self) -> &'static str {
        "delete"
    }

    fn item_id(&self) -> &str {
        &self.item_id
    }

    fn apply(&self, cache: &mut FeedCache) {
        for (_, feed) in cache.feeds_mut() {
            feed.remove_item(&self.item_id);
        }
    }
}

/// Move an item into or out of the pinned group of every feed scoped to
/// the pin's context.
#[derive(Debug, Clone)]
pub struct SetPinState {
    owner: String,
    context: PinContext,
    item: FeedItem,
    action: PinAction,
}

impl SetPinState {
    pub fn new(owner: impl Into<String>, context: PinContext, item: FeedItem, action: PinAction) -> Self {
        Self {
            owner: owner.into(),
            context,
            item,
            action,
        }
    }

    pub fn action(&self) -> PinAction {
        self.action
    }

    pub fn item(&self) -> &FeedItem {
        &self.item
    }
}

impl CacheCommand for SetPinState {
    fn label(&self) -> &'static str {
        match self.action {
            PinAction::Pin => "pin",
            PinAction::Unpin => "unpin",
        }
    }

    fn item_id(&self) -> &str {
        &self.item.id
    }

    fn apply(&self, cache: &mut FeedCache) {
        for (key, feed) in cache.feeds_mut() {
            if key.owner != self.owner || key.pinned_context != self.context {
                continue;
            }
            feed.remove_item(&self.item.id);
            match self.action {
                PinAction::Pin => {
                    if let Some(first) = feed.pages.first_mut() {
                        first.items.insert(0, PageEntry::pinned(self.item.clone()));
                    }
                }
                PinAction::Unpin => {
                    if key.admits(self.item.kind()) {
                        insert_regular(feed, &self.item);
                    }
                }
            }
        }
    }
}

/// Place an item in the regular slice by `occurred_at`. An item older than
/// everything loaded is only placed when no further pages exist; otherwise
/// it will arrive with a later page.
fn insert_regular(feed: &mut FeedEntry, item: &FeedItem) {
    let is_final = feed.last_page_is_final();
    for page in feed.pages.iter_mut() {
        let slot = page
            .items
            .iter()
            .position(|e| !e.is_pinned() && e.item.occurred_at < item.occurred_at);
        if let Some(at) = slot {
            page.items.insert(at, PageEntry::regular(item.clone()));
            return;
        }
    }
    if is_final {
        if let Some(last) = feed.pages.last_mut() {
            last.items.push(PageEntry::regular(item.clone()));
        }
    }
}
