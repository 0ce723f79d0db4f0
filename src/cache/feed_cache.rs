//! In-memory paginated feed cache
//!
//! One [`FeedCache`] per session. Entries are keyed by [`FeedKey`]; each
//! holds the pages fetched so far. Besides feeds the cache tracks staleness
//! of dependent views (per-kind summaries and lists) that live elsewhere but
//! must be refetched after a mutation.
//!
//! Every write bumps a generation counter, and every optimistic mutation
//! bumps the version of the item it touches. The mutation coordinator uses
//! both to decide how a failed mutation may be rolled back.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::model::{FeedItem, Page, PageEntry, PinContext, PinState, RecordKind};

/// Shared handle to a session's cache
pub type SharedCache = Arc<Mutex<FeedCache>>;

/// Identity of one cached timeline
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedKey {
    pub owner: String,
    /// Type filter on the regular slice
    pub kind: Option<RecordKind>,
    pub pinned_context: PinContext,
}

impl FeedKey {
    /// The owner's root timeline: every kind, global pins
    pub fn root(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            kind: None,
            pinned_context: PinContext::global(),
        }
    }

    /// A per-feature timeline, e.g. notes only with notes pins
    pub fn for_kind(owner: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            owner: owner.into(),
            kind: Some(kind),
            pinned_context: kind.pin_context(),
        }
    }

    pub fn with_context(mut self, context: PinContext) -> Self {
        self.pinned_context = context;
        self
    }

    /// Whether an item of `kind` can appear in this feed's regular slice
    pub fn admits(&self, kind: RecordKind) -> bool {
        self.kind.map_or(true, |k| k == kind)
    }
}

/// Anything a mutation can invalidate
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Feed(FeedKey),
    /// Aggregate view for one kind (e.g. weight trend, workout totals)
    Summary { owner: String, kind: RecordKind },
    /// Type-specific list screen
    List { owner: String, kind: RecordKind },
}

/// Pages fetched for one feed
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub pages: Vec<Page>,
    pub stale: bool,
    pub updated_at: DateTime<Utc>,
}

impl FeedEntry {
    fn new(first: Page) -> Self {
        Self {
            pages: vec![first],
            stale: false,
            updated_at: Utc::now(),
        }
    }

    /// Cursor for the next page to load
    pub fn next_cursor(&self) -> Option<u32> {
        self.pages.last().and_then(|p| p.next_cursor)
    }

    pub fn entries(&self) -> impl Iterator<Item = &PageEntry> {
        self.pages.iter().flat_map(|p| p.items.iter())
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.entries().any(|e| e.item.id == item_id)
    }

    /// Positions of `item_id` as (page index, position in page)
    fn positions(&self, item_id: &str) -> Vec<(usize, usize, PageEntry)> {
        let mut found = Vec::new();
        for (p, page) in self.pages.iter().enumerate() {
            for (i, entry) in page.items.iter().enumerate() {
                if entry.item.id == item_id {
                    found.push((p, i, entry.clone()));
                }
            }
        }
        found
    }

    pub(crate) fn remove_item(&mut self, item_id: &str) -> usize {
        let mut removed = 0;
        for page in &mut self.pages {
            let before = page.items.len();
            page.items.retain(|e| e.item.id != item_id);
            removed += before - page.items.len();
        }
        removed
    }

    pub(crate) fn last_page_is_final(&self) -> bool {
        self.pages.last().map_or(true, |p| p.next_cursor.is_none())
    }
}

/// Where an entry that sat at `index` of `old` belongs in `current`: right
/// after its old predecessor, else right before its old successor, else at
/// the same index clamped to the page.
fn reinsert_position(old: &[PageEntry], index: usize, current: &[PageEntry]) -> usize {
    let find = |id: &str| current.iter().position(|e| e.item.id == id);

    if index == 0 {
        return 0;
    }
    if let Some(at) = old.get(index - 1).and_then(|prev| find(&prev.item.id)) {
        return at + 1;
    }
    if let Some(at) = old.get(index + 1).and_then(|next| find(&next.item.id)) {
        return at;
    }
    index.min(current.len())
}

/// Feeds only; generation and versions are bookkeeping, not content
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheSnapshot {
    feeds: HashMap<FeedKey, FeedEntry>,
}

impl CacheSnapshot {
    pub fn feed(&self, key: &FeedKey) -> Option<&FeedEntry> {
        self.feeds.get(key)
    }
}

/// Paginated cache for every feed of a session
#[derive(Debug, Default)]
pub struct FeedCache {
    feeds: HashMap<FeedKey, FeedEntry>,
    stale: HashSet<CacheKey>,
    generation: u64,
    item_versions: HashMap<String, u64>,
}

impl FeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedCache {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn touch(&mut self) {
        self.generation += 1;
    }

    pub fn feed(&self, key: &FeedKey) -> Option<&FeedEntry> {
        self.feeds.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &FeedKey> {
        self.feeds.keys()
    }

    pub fn page_count(&self, key: &FeedKey) -> usize {
        self.feeds.get(key).map_or(0, |e| e.pages.len())
    }

    /// Store a fetched page. Page 0 on a missing or stale entry starts the
    /// entry over; otherwise the page at `index` is overwritten or appended.
    /// A page that would leave a gap, or a later page for a stale entry, is
    /// dropped.
    pub fn store_page(&mut self, key: &FeedKey, index: usize, page: Page) -> bool {
        let needs_reset = self.feeds.get(key).map_or(true, |e| e.stale);
        if index == 0 && needs_reset {
            self.feeds.insert(key.clone(), FeedEntry::new(page));
            self.stale.remove(&CacheKey::Feed(key.clone()));
            self.touch();
            return true;
        }

        let Some(entry) = self.feeds.get_mut(key) else {
            warn!(owner = %key.owner, index, "Dropping page for uncached feed");
            return false;
        };
        if entry.stale {
            warn!(owner = %key.owner, index, "Dropping page for stale feed");
            return false;
        }
        if index < entry.pages.len() {
            entry.pages[index] = page;
        } else if index == entry.pages.len() {
            entry.pages.push(page);
        } else {
            warn!(owner = %key.owner, index, loaded = entry.pages.len(), "Dropping out-of-order page");
            return false;
        }
        entry.updated_at = Utc::now();
        self.touch();
        true
    }

    /// Replace a feed with a single fresh page 0
    pub fn reset_feed(&mut self, key: &FeedKey, first: Page) {
        self.feeds.insert(key.clone(), FeedEntry::new(first));
        self.stale.remove(&CacheKey::Feed(key.clone()));
        self.touch();
    }

    /// Discard every page after page 0
    pub fn trim_to_first_page(&mut self, key: &FeedKey) -> usize {
        let Some(entry) = self.feeds.get_mut(key) else {
            return 0;
        };
        let dropped = entry.pages.len().saturating_sub(1);
        if dropped > 0 {
            entry.pages.truncate(1);
            self.touch();
            debug!(owner = %key.owner, dropped, "Trimmed feed to first page");
        }
        dropped
    }

    /// Mark a view for refetch. A cached feed carries the flag on its
    /// entry; anything else is remembered until it is fetched.
    pub fn invalidate(&mut self, key: CacheKey) {
        let on_entry = match &key {
            CacheKey::Feed(feed) => match self.feeds.get_mut(feed) {
                Some(entry) => {
                    entry.stale = true;
                    true
                }
                None => false,
            },
            CacheKey::Summary { .. } | CacheKey::List { .. } => false,
        };
        if !on_entry {
            self.stale.insert(key);
        }
        self.touch();
    }

    /// Mark every cached feed of `owner` stale
    pub fn invalidate_owner_feeds(&mut self, owner: &str) {
        let keys: Vec<FeedKey> = self
            .feeds
            .keys()
            .filter(|k| k.owner == owner)
            .cloned()
            .collect();
        for key in keys {
            self.invalidate(CacheKey::Feed(key));
        }
        // The root feed is invalidated even when not cached yet
        let root = FeedKey::root(owner);
        if !self.feeds.contains_key(&root) {
            self.stale.insert(CacheKey::Feed(root));
        }
    }

    pub fn is_stale(&self, key: &CacheKey) -> bool {
        match key {
            CacheKey::Feed(feed) => self
                .feeds
                .get(feed)
                .map_or(self.stale.contains(key), |e| e.stale),
            _ => self.stale.contains(key),
        }
    }

    /// Acknowledge a refetch of a non-feed view
    pub fn mark_fresh(&mut self, key: &CacheKey) {
        self.stale.remove(key);
    }

    /// First cached copy of an item among the owner's feeds
    pub fn find_item(&self, owner: &str, item_id: &str) -> Option<FeedItem> {
        self.feeds
            .iter()
            .filter(|(k, _)| k.owner == owner)
            .flat_map(|(_, e)| e.entries())
            .find(|e| e.item.id == item_id)
            .map(|e| e.item.clone())
    }

    /// Distinct pinned items the cache shows for (owner, context)
    pub fn pinned_count(&self, owner: &str, context: &PinContext) -> usize {
        let ids: HashSet<&str> = self
            .feeds
            .iter()
            .filter(|(k, _)| k.owner == owner && &k.pinned_context == context)
            .flat_map(|(_, e)| e.entries())
            .filter(|e| e.is_pinned())
            .map(|e| e.item.id.as_str())
            .collect();
        ids.len()
    }

    /// Pin state of an item as the cache currently shows it
    pub fn pin_state(&self, owner: &str, context: &PinContext, item_id: &str) -> PinState {
        let pinned = self
            .feeds
            .iter()
            .filter(|(k, _)| k.owner == owner && &k.pinned_context == context)
            .flat_map(|(_, e)| e.entries())
            .any(|e| e.is_pinned() && e.item.id == item_id);
        if pinned {
            PinState::Pinned
        } else {
            PinState::Unpinned
        }
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            feeds: self.feeds.clone(),
        }
    }

    /// Put every feed back exactly as captured
    pub fn restore(&mut self, snapshot: &CacheSnapshot) {
        self.feeds = snapshot.feeds.clone();
        self.touch();
    }

    /// Put one item back where the snapshot had it, leaving everything
    /// else as it is now.
    pub fn restore_item(&mut self, item_id: &str, snapshot: &CacheSnapshot) {
        for (key, entry) in self.feeds.iter_mut() {
            entry.remove_item(item_id);
            let Some(before) = snapshot.feeds.get(key) else {
                continue;
            };
            for (p, i, saved) in before.positions(item_id) {
                let (Some(page), Some(old)) = (entry.pages.get_mut(p), before.pages.get(p)) else {
                    continue;
                };
                let at = reinsert_position(&old.items, i, &page.items);
                page.items.insert(at, saved);
            }
        }
        self.touch();
    }

    pub(crate) fn feeds_mut(&mut self) -> impl Iterator<Item = (&FeedKey, &mut FeedEntry)> {
        self.generation += 1;
        self.feeds.iter_mut()
    }

    pub fn item_version(&self, item_id: &str) -> u64 {
        self.item_versions.get(item_id).copied().unwrap_or(0)
    }

    /// Drop bookkeeping for an item that no longer exists. A mutation still
    /// in flight for it will find its version gone and not roll back.
    pub(crate) fn forget_item(&mut self, item_id: &str) {
        self.item_versions.remove(item_id);
    }

    pub(crate) fn bump_item_version(&mut self, item_id: &str) -> u64 {
        let version = self.item_versions.entry(item_id.to_string()).or_insert(0);
        *version += 1;
        *version
    }

    /// Every cached page of every feed, for inspection
    pub fn total_pages(&self) -> usize {
        self.feeds.values().map(|e| e.pages.len()).sum()
    }
}
