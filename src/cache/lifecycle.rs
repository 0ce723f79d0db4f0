//! Feed view lifecycle
//!
//! A [`FeedView`] drives one cached feed while a screen shows it: first
//! load, infinite scroll, pull-to-refresh, and the trim back to page 0 when
//! the screen goes away. Page 0 is not refetched on refocus or reconnect
//! unless the [`RefetchPolicy`] asks for it or a mutation marked it stale.

use std::sync::Arc;

use tracing::{debug, info};

use super::feed_cache::{CacheKey, FeedKey, SharedCache};
use crate::config::{FeedConfig, RefetchPolicy};
use crate::error::Result;
use crate::feed::{FeedFetcher, FeedRequest};
use crate::model::{Page, PageEntry};
use crate::telemetry::{Notice, Notifier};

pub struct FeedView {
    key: FeedKey,
    limit: usize,
    policy: RefetchPolicy,
    fetcher: FeedFetcher,
    cache: SharedCache,
    notifier: Arc<dyn Notifier>,
    last_error: Option<String>,
}

impl FeedView {
    pub fn new(
        key: FeedKey,
        config: &FeedConfig,
        fetcher: FeedFetcher,
        cache: SharedCache,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            key,
            limit: config.page_limit,
            policy: config.refetch,
            fetcher,
            cache,
            notifier,
            last_error: None,
        }
    }

    pub fn key(&self) -> &FeedKey {
        &self.key
    }

    /// Error from the most recent failed fetch, cleared by the next success
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Show the feed: fetch page 0 unless a fresh copy is cached.
    /// Returns whether a fetch happened.
    pub async fn open(&mut self) -> Result<bool> {
        if !self.needs_refetch().await {
            debug!(owner = %self.key.owner, "Serving feed from cache");
            return Ok(false);
        }
        self.fetch_into(0, true).await?;
        Ok(true)
    }

    /// Load the page after the last cached one. Returns `false` when the
    /// feed is exhausted.
    ///
    /// A stale feed is reloaded from page 0 instead: its later offsets no
    /// longer line up with what the store holds.
    pub async fn load_more(&mut self) -> Result<bool> {
        let cursor = {
            let cache = self.cache.lock().await;
            match cache.feed(&self.key) {
                Some(entry) if entry.stale => Some(0),
                Some(entry) => entry.next_cursor(),
                None => Some(0),
            }
        };
        let Some(index) = cursor else {
            return Ok(false);
        };
        self.fetch_into(index, index == 0).await?;
        Ok(true)
    }

    /// Pull-to-refresh: refetch page 0 and drop deeper pages
    pub async fn refresh(&mut self) -> Result<()> {
        self.fetch_into(0, true).await
    }

    /// Trim the cache back to page 0 when the view goes away
    pub async fn on_view_exit(&mut self) -> usize {
        let dropped = self.cache.lock().await.trim_to_first_page(&self.key);
        info!(owner = %self.key.owner, dropped, "Feed view closed");
        dropped
    }

    pub async fn on_refocus(&mut self) -> Result<bool> {
        self.refetch_if(self.policy.on_focus).await
    }

    pub async fn on_reconnect(&mut self) -> Result<bool> {
        self.refetch_if(self.policy.on_reconnect).await
    }

    pub async fn pages(&self) -> Vec<Page> {
        let cache = self.cache.lock().await;
        cache.feed(&self.key).map(|e| e.pages.clone()).unwrap_or_default()
    }

    /// Every cached entry in render order
    pub async fn items(&self) -> Vec<PageEntry> {
        let cache = self.cache.lock().await;
        cache
            .feed(&self.key)
            .map(|e| e.entries().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn has_more(&self) -> bool {
        let cache = self.cache.lock().await;
        cache.feed(&self.key).map_or(true, |e| e.next_cursor().is_some())
    }

    async fn needs_refetch(&self) -> bool {
        let cache = self.cache.lock().await;
        cache.feed(&self.key).is_none() || cache.is_stale(&CacheKey::Feed(self.key.clone()))
    }

    async fn refetch_if(&mut self, policy_allows: bool) -> Result<bool> {
        if policy_allows || self.needs_refetch().await {
            self.fetch_into(0, true).await?;
            return Ok(true);
        }
        Ok(false)
    }

    async fn fetch_into(&mut self, index: u32, reset: bool) -> Result<()> {
        let request = FeedRequest::for_key(&self.key, index, self.limit);

        match self.fetcher.fetch_page(&request).await {
            Ok(page) => {
                let mut cache = self.cache.lock().await;
                if reset {
                    cache.reset_feed(&self.key, page);
                } else {
                    cache.store_page(&self.key, index as usize, page);
                }
                self.last_error = None;
                Ok(())
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                self.notifier
                    .notify(Notice::error("Couldn't load feed", "Pull to refresh to try again"));
                self.notifier.report_error("fetch", &err);
                Err(err)
            }
        }
    }
}
