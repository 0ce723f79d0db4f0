//! Session-scoped feed client
//!
//! Wires the store, cache, fetcher, pin registry and mutation coordinator
//! for one owner session.
//!
//! # Example
//!
//! ```rust,ignore
//! use lifelog_feed::{FeedClient, FeedConfig, MemoryRecordStore, Session};
//!
//! let client = FeedClient::new(
//!     Arc::new(MemoryRecordStore::new()),
//!     Session::for_owner("owner-1"),
//!     FeedConfig::default(),
//! );
//!
//! let mut feed = client.root_feed()?;
//! feed.open().await?;
//! feed.load_more().await?;
//!
//! client.toggle_pin("item-7", &PinContext::global()).await?;
//! feed.on_view_exit().await;
//! ```

use std::sync::Arc;

use crate::cache::{FeedCache, FeedKey, FeedView, SharedCache};
use crate::config::FeedConfig;
use crate::error::Result;
use crate::feed::FeedFetcher;
use crate::model::{FeedItem, PinContext, RecordKind};
use crate::mutation::{MutationCoordinator, MutationOutcome, PinOutcome};
use crate::pins::PinRegistry;
use crate::session::Session;
use crate::store::{NewRecord, RecordStore};
use crate::telemetry::{AutoConfirm, Notifier, TracingNotifier, ViewHooks};

pub struct FeedClient {
    session: Session,
    config: FeedConfig,
    cache: SharedCache,
    fetcher: FeedFetcher,
    coordinator: MutationCoordinator,
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn Notifier>,
    hooks: Arc<dyn ViewHooks>,
}

impl FeedClient {
    /// Client with tracing notices and auto-confirmed deletes
    pub fn new(store: Arc<dyn RecordStore>, session: Session, config: FeedConfig) -> Self {
        Self::with_collaborators(
            store,
            session,
            config,
            Arc::new(TracingNotifier),
            Arc::new(AutoConfirm),
        )
    }

    pub fn with_collaborators(
        store: Arc<dyn RecordStore>,
        session: Session,
        config: FeedConfig,
        notifier: Arc<dyn Notifier>,
        hooks: Arc<dyn ViewHooks>,
    ) -> Self {
        let cache = FeedCache::shared();
        let fetcher = FeedFetcher::new(store.clone());
        let pins = PinRegistry::with_capacity(store.clone(), config.pin_capacity);
        let coordinator = MutationCoordinator::new(
            session.clone(),
            cache.clone(),
            store.clone(),
            pins,
            notifier.clone(),
            hooks.clone(),
        );

        Self {
            session,
            config,
            cache,
            fetcher,
            coordinator,
            store,
            notifier,
            hooks,
        }
    }

    /// Same store, collaborators and config for another session, with a
    /// fresh cache
    pub fn switch_session(&self, session: Session) -> Self {
        Self::with_collaborators(
            self.store.clone(),
            session,
            self.config.clone(),
            self.notifier.clone(),
            self.hooks.clone(),
        )
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn cache(&self) -> SharedCache {
        self.cache.clone()
    }

    pub fn coordinator(&self) -> &MutationCoordinator {
        &self.coordinator
    }

    /// Every kind, global pins
    pub fn root_feed(&self) -> Result<FeedView> {
        let owner = self.session.require_owner()?;
        Ok(self.view(FeedKey::root(owner)))
    }

    /// One kind with that kind's own pins
    pub fn kind_feed(&self, kind: RecordKind) -> Result<FeedView> {
        let owner = self.session.require_owner()?;
        Ok(self.view(FeedKey::for_kind(owner, kind)))
    }

    /// Any combination of type filter and pin context
    pub fn feed(&self, kind: Option<RecordKind>, context: PinContext) -> Result<FeedView> {
        let owner = self.session.require_owner()?;
        Ok(self.view(FeedKey {
            owner: owner.to_string(),
            kind,
            pinned_context: context,
        }))
    }

    fn view(&self, key: FeedKey) -> FeedView {
        FeedView::new(
            key,
            &self.config,
            self.fetcher.clone(),
            self.cache.clone(),
            self.notifier.clone(),
        )
    }

    pub async fn delete(&self, item_id: &str, kind: RecordKind) -> Result<MutationOutcome> {
        self.coordinator.delete(item_id, kind).await
    }

    pub async fn toggle_pin(&self, item_id: &str, context: &PinContext) -> Result<PinOutcome> {
        self.coordinator.toggle_pin(item_id, context).await
    }

    pub async fn create(&self, record: NewRecord) -> Result<FeedItem> {
        self.coordinator.create(record).await
    }
}
