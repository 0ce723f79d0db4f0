//! Lifelog Feed - aggregated timeline with pinning
//!
//! Merges a person's notes, workout sessions, weight entries, todo lists,
//! reminders and activities into one reverse-chronological, paginated
//! timeline, with up to ten pinned items per context shown ahead of page 0.
//!
//! # Architecture
//!
//! - **store**: the [`RecordStore`] contract the feed reads and writes through
//! - **feed**: fetches one page (pinned group + regular slice) and merges it
//! - **pins**: pin capacity and idempotent pin/unpin writes
//! - **mutation**: optimistic delete / pin toggle / create with rollback
//! - **cache**: per-session page cache and the view lifecycle around it
//!
//! Records themselves are created and destroyed by the store; the feed only
//! reflects them and manages pins.
//!
//! # Example
//!
//! ```rust,ignore
//! use lifelog_feed::{FeedClient, FeedConfig, MemoryRecordStore, Session};
//!
//! let client = FeedClient::new(store, Session::for_owner("owner-1"), FeedConfig::default());
//! let mut feed = client.root_feed()?;
//! feed.open().await?;
//!
//! for entry in feed.items().await {
//!     println!("[{}] {}", entry.feed_context.as_str(), entry.item.title);
//! }
//! ```

// Timeline data model
pub mod model;

// Record store contract and in-memory backend
pub mod store;

// Page fetch and merge
pub mod feed;

// Pin registry protocol
pub mod pins;

// Page cache and view lifecycle
pub mod cache;

// Optimistic mutations
pub mod mutation;

// Session-scoped facade
pub mod client;

pub mod config;
pub mod error;
pub mod session;
pub mod telemetry;

pub use model::{
    ExtraFields, FeedContext, FeedItem, Page, PageEntry, PinAction, PinContext, PinState,
    PinnedRef, RecordKind, DEFAULT_PIN_CAPACITY,
};

pub use store::{MemoryRecordStore, NewRecord, PageQuery, RecordStore, StoreOp};

pub use feed::{merge_page, FeedFetcher, FeedRequest};

pub use pins::PinRegistry;

pub use cache::{CacheKey, FeedCache, FeedKey, FeedView, SharedCache};

pub use mutation::{MutationCoordinator, MutationOutcome, PinOutcome};

pub use client::FeedClient;

pub use config::{FeedConfig, RefetchPolicy};
pub use error::{FeedError, Result, StoreError};
pub use session::Session;
pub use telemetry::{AutoConfirm, Notice, NoticeLevel, Notifier, RecordingNotifier, TracingNotifier, ViewHooks};
