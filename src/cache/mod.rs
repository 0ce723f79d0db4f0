//! Session cache for feed pages
//!
//! [`FeedCache`] holds fetched pages per feed; [`FeedView`] manages a feed's
//! lifetime on screen.

mod feed_cache;
mod lifecycle;

pub use feed_cache::{CacheKey, CacheSnapshot, FeedCache, FeedEntry, FeedKey, SharedCache};
pub use lifecycle::FeedView;
