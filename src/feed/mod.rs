//! Timeline page retrieval
//!
//! [`FeedFetcher`] reads the pinned group and the regular slice from a
//! record store; [`merge_page`] combines them into one deduplicated page.

mod fetcher;
mod merge;

pub use fetcher::{FeedFetcher, FeedRequest};
pub use merge::merge_page;
