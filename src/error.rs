//! Error types for the feed subsystem

use thiserror::Error;

use crate::model::PinContext;

/// Result type for feed operations
pub type Result<T> = std::result::Result<T, FeedError>;

/// Result type for record store calls
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures reported by a record store backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend unreachable or the call failed in transit
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Record or pin not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend refused the write (e.g. server-side pin limit)
    #[error("Rejected by store: {0}")]
    Rejected(String),

    /// Backend rejected the owner's credentials
    #[error("Unauthorized")]
    Unauthorized,
}

/// Which leg of a page fetch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchLeg {
    Pinned,
    Regular,
}

impl std::fmt::Display for FetchLeg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchLeg::Pinned => write!(f, "pinned"),
            FetchLeg::Regular => write!(f, "regular"),
        }
    }
}

/// Remote write that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Pin,
    Unpin,
    Delete,
    Create,
}

impl std::fmt::Display for WriteOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteOp::Pin => write!(f, "pin"),
            WriteOp::Unpin => write!(f, "unpin"),
            WriteOp::Delete => write!(f, "delete"),
            WriteOp::Create => write!(f, "create"),
        }
    }
}

/// Feed error types
#[derive(Error, Debug)]
pub enum FeedError {
    /// No owner session; nothing was touched
    #[error("Unauthorized: no active owner session")]
    Authentication,

    /// Pin set for the context is already full
    #[error("Pin limit reached for context '{context}' ({limit} items)")]
    CapacityExceeded { context: PinContext, limit: usize },

    /// Remote pin/unpin/delete/create failed
    #[error("Remote {op} failed: {source}")]
    RemoteWrite {
        op: WriteOp,
        #[source]
        source: StoreError,
    },

    /// One leg of a page fetch failed, so the whole page did
    #[error("Feed fetch failed on {leg} leg: {source}")]
    PartialFetch {
        leg: FetchLeg,
        #[source]
        source: StoreError,
    },

    /// Item is not present in any cached page
    #[error("Item not cached: {0}")]
    NotCached(String),

    /// Caller passed an unusable request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FeedError {
    pub(crate) fn remote(op: WriteOp) -> impl FnOnce(StoreError) -> FeedError {
        move |source| FeedError::RemoteWrite { op, source }
    }

    pub(crate) fn fetch(leg: FetchLeg) -> impl FnOnce(StoreError) -> FeedError {
        move |source| FeedError::PartialFetch { leg, source }
    }

    /// Whether the error triggered (or would trigger) a cache rollback
    pub fn is_remote_write(&self) -> bool {
        matches!(self, FeedError::RemoteWrite { .. })
    }
}

impl From<toml::de::Error> for FeedError {
    fn from(err: toml::de::Error) -> Self {
        FeedError::Config(err.to_string())
    }
}

impl From<std::io::Error> for FeedError {
    fn from(err: std::io::Error) -> Self {
        FeedError::Config(err.to_string())
    }
}
