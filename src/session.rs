//! Owner session

use crate::error::{FeedError, Result};

/// The signed-in owner, if any. Every feed operation requires one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    owner: Option<String>,
}

impl Session {
    pub fn for_owner(owner: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// The owner id, or `FeedError::Authentication`
    pub fn require_owner(&self) -> Result<&str> {
        self.owner.as_deref().ok_or(FeedError::Authentication)
    }
}
