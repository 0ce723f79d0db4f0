//! Feed configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FeedError, Result};
use crate::model::DEFAULT_PIN_CAPACITY;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Regular items per page
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,

    /// Pinned items allowed per (owner, context)
    #[serde(default = "default_pin_capacity")]
    pub pin_capacity: usize,

    #[serde(default)]
    pub refetch: RefetchPolicy,
}

/// When a cached page 0 is refetched without the user asking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefetchPolicy {
    /// Refetch when the view regains focus
    #[serde(default)]
    pub on_focus: bool,

    /// Refetch when connectivity returns
    #[serde(default)]
    pub on_reconnect: bool,
}

fn default_page_limit() -> usize { 10 }
fn default_pin_capacity() -> usize { DEFAULT_PIN_CAPACITY }

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_limit: default_page_limit(),
            pin_capacity: default_pin_capacity(),
            refetch: RefetchPolicy::default(),
        }
    }
}

impl FeedConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: FeedConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Apply `FEED_*` environment overrides
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(val) = std::env::var("FEED_PAGE_LIMIT") {
            if let Ok(limit) = val.parse::<usize>() {
                self.page_limit = limit;
            }
        }

        if let Ok(val) = std::env::var("FEED_PIN_CAPACITY") {
            if let Ok(capacity) = val.parse::<usize>() {
                self.pin_capacity = capacity;
            }
        }

        if let Ok(val) = std::env::var("FEED_REFETCH_ON_FOCUS") {
            self.refetch.on_focus = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("FEED_REFETCH_ON_RECONNECT") {
            self.refetch.on_reconnect = parse_flag(&val);
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_limit == 0 {
            return Err(FeedError::Config("page_limit must be at least 1".into()));
        }
        if self.pin_capacity == 0 {
            return Err(FeedError::Config("pin_capacity must be at least 1".into()));
        }
        // Config may lower the pin limit, never raise it
        if self.pin_capacity > DEFAULT_PIN_CAPACITY {
            return Err(FeedError::Config(format!(
                "pin_capacity must not exceed {}",
                DEFAULT_PIN_CAPACITY
            )));
        }
        Ok(())
    }
}

fn parse_flag(val: &str) -> bool {
    matches!(val.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
