//! User-facing outcome reporting and view collaborators
//!
//! The feed never renders anything itself. Outcomes go to a [`Notifier`]
//! (toasts plus error telemetry) and interactive steps go through
//! [`ViewHooks`].

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FeedError;
use crate::model::RecordKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A human-readable outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Toast and telemetry sink
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);

    /// Forward an underlying failure to error telemetry
    fn report_error(&self, context: &str, error: &FeedError) {
        tracing::error!(context, error = %error, "Feed operation failed");
    }
}

/// Writes notices to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => tracing::info!(title = %notice.title, "{}", notice.message),
            NoticeLevel::Warning => tracing::warn!(title = %notice.title, "{}", notice.message),
            NoticeLevel::Error => tracing::error!(title = %notice.title, "{}", notice.message),
        }
    }
}

/// Keeps every notice and reported error, for simulations and tests
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices().pop()
    }

    pub fn reported_errors(&self) -> Vec<String> {
        self.errors.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }

    fn report_error(&self, context: &str, error: &FeedError) {
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(format!("{}: {}", context, error));
        }
    }
}

/// Interactive steps owned by the UI
#[async_trait]
pub trait ViewHooks: Send + Sync {
    /// Ask the user to confirm deleting a record
    async fn confirm_delete(&self, item_id: &str, kind: RecordKind) -> bool;

    /// Leave the creation screen after a record was created
    fn leave_creation_view(&self, kind: RecordKind);
}

/// Confirms everything and has nowhere to navigate; for headless use
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

#[async_trait]
impl ViewHooks for AutoConfirm {
    async fn confirm_delete(&self, _item_id: &str, _kind: RecordKind) -> bool {
        true
    }

    fn leave_creation_view(&self, kind: RecordKind) {
        tracing::debug!(kind = %kind, "Leaving creation view");
    }
}
