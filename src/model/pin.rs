//! Pin references and the per-item pin state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::item::RecordKind;

/// Maximum pinned items per (owner, context)
pub const DEFAULT_PIN_CAPACITY: usize = 10;

/// Namespace under which a pinned set and its capacity are scoped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinContext(String);

impl PinContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The cross-feature timeline
    pub fn global() -> Self {
        Self::new("global")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PinContext {
    fn default() -> Self {
        Self::global()
    }
}

impl std::fmt::Display for PinContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A row in the pin registry, unique per `(owner, pinned_context, item_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedRef {
    pub owner: String,
    pub pinned_context: PinContext,
    pub item_id: String,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub pinned_at: DateTime<Utc>,
}

impl PinnedRef {
    pub fn key(&self) -> PinKey {
        PinKey {
            owner: self.owner.clone(),
            context: self.pinned_context.clone(),
            item_id: self.item_id.clone(),
        }
    }
}

/// Identity of a pin registry row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PinKey {
    pub owner: String,
    pub context: PinContext,
    pub item_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinState {
    Unpinned,
    Pinned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinAction {
    Pin,
    Unpin,
}

impl PinState {
    /// State after `action`. Both transitions are idempotent.
    pub fn apply(self, action: PinAction) -> PinState {
        match action {
            PinAction::Pin => PinState::Pinned,
            PinAction::Unpin => PinState::Unpinned,
        }
    }

    /// The action a toggle performs from this state
    pub fn toggle_action(self) -> PinAction {
        match self {
            PinState::Unpinned => PinAction::Pin,
            PinState::Pinned => PinAction::Unpin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_are_idempotent() {
        let s = PinState::Unpinned.apply(PinAction::Pin);
        assert_eq!(s, PinState::Pinned);
        assert_eq!(s.apply(PinAction::Pin), PinState::Pinned);
        assert_eq!(s.apply(PinAction::Unpin).apply(PinAction::Unpin), PinState::Unpinned);
    }

    #[test]
    fn test_toggle_action() {
        assert_eq!(PinState::Unpinned.toggle_action(), PinAction::Pin);
        assert_eq!(PinState::Pinned.toggle_action(), PinAction::Unpin);
    }
}
