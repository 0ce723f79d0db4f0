//! Pin registry protocol
//!
//! A pin is a row keyed by `(owner, pinned_context, item_id)`. Pinning is an
//! upsert and unpinning a delete, so repeating either has no further effect.
//! At most `capacity` rows may exist per (owner, context).
//!
//! The capacity check in [`PinRegistry::plan`] runs against what the client
//! cache shows and is advisory only: the store's answer to
//! [`PinRegistry::commit`] decides.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{FeedError, Result, WriteOp};
use crate::model::{PinAction, PinContext, PinState, RecordKind, DEFAULT_PIN_CAPACITY};
use crate::store::RecordStore;

#[derive(Clone)]
pub struct PinRegistry {
    store: Arc<dyn RecordStore>,
    capacity: usize,
}

impl PinRegistry {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_capacity(store, DEFAULT_PIN_CAPACITY)
    }

    pub fn with_capacity(store: Arc<dyn RecordStore>, capacity: usize) -> Self {
        Self { store, capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Choose the toggle action for an item in `state`, refusing a pin when
    /// the context already shows `pinned_count` >= capacity.
    pub fn plan(&self, context: &PinContext, state: PinState, pinned_count: usize) -> Result<PinAction> {
        let action = state.toggle_action();
        if action == PinAction::Pin && pinned_count >= self.capacity {
            warn!(context = %context, pinned_count, limit = self.capacity, "Pin refused, context full");
            return Err(FeedError::CapacityExceeded {
                context: context.clone(),
                limit: self.capacity,
            });
        }
        Ok(action)
    }

    /// Write the pin change to the store
    pub async fn commit(
        &self,
        action: PinAction,
        owner: &str,
        context: &PinContext,
        item_id: &str,
        kind: RecordKind,
    ) -> Result<()> {
        match action {
            PinAction::Pin => self.pin(owner, context, item_id, kind).await,
            PinAction::Unpin => self.unpin(owner, context, item_id, kind).await,
        }
    }

    pub async fn pin(&self, owner: &str, context: &PinContext, item_id: &str, kind: RecordKind) -> Result<()> {
        self.store
            .upsert_pin(owner, context, item_id, kind)
            .await
            .map_err(FeedError::remote(WriteOp::Pin))?;
        info!(owner, context = %context, item_id, "Item pinned");
        Ok(())
    }

    pub async fn unpin(&self, owner: &str, context: &PinContext, item_id: &str, kind: RecordKind) -> Result<()> {
        self.store
            .delete_pin(owner, context, item_id, kind)
            .await
            .map_err(FeedError::remote(WriteOp::Unpin))?;
        info!(owner, context = %context, item_id, "Item unpinned");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExtraFields, FeedItem};
    use crate::store::MemoryRecordStore;
    use chrono::Utc;

    fn reminder(id: &str) -> FeedItem {
        let now = Utc::now();
        FeedItem {
            id: id.into(),
            owner: "o".into(),
            source_id: id.into(),
            title: "Call the dentist".into(),
            occurred_at: now,
            created_at: now,
            updated_at: None,
            extra: ExtraFields::Reminder {
                remind_at: now,
                notify_before_minutes: Some(15),
                delivered: false,
            },
        }
    }

    #[test]
    fn test_plan_refuses_pin_at_capacity() {
        let registry = PinRegistry::new(Arc::new(MemoryRecordStore::new()));
        let ctx = PinContext::new("reminders");

        assert_eq!(registry.plan(&ctx, PinState::Unpinned, 9).unwrap(), PinAction::Pin);
        let err = registry.plan(&ctx, PinState::Unpinned, 10).unwrap_err();
        assert!(matches!(err, FeedError::CapacityExceeded { limit: 10, .. }));
        // unpinning is always allowed
        assert_eq!(registry.plan(&ctx, PinState::Pinned, 10).unwrap(), PinAction::Unpin);
    }

    #[tokio::test]
    async fn test_repeated_pin_and_unpin_converge() {
        let store = Arc::new(MemoryRecordStore::new());
        store.seed_records(vec![reminder("r1")]).await;
        let registry = PinRegistry::new(store.clone());
        let ctx = PinContext::new("reminders");

        registry.pin("o", &ctx, "r1", RecordKind::Reminder).await.unwrap();
        registry.pin("o", &ctx, "r1", RecordKind::Reminder).await.unwrap();
        assert_eq!(store.pinned_refs("o", &ctx).await.len(), 1);

        registry.unpin("o", &ctx, "r1", RecordKind::Reminder).await.unwrap();
        registry.unpin("o", &ctx, "r1", RecordKind::Reminder).await.unwrap();
        assert!(store.pinned_refs("o", &ctx).await.is_empty());

        registry.unpin("o", &ctx, "r1", RecordKind::Reminder).await.unwrap();
        registry.pin("o", &ctx, "r1", RecordKind::Reminder).await.unwrap();
        let pins = store.pinned_refs("o", &ctx).await;
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].item_id, "r1");
    }

    #[tokio::test]
    async fn test_store_rejection_is_remote_write_error() {
        let store = Arc::new(MemoryRecordStore::new());
        let registry = PinRegistry::new(store);
        let err = registry
            .pin("o", &PinContext::global(), "missing", RecordKind::Note)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::RemoteWrite { op: WriteOp::Pin, .. }));
    }
}
