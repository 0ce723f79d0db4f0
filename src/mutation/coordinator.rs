//! Mutation coordinator
//!
//! Runs delete, pin toggle and create against the session cache. Delete and
//! pin toggle are optimistic: the cache change is applied before the remote
//! call is awaited, and a snapshot taken just before is kept for rollback.
//!
//! # Rollback
//!
//! When the remote call fails the coordinator looks at what happened to the
//! cache in the meantime:
//!
//! - nothing was written: the snapshot is restored as-is;
//! - a newer mutation touched the same item: the stale rollback is dropped
//!   and the owner's feeds are marked for refetch;
//! - other writes happened: only this item is put back where the snapshot
//!   had it.

use std::sync::Arc;

use tracing::{info, warn};

use super::command::{CacheCommand, RemoveItem, SetPinState};
use crate::cache::{CacheKey, CacheSnapshot, FeedCache, SharedCache};
use crate::error::{FeedError, Result, WriteOp};
use crate::model::{FeedItem, PinAction, PinContext, PinState, RecordKind};
use crate::pins::PinRegistry;
use crate::session::Session;
use crate::store::{NewRecord, RecordStore};
use crate::telemetry::{Notice, Notifier, ViewHooks};

/// How a failed mutation was reconciled with the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RollbackKind {
    Exact,
    Targeted,
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    /// The user declined the confirmation prompt
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinOutcome {
    pub item_id: String,
    pub context: PinContext,
    pub state: PinState,
}

/// Bookkeeping for one in-flight optimistic mutation
struct InFlight {
    snapshot: CacheSnapshot,
    generation: u64,
    version: u64,
}

#[derive(Clone)]
pub struct MutationCoordinator {
    session: Session,
    cache: SharedCache,
    store: Arc<dyn RecordStore>,
    pins: PinRegistry,
    notifier: Arc<dyn Notifier>,
    hooks: Arc<dyn ViewHooks>,
}

impl MutationCoordinator {
    pub fn new(
        session: Session,
        cache: SharedCache,
        store: Arc<dyn RecordStore>,
        pins: PinRegistry,
        notifier: Arc<dyn Notifier>,
        hooks: Arc<dyn ViewHooks>,
    ) -> Self {
        Self {
            session,
            cache,
            store,
            pins,
            notifier,
            hooks,
        }
    }

    /// Delete a record after the user confirms it.
    pub async fn delete(&self, item_id: &str, kind: RecordKind) -> Result<MutationOutcome> {
        let owner = self.session.require_owner()?.to_string();

        if !self.hooks.confirm_delete(item_id, kind).await {
            info!(item_id, kind = %kind, "Delete cancelled by user");
            return Ok(MutationOutcome::Cancelled);
        }

        let command = RemoveItem::new(item_id);
        let in_flight = {
            let mut cache = self.cache.lock().await;
            begin(&mut cache, &command)
        };

        let result = self
            .store
            .delete_record(&owner, kind, item_id)
            .await
            .map_err(FeedError::remote(WriteOp::Delete));

        match result {
            Ok(()) => {
                {
                    let mut cache = self.cache.lock().await;
                    invalidate_dependents(&mut cache, &owner, kind);
                    cache.forget_item(item_id);
                }
                info!(owner = %owner, item_id, kind = %kind, "Record deleted");
                self.notifier
                    .notify(Notice::success("Deleted", format!("The {} was deleted", kind_label(kind))));
                Ok(MutationOutcome::Applied)
            }
            Err(err) => {
                self.rollback(&owner, &command, in_flight).await;
                self.fail("delete", "Could not delete", &err);
                Err(err)
            }
        }
    }

    /// Pin or unpin an item in `context`, whichever flips its current state.
    pub async fn toggle_pin(&self, item_id: &str, context: &PinContext) -> Result<PinOutcome> {
        let owner = self.session.require_owner()?.to_string();

        let planned = {
            let mut cache = self.cache.lock().await;
            let item = cache
                .find_item(&owner, item_id)
                .ok_or_else(|| FeedError::NotCached(item_id.to_string()))?;
            let state = cache.pin_state(&owner, context, item_id);
            let pinned = cache.pinned_count(&owner, context);
            self.pins.plan(context, state, pinned).map(|action| {
                let command = SetPinState::new(owner.clone(), context.clone(), item, action);
                let in_flight = begin(&mut cache, &command);
                (command, in_flight, state)
            })
        };

        let (command, in_flight, state) = match planned {
            Ok(planned) => planned,
            Err(err) => {
                self.notifier.notify(Notice::warning(
                    "Pin limit reached",
                    format!("You can pin up to {} items here. Unpin one first.", self.pins.capacity()),
                ));
                return Err(err);
            }
        };

        let action = command.action();
        let result = self
            .pins
            .commit(action, &owner, context, item_id, command.item().kind())
            .await;

        match result {
            Ok(()) => {
                let (title, message) = match action {
                    PinAction::Pin => ("Pinned", "Item pinned to the top"),
                    PinAction::Unpin => ("Unpinned", "Item removed from pinned"),
                };
                self.notifier.notify(Notice::success(title, message));
                Ok(PinOutcome {
                    item_id: item_id.to_string(),
                    context: context.clone(),
                    state: state.apply(action),
                })
            }
            Err(err) => {
                self.rollback(&owner, &command, in_flight).await;
                self.fail(command.label(), "Could not update pin", &err);
                Err(err)
            }
        }
    }

    /// Create a record. Nothing is inserted into the cache; the feeds are
    /// invalidated so the next fetch places the record where the store
    /// ranks it.
    pub async fn create(&self, record: NewRecord) -> Result<FeedItem> {
        let owner = self.session.require_owner()?.to_string();
        if record.title.trim().is_empty() {
            return Err(FeedError::InvalidRequest("title is required".into()));
        }
        let kind = record.kind();

        match self.store.create_record(&owner, record).await {
            Ok(item) => {
                {
                    let mut cache = self.cache.lock().await;
                    invalidate_dependents(&mut cache, &owner, kind);
                }
                info!(owner = %owner, item_id = %item.id, kind = %kind, "Record created");
                self.hooks.leave_creation_view(kind);
                self.notifier
                    .notify(Notice::success("Saved", format!("New {} saved", kind_label(kind))));
                Ok(item)
            }
            Err(source) => {
                let err = FeedError::RemoteWrite {
                    op: WriteOp::Create,
                    source,
                };
                self.fail("create", "Could not save", &err);
                Err(err)
            }
        }
    }

    async fn rollback(&self, owner: &str, command: &dyn CacheCommand, in_flight: InFlight) -> RollbackKind {
        let mut cache = self.cache.lock().await;
        let item_id = command.item_id();

        let kind = if cache.generation() == in_flight.generation {
            cache.restore(&in_flight.snapshot);
            RollbackKind::Exact
        } else if cache.item_version(item_id) != in_flight.version {
            cache.invalidate_owner_feeds(owner);
            RollbackKind::Superseded
        } else {
            command.undo(&mut cache, &in_flight.snapshot);
            RollbackKind::Targeted
        };

        warn!(item_id, mutation = command.label(), rollback = ?kind, "Optimistic change rolled back");
        kind
    }

    fn fail(&self, context: &str, title: &str, err: &FeedError) {
        self.notifier.notify(Notice::error(title, err.to_string()));
        self.notifier.report_error(context, err);
    }
}

/// Snapshot, apply, and stamp the item's new version
fn begin(cache: &mut FeedCache, command: &dyn CacheCommand) -> InFlight {
    let snapshot = cache.snapshot();
    command.apply(cache);
    let version = cache.bump_item_version(command.item_id());
    InFlight {
        snapshot,
        generation: cache.generation(),
        version,
    }
}

fn invalidate_dependents(cache: &mut FeedCache, owner: &str, kind: RecordKind) {
    cache.invalidate_owner_feeds(owner);
    cache.invalidate(CacheKey::Summary {
        owner: owner.to_string(),
        kind,
    });
    cache.invalidate(CacheKey::List {
        owner: owner.to_string(),
        kind,
    });
}

fn kind_label(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Note => "note",
        RecordKind::GymSession => "workout",
        RecordKind::WeightEntry => "weight entry",
        RecordKind::TodoList => "todo list",
        RecordKind::Reminder => "reminder",
        RecordKind::Activity => "activity",
    }
}
