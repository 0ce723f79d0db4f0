//! Pin registry and pin toggle integration tests

mod common;

use common::*;
use lifelog_feed::{
    FeedContext, FeedError, NoticeLevel, PinContext, PinRegistry, PinState, RecordKind, StoreError,
    StoreOp,
};

// =============================================================================
// Capacity
// =============================================================================

#[tokio::test]
async fn test_pin_refused_when_context_is_full() {
    let records = notes(11);
    let context = PinContext::new("notes");
    let pins = records[..10]
        .iter()
        .enumerate()
        .map(|(i, r)| pin_row(r, &context, i as i64))
        .collect();
    let h = Harness::new(seeded_store(records, pins).await);

    let mut feed = h.client.kind_feed(RecordKind::Note).unwrap();
    feed.open().await.unwrap();
    let before = feed.pages().await;
    assert_eq!(before[0].pinned_count(), 10);

    let err = h.client.toggle_pin("item_11", &context).await.unwrap_err();
    assert!(matches!(err, FeedError::CapacityExceeded { limit: 10, .. }));

    assert_eq!(h.store.pinned_refs(OWNER, &context).await.len(), 10);
    assert_eq!(h.store.calls(StoreOp::UpsertPin).await, 0);
    assert_eq!(feed.pages().await, before);

    let entry = feed
        .items()
        .await
        .into_iter()
        .find(|e| e.item.id == "item_11")
        .unwrap();
    assert_eq!(entry.feed_context, FeedContext::Feed);

    let notice = h.notifier.last().unwrap();
    assert_eq!(notice.level, NoticeLevel::Warning);
    assert!(h.notifier.reported_errors().is_empty());
}

#[tokio::test]
async fn test_unpin_allowed_when_context_is_full() {
    let records = notes(11);
    let context = PinContext::new("notes");
    let pins = records[..10]
        .iter()
        .enumerate()
        .map(|(i, r)| pin_row(r, &context, i as i64))
        .collect();
    let h = Harness::new(seeded_store(records, pins).await);

    let mut feed = h.client.kind_feed(RecordKind::Note).unwrap();
    feed.open().await.unwrap();

    let outcome = h.client.toggle_pin("item_3", &context).await.unwrap();
    assert_eq!(outcome.state, PinState::Unpinned);
    assert_eq!(h.store.pinned_refs(OWNER, &context).await.len(), 9);

    // now there is room again
    let outcome = h.client.toggle_pin("item_11", &context).await.unwrap();
    assert_eq!(outcome.state, PinState::Pinned);
    assert_eq!(h.store.pinned_refs(OWNER, &context).await.len(), 10);
}

#[tokio::test]
async fn test_store_rejects_pin_the_cache_did_not_see() {
    // another session filled the context after this one loaded its feed
    let records = notes(12);
    let context = PinContext::global();
    let h = Harness::new(seeded_store(records.clone(), vec![]).await);

    let mut feed = h.client.root_feed().unwrap();
    feed.open().await.unwrap();
    let before = feed.pages().await;

    let pins: Vec<_> = records[..10]
        .iter()
        .enumerate()
        .map(|(i, r)| pin_row(r, &context, i as i64))
        .collect();
    h.store.seed_pins(pins).await;

    let err = h.client.toggle_pin("item_12", &context).await.unwrap_err();
    assert!(matches!(
        err,
        FeedError::RemoteWrite {
            source: StoreError::Rejected(_),
            ..
        }
    ));
    assert_eq!(feed.pages().await, before);
    assert_eq!(h.store.pinned_refs(OWNER, &context).await.len(), 10);
}

// =============================================================================
// Optimistic toggle
// =============================================================================

#[tokio::test]
async fn test_toggle_pins_and_unpins_in_place() {
    let h = Harness::new(seeded_store(notes(5), vec![]).await);
    let global = PinContext::global();
    let mut feed = h.client.root_feed().unwrap();
    feed.open().await.unwrap();

    let outcome = h.client.toggle_pin("item_2", &global).await.unwrap();
    assert_eq!(outcome.state, PinState::Pinned);

    let items = feed.items().await;
    assert_eq!(items[0].item.id, "item_2");
    assert!(items[0].is_pinned());
    assert_eq!(items.iter().filter(|e| e.item.id == "item_2").count(), 1);
    assert_eq!(h.notifier.last().unwrap().level, NoticeLevel::Success);

    let outcome = h.client.toggle_pin("item_2", &global).await.unwrap();
    assert_eq!(outcome.state, PinState::Unpinned);

    let ids: Vec<String> = feed.items().await.into_iter().map(|e| e.item.id).collect();
    assert_eq!(ids, vec!["item_5", "item_4", "item_3", "item_2", "item_1"]);
    assert!(h.store.pinned_refs(OWNER, &global).await.is_empty());
}

#[tokio::test]
async fn test_failed_pin_restores_exact_cache() {
    let h = Harness::new(seeded_store(notes(25), vec![]).await);
    let global = PinContext::global();
    let mut feed = h.client.root_feed().unwrap();
    feed.open().await.unwrap();
    feed.load_more().await.unwrap();
    let mut notes_feed = h.client.kind_feed(RecordKind::Note).unwrap();
    notes_feed.open().await.unwrap();

    let before = h.client.cache().lock().await.snapshot();

    h.store.fail_next(StoreOp::UpsertPin).await;
    let err = h.client.toggle_pin("item_14", &global).await.unwrap_err();

    assert!(err.is_remote_write());
    assert_eq!(h.client.cache().lock().await.snapshot(), before);
    assert_eq!(h.notifier.last().unwrap().level, NoticeLevel::Error);
    assert_eq!(h.notifier.reported_errors().len(), 1);
}

#[tokio::test]
async fn test_failed_unpin_restores_exact_cache() {
    let records = notes(4);
    let global = PinContext::global();
    let pins = vec![pin_row(&records[0], &global, 0)];
    let h = Harness::new(seeded_store(records, pins).await);
    let mut feed = h.client.root_feed().unwrap();
    feed.open().await.unwrap();
    let before = h.client.cache().lock().await.snapshot();

    h.store.fail_next(StoreOp::DeletePin).await;
    assert!(h.client.toggle_pin("item_1", &global).await.is_err());

    assert_eq!(h.client.cache().lock().await.snapshot(), before);
    assert_eq!(h.store.pinned_refs(OWNER, &global).await.len(), 1);
}

#[tokio::test]
async fn test_toggle_of_uncached_item_is_refused() {
    let h = Harness::new(seeded_store(notes(3), vec![]).await);
    let err = h
        .client
        .toggle_pin("item_1", &PinContext::global())
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::NotCached(_)));
    assert_eq!(h.store.calls(StoreOp::UpsertPin).await, 0);
}

// =============================================================================
// Registry idempotence
// =============================================================================

#[tokio::test]
async fn test_repeated_pin_and_unpin_converge() {
    let store = seeded_store(notes(2), vec![]).await;
    let registry = PinRegistry::new(store.clone());
    let notes_ctx = PinContext::new("notes");

    registry.pin(OWNER, &notes_ctx, "item_1", RecordKind::Note).await.unwrap();
    registry.pin(OWNER, &notes_ctx, "item_1", RecordKind::Note).await.unwrap();
    assert_eq!(store.pinned_refs(OWNER, &notes_ctx).await.len(), 1);

    registry.unpin(OWNER, &notes_ctx, "item_1", RecordKind::Note).await.unwrap();
    registry.unpin(OWNER, &notes_ctx, "item_1", RecordKind::Note).await.unwrap();
    assert!(store.pinned_refs(OWNER, &notes_ctx).await.is_empty());

    registry.unpin(OWNER, &notes_ctx, "item_2", RecordKind::Note).await.unwrap();
    registry.pin(OWNER, &notes_ctx, "item_2", RecordKind::Note).await.unwrap();
    let pins = store.pinned_refs(OWNER, &notes_ctx).await;
    assert_eq!(pins.len(), 1);
    assert_eq!(pins[0].item_id, "item_2");
}

#[tokio::test]
async fn test_pins_are_scoped_per_context() {
    let store = seeded_store(notes(1), vec![]).await;
    let registry = PinRegistry::new(store.clone());

    registry
        .pin(OWNER, &PinContext::global(), "item_1", RecordKind::Note)
        .await
        .unwrap();
    registry
        .pin(OWNER, &PinContext::new("notes"), "item_1", RecordKind::Note)
        .await
        .unwrap();

    assert_eq!(store.pinned_refs(OWNER, &PinContext::global()).await.len(), 1);
    assert_eq!(store.pinned_refs(OWNER, &PinContext::new("notes")).await.len(), 1);
}
