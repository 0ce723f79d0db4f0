//! Page merge

use std::collections::HashSet;

use crate::model::{FeedItem, Page, PageEntry};

/// Merge the pinned group and one regular slice into a page.
///
/// Pinned items keep their pinned order and come first. Regular items follow
/// in fetched order, minus any id already on the page. The cursor advances
/// only when the regular slice came back full and a next index exists.
pub fn merge_page(pinned: Vec<FeedItem>, regular: Vec<FeedItem>, page_index: u32, limit: usize) -> Page {
    let full = regular.len() == limit;
    let mut seen: HashSet<String> = HashSet::with_capacity(pinned.len() + regular.len());
    let mut items = Vec::with_capacity(pinned.len() + regular.len());

    for item in pinned {
        if seen.insert(item.id.clone()) {
            items.push(PageEntry::pinned(item));
        }
    }
    for item in regular {
        if seen.insert(item.id.clone()) {
            items.push(PageEntry::regular(item));
        }
    }

    Page {
        items,
        next_cursor: if full { page_index.checked_add(1) } else { None },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExtraFields, FeedContext};
    use chrono::{Duration, TimeZone, Utc};

    fn item(id: &str, minutes: i64) -> FeedItem {
        let base = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        FeedItem {
            id: id.into(),
            owner: "o".into(),
            source_id: id.into(),
            title: id.into(),
            occurred_at: base + Duration::minutes(minutes),
            created_at: base,
            updated_at: None,
            extra: ExtraFields::Activity {
                activity_type: "run".into(),
                duration_seconds: None,
                distance_meters: None,
                calories: None,
            },
        }
    }

    #[test]
    fn test_pinned_first_and_deduplicated() {
        let pinned = vec![item("p2", 1), item("r3", 2)];
        let regular: Vec<_> = (0..10).map(|i| item(&format!("r{}", i), 100 - i)).collect();

        let page = merge_page(pinned, regular, 0, 10);
        assert_eq!(page.len(), 11);
        assert_eq!(page.pinned_count(), 2);
        assert_eq!(page.items[0].item.id, "p2");
        assert_eq!(page.items[1].item.id, "r3");
        assert_eq!(page.items[1].feed_context, FeedContext::Pinned);
        assert_eq!(page.ids().filter(|id| *id == "r3").count(), 1);
        assert_eq!(page.next_cursor, Some(1));
    }

    #[test]
    fn test_short_slice_ends_pagination() {
        let page = merge_page(vec![], vec![item("a", 1), item("b", 0)], 3, 5);
        assert_eq!(page.next_cursor, None);
        assert!(page.items.iter().all(|e| e.feed_context == FeedContext::Feed));
    }

    #[test]
    fn test_last_representable_page_has_no_cursor() {
        let page = merge_page(vec![], vec![item("a", 1)], u32::MAX, 1);
        assert_eq!(page.len(), 1);
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn test_cursor_counts_duplicates_in_full_slice() {
        // a full slice advances even when dedup shortened the page
        let page = merge_page(vec![item("a", 1)], vec![item("a", 1), item("b", 0)], 0, 2);
        assert_eq!(page.len(), 2);
        assert_eq!(page.next_cursor, Some(1));
    }
}
