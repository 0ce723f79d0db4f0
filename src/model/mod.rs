//! Timeline data model
//!
//! Feed items from every record kind, pin registry rows, and the merged
//! pages the fetcher produces.

mod item;
mod page;
mod pin;

pub use item::{ExtraFields, FeedContext, FeedItem, GymExercise, RecordKind, TodoTask};
pub use page::{Page, PageEntry};
pub use pin::{PinAction, PinContext, PinKey, PinState, PinnedRef, DEFAULT_PIN_CAPACITY};
