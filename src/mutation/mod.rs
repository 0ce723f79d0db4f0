//! Optimistic mutations with snapshot rollback

mod command;
mod coordinator;

pub use command::{CacheCommand, RemoveItem, SetPinState};
pub use coordinator::{MutationCoordinator, MutationOutcome, PinOutcome};
