//! Cart store: the single source of truth for pending selections.
//!
//! Entries are keyed by item id and keep insertion order. Adding an item
//! that is already present increments its quantity; quantities never drop
//! to zero in place, the entry is removed instead.

mod store;

pub use store::{CartEntry, CartStore};

pub(crate) use store::total_of;
