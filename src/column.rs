//! The column index capability shared by both strategies.
//!
//! The facade owns the entry store and exactly one `ColumnIndex`. Every
//! structural mutation of the store is mirrored into the index through these
//! hooks, always with the store in a state where `slots` already reflects the
//! change the hook describes:
//!
//! - `on_insert`: `slot` is live and carries its column value.
//! - `on_remove`: `slot` is still live; the store frees it afterwards.
//! - `on_replace`: `slot` already carries the new column; `old` is the
//!   previous one.
//! - `try_reserve`: the store is about to grow to `capacity`; allocate
//!   whatever `on_rebuild` will need. Failing here aborts the growth.
//! - `on_rebuild`: the store has just grown to `capacity`; discard all
//!   internal structure and index every live slot again.
//!
//! Dispatch is static: the facade is generic over the strategy.

use crate::entry_store::{SlotKey, Slots};
use crate::error::CapacityError;

pub trait ColumnIndex<C> {
    fn on_insert<K, V>(&mut self, slots: &Slots<K, V, C>, slot: SlotKey);
    fn on_remove<K, V>(&mut self, slots: &Slots<K, V, C>, slot: SlotKey);
    fn on_replace<K, V>(&mut self, slots: &Slots<K, V, C>, slot: SlotKey, old: &C);
    fn try_reserve(&mut self, _capacity: usize) -> Result<(), CapacityError> {
        Ok(())
    }
    fn on_rebuild<K, V>(&mut self, slots: &Slots<K, V, C>, capacity: usize);
    /// Forget every indexed slot; the store is being cleared.
    fn clear(&mut self);
    /// Number of slots currently threaded through the index.
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Position inside a column index traversal.
///
/// A cursor is only meaningful for the map that produced it and only until
/// the next structural mutation (insert, remove, replace, resize, clear).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Cursor {
    pub(crate) slot: SlotKey,
}

impl Cursor {
    pub(crate) fn new(slot: SlotKey) -> Self {
        Cursor { slot }
    }

    /// Slot the cursor currently points at; resolve it with `entry_at`.
    pub fn slot(&self) -> SlotKey {
        self.slot
    }
}
