//! ColumnHashMap: the public facade composing the entry store with one
//! column index strategy.
//!
//! Every mutation touches the store and the index in a fixed order so that
//! neither ever refers to a slot the other does not know about:
//!
//! - insert: duplicate check, then growth (store rehash + index rebuild),
//!   then store insert, then `on_insert`.
//! - remove: `on_remove` while the slot is still live, then free the slot.
//! - replace: write the new column into the slot, then `on_replace`.

use crate::column::{ColumnIndex, Cursor};
use crate::entry_store::{EntryStore, MapConfig, SlotKey};
use crate::error::{CapacityError, InsertError, ReplaceError};
use crate::multi_hash_column::MultiHashColumn;
use crate::ordered_list_column::OrderedListColumn;
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

pub struct ColumnHashMap<K, V, C, I = MultiHashColumn<C>, S = RandomState> {
    store: EntryStore<K, V, C, S>,
    column: I,
    reentrancy: DebugReentrancy,
}

/// Map whose column is indexed by `MultiHashColumn`.
pub type MultiHashColumnMap<K, V, C, S = RandomState> =
    ColumnHashMap<K, V, C, MultiHashColumn<C>, S>;

/// Map whose column is indexed by `OrderedListColumn`.
pub type OrderedColumnMap<K, V, C, S = RandomState> =
    ColumnHashMap<K, V, C, OrderedListColumn<C>, S>;

impl<K, V, C, I> ColumnHashMap<K, V, C, I>
where
    K: Eq + Hash,
    I: ColumnIndex<C> + Default,
{
    pub fn new() -> Self {
        Self::with_config(MapConfig::default())
    }

    pub fn with_config(config: MapConfig) -> Self {
        Self::with_column(config, RandomState::new(), I::default())
    }

    /// Shorthand for `with_config(MapConfig::new(initial, growth))`.
    pub fn with_capacity(initial_capacity: usize, growth_increment: usize) -> Self {
        Self::with_config(MapConfig::new(initial_capacity, growth_increment))
    }
}

impl<K, V, C, I> Default for ColumnHashMap<K, V, C, I>
where
    K: Eq + Hash,
    I: ColumnIndex<C> + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C, I, S> ColumnHashMap<K, V, C, I, S>
where
    K: Eq + Hash,
    I: ColumnIndex<C>,
    S: BuildHasher,
{
    pub fn with_hasher(config: MapConfig, hasher: S) -> Self
    where
        I: Default,
    {
        Self::with_column(config, hasher, I::default())
    }

    /// Build a map around an explicitly constructed column index, e.g. a
    /// `MultiHashColumn` with its own hasher.
    pub fn with_column(config: MapConfig, hasher: S, mut column: I) -> Self {
        let store = EntryStore::new(config, hasher);
        column.on_rebuild(store.slots(), store.capacity());
        Self {
            store,
            column,
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Grow storage to at least `capacity` slots and rebuild both indexes.
    /// Requests at or below the current capacity are ignored.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<(), CapacityError> {
        let _g = self.reentrancy.enter("set_capacity");
        grow(&mut self.store, &mut self.column, capacity)
    }

    /// Make room for `additional` more entries without further growth.
    pub fn reserve(&mut self, additional: usize) -> Result<(), CapacityError> {
        let _g = self.reentrancy.enter("reserve");
        let wanted = self
            .store
            .len()
            .checked_add(additional)
            .ok_or(CapacityError::Overflow {
                requested: usize::MAX,
            })?;
        grow(&mut self.store, &mut self.column, wanted)
    }

    /// Insert a new entry. Fails without side effects if `key` is present or
    /// the store cannot grow.
    pub fn insert(&mut self, key: K, value: V, column: C) -> Result<SlotKey, InsertError> {
        let _g = self.reentrancy.enter("insert");
        let hash = self.store.make_hash(&key);
        if self.store.find_hashed(hash, &key).is_some() {
            return Err(InsertError::DuplicateKey);
        }
        if self.store.is_full() {
            let next = self.store.next_capacity()?;
            grow(&mut self.store, &mut self.column, next)?;
        }
        let slot = self.store.insert_unique(hash, key, value, column);
        self.column.on_insert(self.store.slots(), slot);
        Ok(slot)
    }

    /// Remove `key`, returning its key, value and column.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<(K, V, C)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("remove");
        let slot = self.store.find(key)?;
        self.column.on_remove(self.store.slots(), slot);
        self.store.remove(slot).map(|e| (e.key, e.value, e.column))
    }

    pub fn get<Q>(&self, key: &Q) -> Option<(&V, &C)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get");
        let slot = self.store.find(key)?;
        self.store.get(slot).map(|e| (&e.value, &e.column))
    }

    /// Mutable access to the value; the column stays fixed.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get_mut");
        let slot = self.store.find(key)?;
        self.store.get_mut(slot).map(|e| &mut e.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("contains_key");
        self.store.find(key).is_some()
    }

    /// Slot currently holding `key`.
    pub fn find<Q>(&self, key: &Q) -> Option<SlotKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("find");
        self.store.find(key)
    }

    /// Re-index `key` under `column` and hand back its value for in-place
    /// mutation. The value itself never moves.
    pub fn replace<Q>(&mut self, key: &Q, column: C) -> Result<&mut V, ReplaceError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("replace");
        let slot = self.store.find(key).ok_or(ReplaceError::MissingKey)?;
        let entry = self.store.get_mut(slot).ok_or(ReplaceError::MissingKey)?;
        let old = core::mem::replace(&mut entry.column, column);
        self.column.on_replace(self.store.slots(), slot, &old);
        self.store
            .get_mut(slot)
            .map(|e| &mut e.value)
            .ok_or(ReplaceError::MissingKey)
    }

    /// Resolve a slot handed out by `insert`, `find` or a cursor.
    pub fn entry_at(&self, slot: SlotKey) -> Option<(&K, &V, &C)> {
        self.store
            .get(slot)
            .map(|e| (&e.key, &e.value, &e.column))
    }

    /// Drop every entry, keeping the allocated capacity.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter("clear");
        self.column.clear();
        self.store.clear();
    }

    /// All entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V, &C)> {
        self.store
            .iter()
            .map(|(_, e)| (&e.key, &e.value, &e.column))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut V, &C)> {
        self.store
            .iter_mut()
            .map(|(_, e)| (&e.key, &mut e.value, &e.column))
    }

    /// The active column index.
    pub fn column_index(&self) -> &I {
        &self.column
    }
}

/// Grow the store and rebuild the column index against the new layout.
///
/// Every allocation happens before anything is committed: slot storage
/// first, then the column index, then the primary index inside
/// `set_capacity`.
fn grow<K, V, C, I, S>(
    store: &mut EntryStore<K, V, C, S>,
    column: &mut I,
    capacity: usize,
) -> Result<(), CapacityError>
where
    K: Eq + Hash,
    I: ColumnIndex<C>,
    S: BuildHasher,
{
    let from = store.capacity();
    if capacity <= from {
        return Ok(());
    }
    let grown = store
        .check_capacity(capacity)
        .and_then(|()| store.reserve_slots(capacity))
        .and_then(|()| column.try_reserve(capacity))
        .and_then(|()| store.set_capacity(capacity));
    match grown {
        Ok(true) => {
            tracing::debug!(from, to = capacity, len = store.len(), "grew column map storage");
            column.on_rebuild(store.slots(), store.capacity());
            Ok(())
        }
        Ok(false) => Ok(()),
        Err(err) => {
            tracing::warn!(from, requested = capacity, %err, "column map growth failed");
            Err(err)
        }
    }
}

impl<K, V, C, H, S> ColumnHashMap<K, V, C, MultiHashColumn<C, H>, S>
where
    K: Eq + Hash,
    C: Hash + Eq,
    H: BuildHasher,
    S: BuildHasher,
{
    /// Cursor at the first entry whose column equals `column`.
    pub fn first_by_column(&self, column: &C) -> Option<Cursor> {
        let _g = self.reentrancy.enter("first_by_column");
        self.column.first(self.store.slots(), column).map(Cursor::new)
    }

    /// Advance to the next entry sharing the cursor's column value. Returns
    /// false, leaving the cursor unchanged, once that value is exhausted.
    pub fn next_by_column(&self, cursor: &mut Cursor) -> bool {
        let _g = self.reentrancy.enter("next_by_column");
        match self.column.next(self.store.slots(), cursor.slot) {
            Some(slot) => {
                cursor.slot = slot;
                true
            }
            None => false,
        }
    }

    /// Entries whose column equals `column`, in no particular order.
    pub fn get_by_column<'a>(&'a self, column: &C) -> ColumnIter<'a, K, V, C, H, S> {
        ColumnIter {
            map: self,
            cursor: self.first_by_column(column),
        }
    }

    pub fn count_by_column(&self, column: &C) -> usize {
        self.get_by_column(column).count()
    }
}

pub struct ColumnIter<'a, K, V, C, H, S> {
    map: &'a ColumnHashMap<K, V, C, MultiHashColumn<C, H>, S>,
    cursor: Option<Cursor>,
}

impl<'a, K, V, C, H, S> Iterator for ColumnIter<'a, K, V, C, H, S>
where
    K: Eq + Hash,
    C: Hash + Eq,
    H: BuildHasher,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let mut cursor = self.cursor?;
        let (k, v, _) = self.map.entry_at(cursor.slot)?;
        self.cursor = if self.map.next_by_column(&mut cursor) {
            Some(cursor)
        } else {
            None
        };
        Some((k, v))
    }
}

impl<K, V, C, S> ColumnHashMap<K, V, C, OrderedListColumn<C>, S>
where
    K: Eq + Hash,
    C: Ord,
    S: BuildHasher,
{
    /// Cursor at the smallest column value, along with that value.
    pub fn first_ordered(&self) -> Option<(Cursor, &C)> {
        let slot = self.column.first()?;
        let column = self.column_at(slot)?;
        Some((Cursor::new(slot), column))
    }

    /// Advance to the next entry in column order, returning its column.
    /// Returns None, leaving the cursor unchanged, at the end of the list.
    pub fn next_ordered(&self, cursor: &mut Cursor) -> Option<&C> {
        let slot = self.column.next(cursor.slot)?;
        cursor.slot = slot;
        self.column_at(slot)
    }

    pub fn first_slot(&self) -> Option<SlotKey> {
        self.column.first()
    }

    pub fn last_slot(&self) -> Option<SlotKey> {
        self.column.last()
    }

    pub fn next_slot(&self, slot: SlotKey) -> Option<SlotKey> {
        self.column.next(slot)
    }

    pub fn column_at(&self, slot: SlotKey) -> Option<&C> {
        self.store.get(slot).map(|e| &e.column)
    }

    /// All entries in ascending column order.
    pub fn iter_ordered(&self) -> OrderedIter<'_, K, V, C, S> {
        OrderedIter {
            map: self,
            next: self.column.first(),
        }
    }
}

pub struct OrderedIter<'a, K, V, C, S> {
    map: &'a ColumnHashMap<K, V, C, OrderedListColumn<C>, S>,
    next: Option<SlotKey>,
}

impl<'a, K, V, C, S> Iterator for OrderedIter<'a, K, V, C, S>
where
    K: Eq + Hash,
    C: Ord,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V, &'a C);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.next?;
        self.next = self.map.next_slot(slot);
        self.map.entry_at(slot)
    }
}

impl<K, V, C, I, S> core::fmt::Debug for ColumnHashMap<K, V, C, I, S>
where
    K: core::fmt::Debug + Eq + Hash,
    V: core::fmt::Debug,
    C: core::fmt::Debug,
    I: ColumnIndex<C>,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(k, v, c)| (k, (v, c))))
            .finish()
    }
}
