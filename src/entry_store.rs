//! EntryStore: slot storage for key/value/column triples plus the primary
//! key index.
//!
//! Entries live in a `SlotMap`, which reuses freed slots through its own
//! free list and hands out generational `SlotKey`s. The primary index is a
//! `hashbrown::HashTable` of slot keys; each entry caches its key hash so
//! rehashing never calls back into `K: Hash`.
//!
//! Capacity is tracked explicitly. It only grows, and growth rebuilds the
//! primary index from scratch. Column indexes are rebuilt by the facade
//! right after a successful `set_capacity`.

use crate::error::CapacityError;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::HashTable;
use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Handle to one entry's storage slot.
    ///
    /// Valid until the entry is removed; a reused slot gets a fresh
    /// generation, so a stale `SlotKey` never resolves to a newer entry.
    pub struct SlotKey;
}

/// Read-only view of the slots handed to column index hooks.
pub type Slots<K, V, C> = SlotMap<SlotKey, Entry<K, V, C>>;

/// Sizing parameters for a new map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapConfig {
    /// Slots reserved up front.
    pub initial_capacity: usize,
    /// Slots added each time an insert finds the store full. Zero is
    /// treated as one.
    pub growth_increment: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            growth_increment: 16,
        }
    }
}

impl MapConfig {
    pub fn new(initial_capacity: usize, growth_increment: usize) -> Self {
        Self {
            initial_capacity,
            growth_increment,
        }
    }
}

#[derive(Debug)]
pub struct Entry<K, V, C> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) column: C,
    hash: u64,
}

impl<K, V, C> Entry<K, V, C> {
    pub fn key(&self) -> &K {
        &self.key
    }
    pub fn value(&self) -> &V {
        &self.value
    }
    pub fn column(&self) -> &C {
        &self.column
    }

    #[cfg(test)]
    pub(crate) fn for_test(key: K, value: V, column: C) -> Self {
        Entry {
            key,
            value,
            column,
            hash: 0,
        }
    }
}

pub(crate) struct EntryStore<K, V, C, S> {
    hasher: S,
    index: HashTable<SlotKey>,
    slots: Slots<K, V, C>,
    capacity: usize,
    growth_increment: usize,
}

impl<K, V, C, S> EntryStore<K, V, C, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub(crate) fn new(config: MapConfig, hasher: S) -> Self {
        let capacity = config.initial_capacity;
        Self {
            hasher,
            index: HashTable::with_capacity(capacity),
            slots: SlotMap::with_capacity_and_key(capacity),
            capacity,
            growth_increment: config.growth_increment.max(1),
        }
    }

    pub(crate) fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn slots(&self) -> &Slots<K, V, C> {
        &self.slots
    }

    pub(crate) fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// Capacity to grow to when an insert finds the store full.
    pub(crate) fn next_capacity(&self) -> Result<usize, CapacityError> {
        self.capacity
            .checked_add(self.growth_increment)
            .ok_or(CapacityError::Overflow {
                requested: usize::MAX,
            })
    }

    pub(crate) fn find<Q>(&self, q: &Q) -> Option<SlotKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.find_hashed(hash, q)
    }

    pub(crate) fn find_hashed<Q>(&self, hash: u64, q: &Q) -> Option<SlotKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.index
            .find(hash, |&k| {
                self.slots
                    .get(k)
                    .map(|e| e.key.borrow() == q)
                    .unwrap_or(false)
            })
            .copied()
    }

    /// Store a key known to be absent. The caller has already checked for
    /// duplicates and made room.
    pub(crate) fn insert_unique(&mut self, hash: u64, key: K, value: V, column: C) -> SlotKey {
        debug_assert!(!self.is_full(), "insert_unique called on a full store");
        let slot = self.slots.insert(Entry {
            key,
            value,
            column,
            hash,
        });
        let slots = &self.slots;
        self.index.insert_unique(hash, slot, |&k| slots[k].hash);
        slot
    }

    /// Unlink `slot` from the primary index and free it.
    pub(crate) fn remove(&mut self, slot: SlotKey) -> Option<Entry<K, V, C>> {
        let hash = self.slots.get(slot)?.hash;
        if let Ok(found) = self.index.find_entry(hash, |&k| k == slot) {
            found.remove();
        }
        self.slots.remove(slot)
    }

    pub(crate) fn get(&self, slot: SlotKey) -> Option<&Entry<K, V, C>> {
        self.slots.get(slot)
    }

    pub(crate) fn get_mut(&mut self, slot: SlotKey) -> Option<&mut Entry<K, V, C>> {
        self.slots.get_mut(slot)
    }

    /// Reject capacities a `SlotKey` cannot address.
    pub(crate) fn check_capacity(&self, capacity: usize) -> Result<(), CapacityError> {
        // SlotKey indices are u32; slot 0 of a SlotMap is a sentinel.
        if capacity >= u32::MAX as usize {
            return Err(CapacityError::Overflow {
                requested: capacity,
            });
        }
        Ok(())
    }

    /// Allocate slot storage for `capacity` entries without changing the
    /// logical capacity.
    pub(crate) fn reserve_slots(&mut self, capacity: usize) -> Result<(), CapacityError> {
        self.slots
            .try_reserve(capacity.saturating_sub(self.slots.len()))
            .map_err(|_| CapacityError::AllocFailed {
                requested: capacity,
            })
    }

    /// Grow to `capacity` slots and rehash the primary index. Returns
    /// `Ok(false)` without touching anything when `capacity` is not larger
    /// than the current one. On error the logical capacity and both indexes
    /// are unchanged.
    pub(crate) fn set_capacity(&mut self, capacity: usize) -> Result<bool, CapacityError> {
        if capacity <= self.capacity {
            return Ok(false);
        }
        self.check_capacity(capacity)?;
        self.reserve_slots(capacity)?;

        let slots = &self.slots;
        let rehash = |&k: &SlotKey| slots[k].hash;
        let mut fresh: HashTable<SlotKey> = HashTable::new();
        fresh
            .try_reserve(capacity, rehash)
            .map_err(|e| CapacityError::from_reserve(e, capacity))?;
        for (k, e) in slots.iter() {
            fresh.insert_unique(e.hash, k, rehash);
        }

        self.index = fresh;
        self.capacity = capacity;
        Ok(true)
    }

    /// Drop every entry; capacity is kept.
    pub(crate) fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (SlotKey, &Entry<K, V, C>)> {
        self.slots.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (SlotKey, &mut Entry<K, V, C>)> {
        self.slots.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::RandomState;

    fn store(initial: usize, growth: usize) -> EntryStore<String, i32, u8, RandomState> {
        EntryStore::new(MapConfig::new(initial, growth), RandomState::new())
    }

    fn put(s: &mut EntryStore<String, i32, u8, RandomState>, k: &str, v: i32, c: u8) -> SlotKey {
        if s.is_full() {
            let next = s.next_capacity().unwrap();
            s.set_capacity(next).unwrap();
        }
        let hash = s.make_hash(k);
        assert!(s.find_hashed(hash, k).is_none());
        s.insert_unique(hash, k.to_string(), v, c)
    }

    /// Invariant: every stored key resolves to the slot it was stored in,
    /// and borrowed lookup with `&str` works.
    #[test]
    fn find_resolves_inserted_slots() {
        let mut s = store(4, 4);
        let a = put(&mut s, "a", 1, 0);
        let b = put(&mut s, "b", 2, 1);
        assert_eq!(s.find("a"), Some(a));
        assert_eq!(s.find("b"), Some(b));
        assert_eq!(s.find("c"), None);
        assert_eq!(s.get(b).map(|e| (e.value, e.column)), Some((2, 1)));
    }

    /// Invariant: a removed slot no longer resolves, by key or by slot, and a
    /// reused slot does not alias the stale key.
    #[test]
    fn removed_slot_is_unreachable_and_not_aliased() {
        let mut s = store(2, 2);
        let a = put(&mut s, "a", 1, 0);
        let e = s.remove(a).expect("present");
        assert_eq!(e.key, "a");
        assert!(s.find("a").is_none());
        assert!(s.get(a).is_none());
        assert!(s.remove(a).is_none());

        let b = put(&mut s, "b", 2, 0);
        assert_ne!(a, b);
        assert!(s.get(a).is_none());
        assert_eq!(s.len(), 1);
    }

    /// Invariant: capacity grows by the configured increment, never shrinks,
    /// and every key stays reachable after the primary index is rebuilt.
    #[test]
    fn growth_follows_increment_and_keeps_keys() {
        let mut s = store(2, 3);
        for i in 0..10 {
            put(&mut s, &format!("k{i}"), i, 0);
        }
        assert_eq!(s.capacity(), 11);
        for i in 0..10 {
            let slot = s.find(format!("k{i}").as_str()).expect("present");
            assert_eq!(s.get(slot).unwrap().value, i);
        }
        assert_eq!(s.set_capacity(5), Ok(false));
        assert_eq!(s.capacity(), 11);
    }

    /// Invariant: a zero growth increment still makes progress.
    #[test]
    fn zero_increment_is_clamped() {
        let mut s = store(0, 0);
        put(&mut s, "a", 1, 0);
        put(&mut s, "b", 2, 0);
        assert_eq!(s.capacity(), 2);
    }

    /// Invariant: oversized requests are rejected and leave the store as it was.
    #[test]
    fn oversized_capacity_is_rejected() {
        let mut s = store(4, 4);
        put(&mut s, "a", 1, 0);
        let err = s.set_capacity(usize::MAX).unwrap_err();
        assert_eq!(err, CapacityError::Overflow { requested: usize::MAX });
        assert_eq!(s.capacity(), 4);
        assert!(s.find("a").is_some());
    }

    /// Invariant: when slot storage cannot be allocated the error is
    /// returned and the store keeps its capacity and contents.
    #[test]
    fn slot_allocation_failure_is_reported() {
        let mut s: EntryStore<u32, [u8; 4096], u8, RandomState> =
            EntryStore::new(MapConfig::new(4, 4), RandomState::new());
        let hash = s.make_hash(&7u32);
        s.insert_unique(hash, 7, [1; 4096], 0);

        let err = s.set_capacity(100_000_000).unwrap_err();
        assert_eq!(err, CapacityError::AllocFailed { requested: 100_000_000 });
        assert_eq!(s.capacity(), 4);
        assert_eq!(s.find(&7).and_then(|k| s.get(k)).map(|e| e.value[0]), Some(1));
    }

    /// Invariant: clear drops all entries but keeps the capacity.
    #[test]
    fn clear_keeps_capacity() {
        let mut s = store(8, 8);
        put(&mut s, "a", 1, 0);
        put(&mut s, "b", 2, 0);
        s.clear();
        assert_eq!(s.len(), 0);
        assert_eq!(s.capacity(), 8);
        assert!(s.find("a").is_none());
        put(&mut s, "a", 3, 0);
        assert_eq!(s.get(s.find("a").unwrap()).unwrap().value, 3);
    }
}
