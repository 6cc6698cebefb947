//! MultiHashColumn: hashed secondary index allowing many entries per column
//! value.
//!
//! Buckets hold the head slot of a singly-linked chain; the per-slot `next`
//! links live in a `SecondaryMap` parallel to the entry store, together with
//! the cached column hash. A chain holds every slot whose column hashes to
//! that bucket, so lookups filter on hash and equality to keep distinct
//! column values apart.
//!
//! The bucket count is a power of two derived from the store capacity and is
//! recomputed by `on_rebuild` whenever the store grows.

use crate::column::ColumnIndex;
use crate::entry_store::{SlotKey, Slots};
use crate::error::CapacityError;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use slotmap::SecondaryMap;
use std::collections::hash_map::RandomState;

#[derive(Copy, Clone, Debug)]
struct HashLink {
    next: Option<SlotKey>,
    hash: u64,
}

pub struct MultiHashColumn<C, S = RandomState> {
    hasher: S,
    buckets: Vec<Option<SlotKey>>,
    links: SecondaryMap<SlotKey, HashLink>,
    _pd: PhantomData<fn(&C)>,
}

impl<C, S: Default> Default for MultiHashColumn<C, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<C> MultiHashColumn<C> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C, S> core::fmt::Debug for MultiHashColumn<C, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MultiHashColumn")
            .field("buckets", &self.buckets.len())
            .field("indexed", &self.links.len())
            .finish()
    }
}

impl<C, S> MultiHashColumn<C, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            buckets: vec![None; 1],
            links: SecondaryMap::new(),
            _pd: PhantomData,
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn buckets_for(capacity: usize) -> Result<usize, CapacityError> {
        capacity
            .max(1)
            .checked_next_power_of_two()
            .ok_or(CapacityError::Overflow {
                requested: capacity,
            })
    }

    #[inline]
    fn bucket_of(&self, hash: u64) -> usize {
        (hash as usize) & (self.buckets.len() - 1)
    }
}

impl<C, S> MultiHashColumn<C, S>
where
    C: Hash + Eq,
    S: BuildHasher,
{
    fn link(&mut self, slot: SlotKey, hash: u64) {
        let b = self.bucket_of(hash);
        self.links.insert(
            slot,
            HashLink {
                next: self.buckets[b],
                hash,
            },
        );
        self.buckets[b] = Some(slot);
    }

    /// Walk the chain starting at `from`, returning the first slot whose
    /// column equals `column`.
    fn scan<K, V>(
        &self,
        slots: &Slots<K, V, C>,
        mut from: Option<SlotKey>,
        hash: u64,
        column: &C,
    ) -> Option<SlotKey> {
        while let Some(s) = from {
            let link = self.links[s];
            if link.hash == hash && slots.get(s).is_some_and(|e| e.column == *column) {
                return Some(s);
            }
            from = link.next;
        }
        None
    }

    /// First slot carrying `column`, if any.
    pub fn first<K, V>(&self, slots: &Slots<K, V, C>, column: &C) -> Option<SlotKey> {
        let hash = self.hasher.hash_one(column);
        self.scan(slots, self.buckets[self.bucket_of(hash)], hash, column)
    }

    /// Next slot after `slot` carrying the same column value as `slot`.
    pub fn next<K, V>(&self, slots: &Slots<K, V, C>, slot: SlotKey) -> Option<SlotKey> {
        let link = self.links.get(slot)?;
        let column = &slots.get(slot)?.column;
        self.scan(slots, link.next, link.hash, column)
    }
}

impl<C, S> ColumnIndex<C> for MultiHashColumn<C, S>
where
    C: Hash + Eq,
    S: BuildHasher,
{
    fn on_insert<K, V>(&mut self, slots: &Slots<K, V, C>, slot: SlotKey) {
        let hash = self.hasher.hash_one(&slots[slot].column);
        self.link(slot, hash);
    }

    fn on_remove<K, V>(&mut self, _slots: &Slots<K, V, C>, slot: SlotKey) {
        let Some(removed) = self.links.remove(slot) else {
            return;
        };
        let b = self.bucket_of(removed.hash);
        if self.buckets[b] == Some(slot) {
            self.buckets[b] = removed.next;
            return;
        }
        // Interior or tail member: find the predecessor and bridge over.
        let mut cur = self.buckets[b];
        while let Some(c) = cur {
            let next = self.links[c].next;
            if next == Some(slot) {
                self.links[c].next = removed.next;
                return;
            }
            cur = next;
        }
        debug_assert!(false, "slot was linked but not found in its bucket chain");
    }

    fn on_replace<K, V>(&mut self, slots: &Slots<K, V, C>, slot: SlotKey, old: &C) {
        if slots[slot].column == *old {
            return;
        }
        self.on_remove(slots, slot);
        self.on_insert(slots, slot);
    }

    fn try_reserve(&mut self, capacity: usize) -> Result<(), CapacityError> {
        let count = Self::buckets_for(capacity)?;
        self.buckets
            .try_reserve(count.saturating_sub(self.buckets.len()))
            .map_err(|_| CapacityError::AllocFailed {
                requested: capacity,
            })
    }

    fn on_rebuild<K, V>(&mut self, slots: &Slots<K, V, C>, capacity: usize) {
        let count = Self::buckets_for(capacity).unwrap_or(self.buckets.len());
        self.buckets.clear();
        self.buckets.resize(count, None);
        self.links.clear();
        for (slot, entry) in slots.iter() {
            let hash = self.hasher.hash_one(&entry.column);
            self.link(slot, hash);
        }
        tracing::trace!(buckets = count, indexed = self.links.len(), "rebuilt hash column");
    }

    fn clear(&mut self) {
        self.buckets.fill(None);
        self.links.clear();
    }

    fn len(&self) -> usize {
        self.links.len()
    }
}
