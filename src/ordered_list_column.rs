//! OrderedListColumn: every live slot threaded onto one list sorted by
//! column value, ascending.
//!
//! Links are doubly linked and stored in a `SecondaryMap` parallel to the
//! entry store, so unlinking is O(1). Insertion scans from the head for the
//! first node not less than the new value and splices in front of it; a
//! value not less than the tail's is appended directly.

use crate::column::ColumnIndex;
use crate::entry_store::{SlotKey, Slots};
use core::marker::PhantomData;
use slotmap::SecondaryMap;

#[derive(Copy, Clone, Debug, Default)]
struct ListLink {
    prev: Option<SlotKey>,
    next: Option<SlotKey>,
}

pub struct OrderedListColumn<C> {
    head: Option<SlotKey>,
    tail: Option<SlotKey>,
    links: SecondaryMap<SlotKey, ListLink>,
    _pd: PhantomData<fn(&C)>,
}

impl<C> Default for OrderedListColumn<C> {
    fn default() -> Self {
        Self {
            head: None,
            tail: None,
            links: SecondaryMap::new(),
            _pd: PhantomData,
        }
    }
}

impl<C> core::fmt::Debug for OrderedListColumn<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OrderedListColumn")
            .field("head", &self.head)
            .field("tail", &self.tail)
            .field("indexed", &self.links.len())
            .finish()
    }
}

impl<C> OrderedListColumn<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first(&self) -> Option<SlotKey> {
        self.head
    }

    pub fn last(&self) -> Option<SlotKey> {
        self.tail
    }

    pub fn next(&self, slot: SlotKey) -> Option<SlotKey> {
        self.links.get(slot)?.next
    }

    pub fn prev(&self, slot: SlotKey) -> Option<SlotKey> {
        self.links.get(slot)?.prev
    }

    /// Link `slot` immediately before `at`, or at the tail when `at` is None.
    fn splice_before(&mut self, slot: SlotKey, at: Option<SlotKey>) {
        let prev = match at {
            Some(a) => self.links[a].prev,
            None => self.tail,
        };
        self.links.insert(slot, ListLink { prev, next: at });
        match prev {
            Some(p) => self.links[p].next = Some(slot),
            None => self.head = Some(slot),
        }
        match at {
            Some(a) => self.links[a].prev = Some(slot),
            None => self.tail = Some(slot),
        }
    }

    fn unlink(&mut self, slot: SlotKey) -> bool {
        let Some(link) = self.links.remove(slot) else {
            return false;
        };
        match link.prev {
            Some(p) => self.links[p].next = link.next,
            None => self.head = link.next,
        }
        match link.next {
            Some(n) => self.links[n].prev = link.prev,
            None => self.tail = link.prev,
        }
        true
    }
}

impl<C: Ord> ColumnIndex<C> for OrderedListColumn<C> {
    fn on_insert<K, V>(&mut self, slots: &Slots<K, V, C>, slot: SlotKey) {
        let value = &slots[slot].column;
        if self.tail.is_some_and(|t| slots[t].column < *value) {
            self.splice_before(slot, None);
            return;
        }
        let mut at = self.head;
        while let Some(a) = at {
            if slots[a].column >= *value {
                break;
            }
            at = self.links[a].next;
        }
        self.splice_before(slot, at);
    }

    fn on_remove<K, V>(&mut self, _slots: &Slots<K, V, C>, slot: SlotKey) {
        self.unlink(slot);
    }

    fn on_replace<K, V>(&mut self, slots: &Slots<K, V, C>, slot: SlotKey, old: &C) {
        let value = &slots[slot].column;
        if value == old {
            return;
        }
        let Some(link) = self.links.get(slot).copied() else {
            return;
        };
        let after_prev = link.prev.map_or(true, |p| slots[p].column <= *value);
        let before_next = link.next.map_or(true, |n| *value <= slots[n].column);
        if after_prev && before_next {
            return;
        }
        self.unlink(slot);
        self.on_insert(slots, slot);
    }

    fn on_rebuild<K, V>(&mut self, slots: &Slots<K, V, C>, _capacity: usize) {
        let mut order: Vec<SlotKey> = slots.keys().collect();
        order.sort_by(|a, b| slots[*a].column.cmp(&slots[*b].column));

        self.links.clear();
        self.head = order.first().copied();
        self.tail = order.last().copied();
        for (i, &slot) in order.iter().enumerate() {
            let prev = i.checked_sub(1).map(|p| order[p]);
            let next = order.get(i + 1).copied();
            self.links.insert(slot, ListLink { prev, next });
        }
        tracing::trace!(indexed = order.len(), "rebuilt ordered column");
    }

    fn clear(&mut self) {
        self.head = None;
        self.tail = None;
        self.links.clear();
    }

    fn len(&self) -> usize {
        self.links.len()
    }
}
