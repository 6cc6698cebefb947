//! column-hashmap: a single-threaded hash map whose entries carry one extra
//! "column" value, indexed by a pluggable secondary strategy.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a primary key -> value map where every entry also carries a column
//!   value that can be queried independently, with the secondary index kept
//!   exactly in step with the primary storage across insert, remove,
//!   re-index and growth.
//! - Layers:
//!   - EntryStore<K, V, C, S>: slot storage (`SlotMap`) plus a primary
//!     `hashbrown::HashTable` of slot keys. Owns explicit capacity and the
//!     growth increment.
//!   - ColumnIndex<C>: hook trait the facade drives on every mutation.
//!     Two strategies ship:
//!     - MultiHashColumn: bucketed chains; find every entry with a given
//!       column value.
//!     - OrderedListColumn: one list sorted by column value; ordered scans.
//!   - ColumnHashMap<K, V, C, I, S>: public facade; the only place store and
//!     index are mutated, in a fixed order.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` (no locking).
//! - Unique keys; duplicate inserts fail without side effects.
//! - Column values need not be unique.
//! - Capacity only grows. Growth is a full pass: the primary index is
//!   rehashed and the column index rebuilt before the triggering insert is
//!   applied.
//! - Every public mutation either fully succeeds or leaves the map as it
//!   was.
//!
//! Slot keys
//! - `SlotKey`s are generational. A key stays valid until its entry is
//!   removed; a reused slot never resolves through a stale key. Cursors wrap
//!   slot keys and are valid only until the next structural mutation.
//!
//! Hasher invariants
//! - Each entry caches its key hash; rehashing never calls `K: Hash`.
//! - MultiHashColumn caches each slot's column hash; unlinking never calls
//!   `C: Hash`.
//!
//! Reentrancy
//! - A debug-only guard at each facade entry point panics if user
//!   `Hash`/`Eq`/`Ord` code calls back into the same map.
//!
//! Notes and non-goals
//! - No serialization, no concurrent mutation, one column per entry.

mod column;
mod column_hash_map;
mod column_hash_map_proptest;
mod entry_store;
pub mod error;
mod multi_hash_column;
mod ordered_list_column;
mod reentrancy;

// Public surface
pub use column::{ColumnIndex, Cursor};
pub use column_hash_map::{
    ColumnHashMap, ColumnIter, MultiHashColumnMap, OrderedColumnMap, OrderedIter,
};
pub use entry_store::{Entry, MapConfig, SlotKey, Slots};
pub use error::{CapacityError, InsertError, ReplaceError};
pub use multi_hash_column::MultiHashColumn;
pub use ordered_list_column::OrderedListColumn;
