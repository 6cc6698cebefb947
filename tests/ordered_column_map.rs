// OrderedColumnMap integration tests.
//
// Invariants exercised:
// - Global order: a full walk yields every live entry once, columns
//   non-decreasing, with signed comparison.
// - Duplicates: equal column values are adjacent.
// - Head/tail/interior removal and cross-list replace keep the order.
// - The cursor API, the slot API and `iter_ordered` agree.
// - Growth rebuilds the list without changing the walk.
use column_hashmap::{ColumnHashMap, OrderedColumnMap, ReplaceError};

fn walk(m: &OrderedColumnMap<i32, f32, i32>) -> Vec<i32> {
    let mut out = Vec::new();
    if let Some((mut cur, c)) = m.first_ordered() {
        out.push(*c);
        while let Some(c) = m.next_ordered(&mut cur) {
            out.push(*c);
        }
    }
    out
}

fn walk_keys(m: &OrderedColumnMap<i32, f32, i32>) -> Vec<i32> {
    m.iter_ordered().map(|(k, _, _)| *k).collect()
}

// Test: the documented five-entry scenario.
// Verifies: columns come out as [10, 20, 30, 40, 50] with matching keys.
#[test]
fn five_entries_walk_in_column_order() {
    let mut m: OrderedColumnMap<i32, f32, i32> = ColumnHashMap::new();
    m.insert(1, 10.5, 30).unwrap();
    m.insert(2, 20.5, 10).unwrap();
    m.insert(3, 30.5, 50).unwrap();
    m.insert(4, 40.5, 20).unwrap();
    m.insert(5, 50.5, 40).unwrap();

    assert_eq!(walk(&m), vec![10, 20, 30, 40, 50]);
    assert_eq!(walk_keys(&m), vec![2, 4, 1, 5, 3]);
    let values: Vec<f32> = m.iter_ordered().map(|(_, v, _)| *v).collect();
    assert_eq!(values, vec![20.5, 40.5, 10.5, 50.5, 30.5]);
}

// Test: signed values and duplicates.
// Verifies: negative < zero < positive and duplicates adjacent.
#[test]
fn signed_and_duplicate_columns() {
    let mut m: OrderedColumnMap<i32, f32, i32> = ColumnHashMap::new();
    for (k, c) in [(1, 3), (2, -7), (3, 0), (4, 3), (5, -1), (6, -7), (7, i32::MIN), (8, i32::MAX)] {
        m.insert(k, 0.0, c).unwrap();
    }
    assert_eq!(walk(&m), vec![i32::MIN, -7, -7, -1, 0, 3, 3, i32::MAX]);
}

// Test: removal of head, tail and interior nodes.
#[test]
fn removal_preserves_order() {
    let mut m: OrderedColumnMap<i32, f32, i32> = ColumnHashMap::new();
    for k in 0..10 {
        m.insert(k, 0.0, (k * 7) % 10).unwrap();
    }
    assert_eq!(walk(&m), (0..10).collect::<Vec<_>>());

    // Column 0 belongs to key 0 (head); column 9 to key 7 (tail).
    m.remove(&0).unwrap();
    m.remove(&7).unwrap();
    // Column 5 belongs to key 5 (interior).
    m.remove(&5).unwrap();
    assert_eq!(walk(&m), vec![1, 2, 3, 4, 6, 7, 8]);
    assert_eq!(m.column_at(m.last_slot().unwrap()), Some(&8));
}

// Test: replace moves an entry anywhere in the list.
// Verifies: head to tail, tail to head, and the same-value fast path; the
// returned reference writes through.
#[test]
fn replace_repositions_entry() {
    let mut m: OrderedColumnMap<i32, f32, i32> = ColumnHashMap::new();
    for k in 0..6 {
        m.insert(k, k as f32, k * 10).unwrap();
    }

    *m.replace(&0, 1000).unwrap() = 99.0;
    assert_eq!(walk(&m), vec![10, 20, 30, 40, 50, 1000]);
    assert_eq!(m.get(&0), Some((&99.0, &1000)));

    m.replace(&0, -1000).unwrap();
    assert_eq!(walk(&m), vec![-1000, 10, 20, 30, 40, 50]);
    assert_eq!(walk_keys(&m)[0], 0);

    m.replace(&3, 30).unwrap();
    assert_eq!(walk_keys(&m), vec![0, 1, 2, 3, 4, 5]);

    m.replace(&3, 45).unwrap();
    assert_eq!(walk(&m), vec![-1000, 10, 20, 40, 45, 50]);

    assert_eq!(m.replace(&42, 0), Err(ReplaceError::MissingKey));
}

// Test: the slot-level API matches the cursor API step for step.
#[test]
fn slot_api_matches_cursor_api() {
    let mut m: OrderedColumnMap<i32, f32, i32> = ColumnHashMap::new();
    for (k, c) in [(1, 5), (2, -5), (3, 5), (4, 0)] {
        m.insert(k, 0.0, c).unwrap();
    }

    let mut by_slot = Vec::new();
    let mut slot = m.first_slot();
    while let Some(s) = slot {
        by_slot.push(s);
        slot = m.next_slot(s);
    }

    let mut by_cursor = Vec::new();
    if let Some((mut cur, _)) = m.first_ordered() {
        by_cursor.push(cur.slot());
        while m.next_ordered(&mut cur).is_some() {
            by_cursor.push(cur.slot());
        }
    }

    assert_eq!(by_slot, by_cursor);
    assert_eq!(by_slot.len(), 4);
}

// Test: growth triggered by inserts and by set_capacity keeps the walk.
#[test]
fn growth_keeps_walk() {
    let mut m: OrderedColumnMap<i32, f32, i32> = ColumnHashMap::with_capacity(0, 1);
    for k in 0..100 {
        m.insert(k, 0.0, 50 - k).unwrap();
    }
    let before = walk(&m);
    assert_eq!(before, (-49..=50).collect::<Vec<_>>());
    m.set_capacity(4096).unwrap();
    assert_eq!(walk(&m), before);
}

// Test: emptying the list through removal and clear.
#[test]
fn empty_list_has_no_first() {
    let mut m: OrderedColumnMap<i32, f32, i32> = ColumnHashMap::new();
    assert!(m.first_ordered().is_none());
    m.insert(1, 0.0, 1).unwrap();
    m.remove(&1).unwrap();
    assert!(m.first_ordered().is_none());
    assert!(m.first_slot().is_none() && m.last_slot().is_none());

    m.insert(2, 0.0, 2).unwrap();
    m.clear();
    assert!(m.first_ordered().is_none());
    assert_eq!(m.iter_ordered().count(), 0);
}
