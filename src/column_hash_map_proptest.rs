#![cfg(test)]

// State-machine property tests for ColumnHashMap, run against a
// std::collections model for both column strategies.

use crate::column_hash_map::ColumnHashMap;
use crate::entry_store::MapConfig;
use crate::error::{InsertError, ReplaceError};
use crate::multi_hash_column::MultiHashColumn;
use crate::ordered_list_column::OrderedListColumn;
use proptest::prelude::*;
use std::collections::hash_map::RandomState;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{BuildHasher, Hasher};

#[derive(Clone, Debug)]
enum Op {
    Insert(u8, i32, i8),
    Remove(u8),
    Replace(u8, i8, i32),
    Grow(usize),
    Clear,
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    // Few keys and few column values so duplicates and collisions are common.
    let key = 0u8..24;
    let column = -4i8..=4;
    let op = prop_oneof![
        4 => (key.clone(), any::<i32>(), column.clone()).prop_map(|(k, v, c)| Op::Insert(k, v, c)),
        2 => key.clone().prop_map(Op::Remove),
        2 => (key, column, any::<i32>()).prop_map(|(k, c, v)| Op::Replace(k, c, v)),
        1 => (0usize..64).prop_map(Op::Grow),
        1 => Just(Op::Clear),
    ];
    proptest::collection::vec(op, 1..120)
}

type Model = BTreeMap<u8, (i32, i8)>;

// Apply one op to both the map and the model, checking the shared outcome.
fn step<I, S>(
    sut: &mut ColumnHashMap<u8, i32, i8, I, S>,
    model: &mut Model,
    op: Op,
) -> Result<(), TestCaseError>
where
    I: crate::column::ColumnIndex<i8>,
    S: BuildHasher,
{
    match op {
        Op::Insert(k, v, c) => {
            let already = model.contains_key(&k);
            match sut.insert(k, v, c) {
                Ok(slot) => {
                    prop_assert!(!already, "insert must fail on duplicate");
                    prop_assert_eq!(sut.entry_at(slot), Some((&k, &v, &c)));
                    model.insert(k, (v, c));
                }
                Err(InsertError::DuplicateKey) => prop_assert!(already),
                Err(e) => prop_assert!(false, "unexpected error: {e}"),
            }
        }
        Op::Remove(k) => {
            let got = sut.remove(&k);
            let want = model.remove(&k).map(|(v, c)| (k, v, c));
            prop_assert_eq!(got, want);
        }
        Op::Replace(k, c, v) => match sut.replace(&k, c) {
            Ok(value) => {
                *value = v;
                let entry = model.get_mut(&k).expect("replace succeeded on a modelled key");
                *entry = (v, c);
            }
            Err(ReplaceError::MissingKey) => prop_assert!(!model.contains_key(&k)),
        },
        Op::Grow(n) => {
            let before = sut.capacity();
            sut.set_capacity(n).expect("small capacities always fit");
            prop_assert_eq!(sut.capacity(), before.max(n));
        }
        Op::Clear => {
            let before = sut.capacity();
            sut.clear();
            model.clear();
            prop_assert_eq!(sut.capacity(), before);
        }
    }

    prop_assert_eq!(sut.len(), model.len());
    prop_assert!(sut.len() <= sut.capacity());
    for (k, (v, c)) in model.iter() {
        prop_assert_eq!(sut.get(k), Some((v, c)));
    }
    Ok(())
}

fn check_hash_column<H, S>(
    sut: &ColumnHashMap<u8, i32, i8, MultiHashColumn<i8, H>, S>,
    model: &Model,
) -> Result<(), TestCaseError>
where
    H: BuildHasher,
    S: BuildHasher,
{
    for c in -4i8..=4 {
        let got: Vec<u8> = sut.get_by_column(&c).map(|(k, _)| *k).collect();
        let unique: BTreeSet<u8> = got.iter().copied().collect();
        prop_assert_eq!(unique.len(), got.len(), "a chain yielded a key twice");
        let want: BTreeSet<u8> = model
            .iter()
            .filter(|(_, (_, mc))| *mc == c)
            .map(|(k, _)| *k)
            .collect();
        prop_assert_eq!(unique, want);
    }
    Ok(())
}

fn check_ordered_column<S: BuildHasher>(
    sut: &ColumnHashMap<u8, i32, i8, OrderedListColumn<i8>, S>,
    model: &Model,
) -> Result<(), TestCaseError> {
    let walked: Vec<(u8, i8)> = sut.iter_ordered().map(|(k, _, c)| (*k, *c)).collect();
    prop_assert_eq!(walked.len(), model.len());
    prop_assert!(walked.windows(2).all(|w| w[0].1 <= w[1].1), "order broken: {:?}", walked);
    let keys: BTreeSet<u8> = walked.iter().map(|(k, _)| *k).collect();
    prop_assert_eq!(keys.len(), model.len());
    for (k, c) in walked {
        prop_assert_eq!(model.get(&k).map(|(_, mc)| *mc), Some(c));
    }
    Ok(())
}

// Forces every column value into the same bucket chain.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: MultiHashColumn agrees with the model after every op.
// - Each key resolves to its modelled value and column.
// - Column queries yield exactly the keys modelled with that column.
// - Growth and clear keep capacity monotone and contents intact.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_hash_column_state_machine(ops in arb_ops()) {
        let mut sut: ColumnHashMap<u8, i32, i8> = ColumnHashMap::with_capacity(1, 3);
        let mut model = Model::new();
        for op in ops {
            step(&mut sut, &mut model, op)?;
            check_hash_column(&sut, &model)?;
        }
    }
}

// Property: the same invariants under worst-case column collisions.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_hash_column_with_collisions(ops in arb_ops()) {
        let column = MultiHashColumn::with_hasher(ConstBuildHasher);
        let mut sut: ColumnHashMap<u8, i32, i8, MultiHashColumn<i8, ConstBuildHasher>> =
            ColumnHashMap::with_column(MapConfig::new(2, 2), RandomState::new(), column);
        let mut model = Model::new();
        for op in ops {
            step(&mut sut, &mut model, op)?;
            check_hash_column(&sut, &model)?;
        }
    }
}

// Property: OrderedListColumn always walks every entry once in
// non-decreasing column order.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_ordered_column_state_machine(ops in arb_ops()) {
        let mut sut: ColumnHashMap<u8, i32, i8, OrderedListColumn<i8>> =
            ColumnHashMap::with_capacity(0, 1);
        let mut model = Model::new();
        for op in ops {
            step(&mut sut, &mut model, op)?;
            check_ordered_column(&sut, &model)?;
        }
    }
}
