mod common;

use std::collections::BTreeSet;

use quickcheck::{Arbitrary, Gen, QuickCheck};

use lazyset::SortedIntSet;

#[derive(Debug, Clone)]
enum Op {
    Insert(i64),
    Remove(i64),
    Contains(i64),
    Range,
    Len,
    Ends,
}

use self::Op::*;

// a small value space so that operations collide often
fn small_value(g: &mut Gen) -> i64 {
    i64::from(u8::arbitrary(g) % 32)
}

impl Arbitrary for Op {
    fn arbitrary(g: &mut Gen) -> Op {
        match usize::arbitrary(g) % 10 {
            0..=3 => Insert(small_value(g)),
            4..=6 => Remove(small_value(g)),
            7 => Contains(small_value(g)),
            8 => Range,
            9 if bool::arbitrary(g) => Len,
            _ => Ends,
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Op>> {
        match *self {
            Insert(v) => Box::new(v.shrink().map(Insert)),
            Remove(v) => Box::new(v.shrink().map(Remove)),
            Contains(v) => Box::new(v.shrink().map(Contains)),
            _ => Box::new(std::iter::empty()),
        }
    }
}

fn prop_set_matches_btreeset(ops: Vec<Op>) -> bool {
    let set = SortedIntSet::new();
    let mut model = BTreeSet::new();

    for op in ops {
        let ok = match op {
            Insert(v) => set.insert(v) == model.insert(v),
            Remove(v) => set.remove(v) == model.remove(&v),
            Contains(v) => set.contains(v) == model.contains(&v),
            Range => {
                let mut walked = vec![];
                set.range(|v| {
                    walked.push(v);
                    true
                });
                walked == model.iter().copied().collect::<Vec<_>>()
            }
            Len => set.len() == model.len(),
            Ends => {
                set.first() == model.first().copied()
                    && set.last() == model.last().copied()
            }
        };

        if !ok {
            return false;
        }
    }

    set.iter().collect::<Vec<_>>()
        == model.into_iter().collect::<Vec<_>>()
}

#[test]
fn quickcheck_set_matches_btreeset() {
    common::setup_logger();

    QuickCheck::new().tests(500).max_tests(5000).quickcheck(
        prop_set_matches_btreeset as fn(Vec<Op>) -> bool,
    );
}

#[test]
fn empty_set() {
    let set = SortedIntSet::new();
    assert_eq!(set.len(), 0);
    assert!(set.is_empty());

    let mut visited = 0;
    set.range(|_| {
        visited += 1;
        true
    });
    assert_eq!(visited, 0);
}

#[test]
fn insert_is_idempotent() {
    let set = SortedIntSet::new();
    assert!(set.insert(7));
    assert!(!set.insert(7));
    assert_eq!(set.len(), 1);
}

#[test]
fn remove_absent_is_a_noop() {
    let set: SortedIntSet = [1, 2, 3].into_iter().collect();
    assert!(!set.remove(9));
    assert_eq!(set.len(), 3);

    assert!(set.remove(2));
    assert_eq!(set.len(), 2);
    assert!(!set.contains(2));
    assert!(!set.remove(2));
    assert_eq!(set.len(), 2);
}

#[test]
fn membership_matches_range_output() {
    let set: SortedIntSet =
        [12, -4, 0, 55, 3, 12, -4].into_iter().collect();

    let mut walked = vec![];
    set.range(|v| {
        walked.push(v);
        true
    });
    assert_eq!(walked, vec![-4, 0, 3, 12, 55]);
    assert_eq!(set.len(), walked.len());

    for v in -10..60 {
        assert_eq!(set.contains(v), walked.contains(&v));
    }
}

#[test]
fn extend_and_iter_agree() {
    let mut set = SortedIntSet::new();
    set.extend([5, 1, 5, -2]);
    assert_eq!(set.iter().collect::<Vec<_>>(), vec![-2, 1, 5]);

    let mut walked = vec![];
    set.range(|v| {
        walked.push(v);
        true
    });
    assert_eq!(set.iter().collect::<Vec<_>>(), walked);
}

#[test]
fn no_retries_without_contention() {
    let set = SortedIntSet::new();
    for v in 0..100 {
        set.insert(v);
    }
    for v in 0..100 {
        set.remove(v);
    }

    let stats = set.stats();
    assert_eq!(stats.insert_retries, 0);
    assert_eq!(stats.remove_retries, 0);
}

#[test]
fn clones_share_the_same_set() {
    let a = SortedIntSet::new();
    let b = a.clone();

    assert!(a.insert(1));
    assert!(b.contains(1));
    assert!(b.remove(1));
    assert!(!a.contains(1));
    assert_eq!(a.len(), 0);
}
