//! # Property-Based Tests for Redfern
//!
//! This module contains property-based tests using proptest to systematically
//! discover edge cases through randomized testing. These tests verify that
//! tree invariants hold across thousands of random inputs.
//!
//! ## Test Properties
//!
//! - Add-then-contains: All added elements are found
//! - Remove-then-contains: Removed elements are gone
//! - Ordering: Snapshots are always strictly ascending
//! - Duplicates: Re-adding leaves the size unchanged
//! - Range queries: floor/ceiling/lower/higher agree with `BTreeSet::range`
//! - Oracle comparison: Behavior matches BTreeSet reference

use proptest::prelude::*;
use redfern::{Error, OrderedSet, RawTree, SnapshotIter};
use std::collections::BTreeSet;
use std::ops::Bound::{Excluded, Unbounded};

// ===========================================================================
// Strategy Helpers
// ===========================================================================

/// Generate a vector of unique elements for testing
fn unique_items(max_len: usize) -> impl Strategy<Value = Vec<i32>> {
	prop::collection::hash_set(any::<i32>(), 0..max_len).prop_map(|s| s.into_iter().collect())
}

/// Operations that can be performed on the tree
#[derive(Debug, Clone)]
enum Op {
	Add(i16),
	Remove(i16),
	PollFirst,
	PollLast,
	Contains(i16),
}

/// Generate a sequence of random operations over a narrow key range so that
/// collisions are common
fn operations(max_ops: usize) -> impl Strategy<Value = Vec<Op>> {
	prop::collection::vec(
		prop_oneof![
			3 => any::<i16>().prop_map(|k| Op::Add(k % 256)),
			2 => any::<i16>().prop_map(|k| Op::Remove(k % 256)),
			1 => Just(Op::PollFirst),
			1 => Just(Op::PollLast),
			1 => any::<i16>().prop_map(|k| Op::Contains(k % 256)),
		],
		0..max_ops,
	)
}

// ===========================================================================
// Add and Remove Properties
// ===========================================================================

proptest! {
	/// Property: Every added element is found afterwards
	#[test]
	fn all_added_items_exist(items in unique_items(500)) {
		let mut tree = RawTree::default();
		for x in &items {
			prop_assert_eq!(tree.add(*x), Ok(()));
		}

		tree.assert_invariants();
		for x in &items {
			prop_assert!(tree.contains(x), "{} should exist after add", x);
		}
		prop_assert_eq!(tree.len(), items.len());
	}

	/// Property: After removing an element it can no longer be found
	#[test]
	fn remove_then_contains(items in unique_items(200)) {
		let mut tree = RawTree::default();
		for x in &items {
			tree.add(*x).unwrap();
		}

		for x in &items {
			prop_assert_eq!(tree.remove(x), Ok(*x));
			prop_assert!(!tree.contains(x), "{} should not exist after removal", x);
		}

		tree.assert_invariants();
		prop_assert!(tree.is_empty());
		prop_assert_eq!(tree.remove(&0), Err(Error::Empty));
	}

	/// Property: Re-adding any present element is rejected and changes nothing
	#[test]
	fn duplicates_are_rejected(items in unique_items(200)) {
		let mut tree = RawTree::default();
		for x in &items {
			tree.add(*x).unwrap();
		}
		for x in &items {
			prop_assert_eq!(tree.add(*x), Err(Error::AlreadyExists));
		}
		prop_assert_eq!(tree.len(), items.len());
		tree.assert_invariants();
	}
}

// ===========================================================================
// Ordering Properties
// ===========================================================================

proptest! {
	/// Property: A snapshot iterator yields every element in ascending order,
	/// then reports the end forever
	#[test]
	fn iteration_is_sorted(items in prop::collection::vec(any::<i32>(), 1..300)) {
		let set = OrderedSet::default();
		for x in &items {
			let _ = set.add(*x);
		}

		let mut expected: Vec<i32> = items.clone();
		expected.sort_unstable();
		expected.dedup();

		let mut iter = set.iter().unwrap();
		let mut seen = Vec::new();
		while iter.has_next() {
			seen.push(*iter.next().unwrap());
		}
		prop_assert_eq!(iter.next(), Err(Error::IterEnd));
		drop(iter);

		prop_assert_eq!(seen, expected);
	}

	/// Property: A snapshot taken before mutations never reflects them
	#[test]
	fn snapshot_isolated_from_mutation(items in unique_items(100), extra in unique_items(100)) {
		prop_assume!(!items.is_empty());
		let mut tree = RawTree::default();
		for x in &items {
			tree.add(*x).unwrap();
		}
		let before: Vec<i32> = tree.iter().copied().collect();
		let mut iter = SnapshotIter::new(tree.snapshot().unwrap());

		for x in &extra {
			let _ = tree.add(*x);
		}
		for x in &items {
			let _ = tree.remove(x);
		}

		let mut seen = Vec::new();
		while let Ok(x) = iter.next() {
			seen.push(*x);
		}
		prop_assert_eq!(seen, before);
	}
}

// ===========================================================================
// Range Query Properties
// ===========================================================================

proptest! {
	/// Property: floor/ceiling/lower/higher agree with BTreeSet ranges
	#[test]
	fn range_queries_match_btreeset(
		items in prop::collection::btree_set(-1000i32..1000, 1..200),
		probes in prop::collection::vec(-1100i32..1100, 1..100),
	) {
		let tree: RawTree<i32> = items.iter().copied().collect();

		for q in &probes {
			prop_assert_eq!(tree.floor(q).ok(), items.range(..=*q).next_back());
			prop_assert_eq!(tree.ceiling(q).ok(), items.range(*q..).next());
			prop_assert_eq!(tree.lower(q).ok(), items.range(..*q).next_back());
			prop_assert_eq!(tree.higher(q).ok(), items.range((Excluded(*q), Unbounded)).next());
		}
		prop_assert_eq!(tree.first().ok(), items.first());
		prop_assert_eq!(tree.last().ok(), items.last());
	}
}

// ===========================================================================
// Oracle Comparison
// ===========================================================================

proptest! {
	/// Property: Any operation sequence behaves exactly like BTreeSet
	#[test]
	fn matches_btreeset_oracle(ops in operations(400)) {
		let mut tree = RawTree::default();
		let mut oracle = BTreeSet::new();

		for op in ops {
			match op {
				Op::Add(k) => prop_assert_eq!(tree.add(k).is_ok(), oracle.insert(k)),
				Op::Remove(k) => prop_assert_eq!(tree.remove(&k).ok(), oracle.take(&k)),
				Op::PollFirst => prop_assert_eq!(tree.poll_first().ok(), oracle.pop_first()),
				Op::PollLast => prop_assert_eq!(tree.poll_last().ok(), oracle.pop_last()),
				Op::Contains(k) => prop_assert_eq!(tree.contains(&k), oracle.contains(&k)),
			}
			prop_assert_eq!(tree.len(), oracle.len());
		}

		tree.assert_invariants();
		prop_assert!(tree.iter().eq(oracle.iter()));
	}
}
