//! # Fixture-Based Tests for Redfern
//!
//! This module replays fixed scenarios with known outcomes. The shapes in
//! `fixtures/*.json` are exercised by the crate's internal tests, since the
//! JSON loader builds trees node by node and is only available there; these
//! tests reach the same element sets through the public API.

use redfern::{Error, OrderedSet, RawTree, SnapshotIter};

// ===========================================================================
// The Nine-Element Scenario
// ===========================================================================

/// The elements of fixtures/valid.json, inserted in a scrambled order.
const SCENARIO: [i32; 9] = [5, 3, 8, 1, 4, 7, 9, 2, 6];

fn scenario_set() -> OrderedSet<i32> {
	let set = OrderedSet::default();
	for x in SCENARIO {
		set.add(x).unwrap();
	}
	set
}

#[test]
fn scenario_to_array_is_sorted() {
	let set = scenario_set();
	let snapshot = set.to_array().unwrap();
	assert_eq!(snapshot.len(), 9);
	assert_eq!(snapshot.items(), &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
}

#[test]
fn scenario_neighbour_queries() {
	let set = scenario_set();
	assert_eq!(set.ceiling(&5), Ok(5));
	assert_eq!(set.higher(&5), Ok(6));
	assert_eq!(set.lower(&5), Ok(4));
	assert_eq!(set.floor(&5), Ok(5));
}

#[test]
fn scenario_remove() {
	let set = scenario_set();
	assert_eq!(set.len(), 9);
	assert_eq!(set.remove(&5), Ok(5));
	assert!(!set.contains(&5));
	assert_eq!(set.len(), 8);

	// Neighbours now skip the hole
	assert_eq!(set.ceiling(&5), Ok(6));
	assert_eq!(set.floor(&5), Ok(4));
	set.assert_invariants();
}

#[test]
fn scenario_iterator() {
	let set = scenario_set();
	let mut iter = set.iter().unwrap();
	for expected in 1..=9 {
		assert!(iter.has_next());
		assert_eq!(iter.next(), Ok(&expected));
	}
	assert!(!iter.has_next());
	assert_eq!(iter.next(), Err(Error::IterEnd));
	iter.destroy();
}

#[test]
fn scenario_insertion_order_does_not_matter() {
	let mut orders = vec![SCENARIO.to_vec()];
	orders.push((1..=9).collect());
	orders.push((1..=9).rev().collect());
	orders.push(vec![9, 1, 8, 2, 7, 3, 6, 4, 5]);

	for order in orders {
		let tree: RawTree<i32> = order.iter().copied().collect();
		tree.assert_invariants();
		assert_eq!(format!("{:?}", tree), "{1, 2, 3, 4, 5, 6, 7, 8, 9}", "order {:?}", order);
		assert!(tree.black_height() >= 2);
	}
}

// ===========================================================================
// Edge Scenarios
// ===========================================================================

#[test]
fn empty_set_scenario() {
	let set: OrderedSet<i32> = OrderedSet::default();
	assert_eq!(set.first(), Err(Error::Empty));
	assert_eq!(set.last(), Err(Error::Empty));
	assert_eq!(set.ceiling(&0), Err(Error::Empty));
	assert_eq!(set.poll_first(), Err(Error::Empty));
	assert_eq!(set.remove(&0), Err(Error::Empty));
	assert_eq!(set.to_array().unwrap_err(), Error::Empty);
	assert_eq!(set.iter().unwrap_err(), Error::Empty);
	assert!(!set.contains(&0));
	set.assert_invariants();
}

#[test]
fn single_element_scenario() {
	let set = OrderedSet::default();
	set.add(42).unwrap();
	assert_eq!(set.first(), Ok(42));
	assert_eq!(set.last(), Ok(42));
	assert_eq!(set.lower(&42), Err(Error::NotFound));
	assert_eq!(set.higher(&42), Err(Error::NotFound));
	assert_eq!(set.floor(&100), Ok(42));
	assert_eq!(set.ceiling(&0), Ok(42));
	assert_eq!(set.poll_last(), Ok(42));
	assert!(set.is_empty());
}

#[test]
fn snapshot_iter_over_owned_snapshot() {
	let tree: RawTree<i32> = SCENARIO.into_iter().collect();
	let mut iter = SnapshotIter::new(tree.to_array().unwrap());
	drop(tree);

	assert_eq!(iter.len(), 9);
	assert_eq!(iter.next(), Ok(&1));
	assert_eq!(iter.remaining(), 8);
	iter.destroy();
}
