//! # Redfern: An Ordered Set on a Red-Black Tree
//!
//! This crate provides an in-memory ordered set of unique elements backed by a
//! red-black tree, plus a thread-safe wrapper whose iterator keeps the set
//! locked for as long as it lives.
//!
//! ## Design Overview
//!
//! The crate is split into two layers:
//!
//! - [`RawTree`]: a single-threaded red-black tree. Nodes live in an arena and
//!   link to each other by index; insertions and removals rebalance with
//!   rotations and recoloring so every operation stays `O(log n)`.
//! - [`OrderedSet`]: wraps a `RawTree` in a re-entrant [`latch::Latch`]. Every
//!   method acquires the latch, delegates to the tree and releases it again,
//!   with one exception: [`OrderedSet::iter`].
//!
//! ### Lock Handoff
//!
//! `iter()` acquires the latch, copies the elements into a [`Snapshot`] while
//! holding it, and returns a [`LockedIter`] that *owns* the still-held guard.
//! The critical section therefore spans the iterator's whole lifetime and ends
//! only when the iterator is dropped. Other threads calling into the same set
//! block until then.
//!
//! ```text
//!   caller                 OrderedSet                   RawTree
//!   ──────                 ──────────                   ───────
//!   iter() ───────────────► lock()
//!                           borrow().snapshot() ───────► in-order copy
//!                    ◄───── LockedIter { snapshot, guard }
//!   next() ... next()          (latch still held)
//!   drop(iter) ───────────► guard dropped ──► latch released
//! ```
//!
//! If the snapshot cannot be built (empty set, allocation refused) the latch
//! is released before the error is returned.
//!
//! ## Basic Usage
//!
//! ```
//! use redfern::{Error, OrderedSet};
//!
//! let set = OrderedSet::default();
//! for x in [5, 3, 8, 1, 4, 7, 9, 2, 6] {
//!     set.add(x).unwrap();
//! }
//!
//! assert_eq!(set.add(4), Err(Error::AlreadyExists));
//! assert_eq!(set.ceiling(&5), Ok(5));
//! assert_eq!(set.higher(&5), Ok(6));
//!
//! let mut iter = set.iter().unwrap();
//! while iter.has_next() {
//!     let _ = iter.next();
//! }
//! drop(iter); // releases the lock
//!
//! assert_eq!(set.remove(&5), Ok(5));
//! assert_eq!(set.len(), 8);
//! ```
//!
//! ## Thread Safety
//!
//! `OrderedSet<T, C>` is `Send + Sync` when `T` and `C` are `Send`, and can
//! be shared across threads via `Arc`. Operations on one set are totally
//! ordered by its latch. Two-instance operations ([`OrderedSet::add_all`],
//! [`OrderedSet::set_eq`], [`OrderedSet::is_subset`]) lock both sets in a
//! single global order so they cannot deadlock against each other.

#[cfg(any(test, feature = "test-utils"))]
pub mod alloc;
mod arena;
pub mod compare;
pub mod error;
pub mod iter;
pub mod latch;
pub mod raw;
#[cfg(test)]
mod util;

use std::fmt;
use std::ptr;

pub use compare::{Comparator, Natural, Reverse};
pub use error::{Error, Result};
pub use iter::{Iter, LockedIter, Snapshot, SnapshotIter};
pub use raw::RawTree;

use latch::Latch;

/// Which side of a node an operation walks toward.
#[derive(Debug, PartialEq, Copy, Clone)]
pub(crate) enum Direction {
	/// Toward greater elements (right in the tree).
	Forward,
	/// Toward lesser elements (left in the tree).
	Reverse,
}

// ---------------------------------------------------------------------------
// Thread-Safe Set
// ---------------------------------------------------------------------------

/// A thread-safe ordered set of unique elements.
///
/// Each method locks the set, runs the matching [`RawTree`] operation and
/// unlocks before returning. Queries return clones because references into
/// the tree cannot outlive the critical section.
///
/// The latch is re-entrant, so a thread holding a [`LockedIter`] may keep
/// calling methods on the same set. Those calls never change what the
/// iterator yields.
///
/// # Type Parameters
///
/// - `T`: The element type.
/// - `C`: The [`Comparator`] defining the order. Defaults to [`Natural`].
pub struct OrderedSet<T, C = Natural> {
	latch: Latch<RawTree<T, C>>,
}

impl<T: Ord> Default for OrderedSet<T, Natural> {
	fn default() -> Self {
		Self::new(Natural)
	}
}

impl<T, C> From<RawTree<T, C>> for OrderedSet<T, C> {
	fn from(tree: RawTree<T, C>) -> Self {
		OrderedSet {
			latch: Latch::new(tree),
		}
	}
}

impl<T, C: Comparator<T>> OrderedSet<T, C> {
	// -----------------------------------------------------------------------
	// Construction
	// -----------------------------------------------------------------------

	/// Creates an empty set ordered by `cmp`.
	///
	/// # Example
	///
	/// ```
	/// use redfern::OrderedSet;
	///
	/// let set = OrderedSet::new(|a: &u32, b: &u32| b.cmp(a));
	/// set.add(1).unwrap();
	/// set.add(2).unwrap();
	/// assert_eq!(set.first(), Ok(2));
	/// ```
	pub fn new(cmp: C) -> Self {
		OrderedSet::from(RawTree::new(cmp))
	}

	/// Creates an empty set with room for `capacity` elements.
	pub fn with_capacity(cmp: C, capacity: usize) -> Result<Self> {
		Ok(OrderedSet::from(RawTree::with_capacity(cmp, capacity)?))
	}

	/// Consumes the set, returning the tree inside it.
	pub fn into_inner(self) -> RawTree<T, C> {
		self.latch.into_inner()
	}

	/// Reserves room for `additional` more elements.
	pub fn reserve(&self, additional: usize) -> Result<()> {
		self.latch.lock().borrow_mut().reserve(additional)
	}

	/// Returns `true` if some thread currently holds this set's lock, for
	/// example through a live [`LockedIter`].
	pub fn is_locked(&self) -> bool {
		self.latch.is_locked()
	}

	// -----------------------------------------------------------------------
	// Size
	// -----------------------------------------------------------------------

	/// Returns the number of elements.
	pub fn len(&self) -> usize {
		self.latch.lock().borrow().len()
	}

	/// Returns `true` if the set holds no elements.
	pub fn is_empty(&self) -> bool {
		self.latch.lock().borrow().is_empty()
	}

	/// Black height of the underlying tree.
	pub fn black_height(&self) -> usize {
		self.latch.lock().borrow().black_height()
	}

	// -----------------------------------------------------------------------
	// Updates
	// -----------------------------------------------------------------------

	/// Inserts `item`. See [`RawTree::add`].
	pub fn add(&self, item: T) -> Result<()> {
		self.latch.lock().borrow_mut().add(item)
	}

	/// Removes and returns the element equal to `item`.
	pub fn remove(&self, item: &T) -> Result<T> {
		self.latch.lock().borrow_mut().remove(item)
	}

	/// Removes the element equal to `item` and hands it to `destructor`.
	///
	/// The destructor runs with the lock still held but with the tree no
	/// longer borrowed, so it may call back into this set.
	pub fn remove_with<F>(&self, item: &T, destructor: F) -> Result<()>
	where
		F: FnOnce(T),
	{
		let guard = self.latch.lock();
		let value = guard.borrow_mut().remove(item)?;
		destructor(value);
		Ok(())
	}

	/// Removes and returns the smallest element.
	pub fn poll_first(&self) -> Result<T> {
		self.latch.lock().borrow_mut().poll_first()
	}

	/// Removes and returns the largest element.
	pub fn poll_last(&self) -> Result<T> {
		self.latch.lock().borrow_mut().poll_last()
	}

	/// Removes every element.
	pub fn clear(&self) {
		self.latch.lock().borrow_mut().clear();
	}

	/// Removes every element, handing each to `destructor` after the set has
	/// been emptied. Runs under the lock, like [`remove_with`](Self::remove_with).
	pub fn clear_with<F>(&self, destructor: F)
	where
		F: FnMut(T),
	{
		let guard = self.latch.lock();
		let detached = guard.borrow_mut().take_all();
		detached.into_values().for_each(destructor);
	}

	/// Consumes the set, handing every element to `destructor`.
	pub fn destroy_with<F>(self, destructor: F)
	where
		F: FnMut(T),
	{
		self.latch.into_inner().destroy_with(destructor);
	}

	/// Returns `true` if an element equal to `item` is present.
	pub fn contains(&self, item: &T) -> bool {
		self.latch.lock().borrow().contains(item)
	}

	// -----------------------------------------------------------------------
	// Two-Instance Operations
	// -----------------------------------------------------------------------

	/// Adds a clone of every element of `other` that this set lacks and
	/// returns how many were added.
	///
	/// Storage for all of `other` is reserved first, so [`Error::AllocFailure`]
	/// leaves this set unchanged. Passing the set itself adds nothing.
	pub fn add_all(&self, other: &OrderedSet<T, C>) -> Result<usize>
	where
		T: Clone,
	{
		if ptr::eq(self, other) {
			return Ok(0);
		}

		let (dst_guard, src_guard) = latch::lock_pair(&self.latch, &other.latch);
		let src = src_guard.borrow();
		let mut dst = dst_guard.borrow_mut();

		dst.reserve(src.len())?;
		let mut added = 0;
		for item in src.iter() {
			match dst.add(item.clone()) {
				Ok(()) => added += 1,
				Err(Error::AlreadyExists) => {}
				Err(e) => return Err(e),
			}
		}

		tracing::debug!(added, len = dst.len(), "merged sets");
		Ok(added)
	}

	/// Returns `true` if both sets hold the same elements under this set's
	/// comparator.
	pub fn set_eq(&self, other: &OrderedSet<T, C>) -> bool {
		if ptr::eq(self, other) {
			return true;
		}

		let (a_guard, b_guard) = latch::lock_pair(&self.latch, &other.latch);
		let (a, b) = (a_guard.borrow(), b_guard.borrow());
		if a.len() != b.len() {
			return false;
		}
		let cmp = a.comparator();
		a.iter().zip(b.iter()).all(|(x, y)| cmp.compare(x, y).is_eq())
	}

	/// Returns `true` if every element of this set is also in `other`.
	pub fn is_subset(&self, other: &OrderedSet<T, C>) -> bool {
		if ptr::eq(self, other) {
			return true;
		}

		let (a_guard, b_guard) = latch::lock_pair(&self.latch, &other.latch);
		let (a, b) = (a_guard.borrow(), b_guard.borrow());
		a.len() <= b.len() && a.iter().all(|x| b.contains(x))
	}
}

impl<T: Clone, C: Comparator<T>> OrderedSet<T, C> {
	// -----------------------------------------------------------------------
	// Queries
	// -----------------------------------------------------------------------

	/// Returns a clone of the smallest element.
	pub fn first(&self) -> Result<T> {
		self.latch.lock().borrow().first().cloned()
	}

	/// Returns a clone of the largest element.
	pub fn last(&self) -> Result<T> {
		self.latch.lock().borrow().last().cloned()
	}

	/// Greatest element less than or equal to `item`.
	pub fn floor(&self, item: &T) -> Result<T> {
		self.latch.lock().borrow().floor(item).cloned()
	}

	/// Least element greater than or equal to `item`.
	pub fn ceiling(&self, item: &T) -> Result<T> {
		self.latch.lock().borrow().ceiling(item).cloned()
	}

	/// Greatest element strictly less than `item`.
	pub fn lower(&self, item: &T) -> Result<T> {
		self.latch.lock().borrow().lower(item).cloned()
	}

	/// Least element strictly greater than `item`.
	pub fn higher(&self, item: &T) -> Result<T> {
		self.latch.lock().borrow().higher(item).cloned()
	}

	// -----------------------------------------------------------------------
	// Snapshots and Iteration
	// -----------------------------------------------------------------------

	/// Copies the elements, in ascending order, into a caller-owned
	/// [`Snapshot`]. The lock is released before returning.
	pub fn to_array(&self) -> Result<Snapshot<T>> {
		self.latch.lock().borrow().snapshot()
	}

	/// Snapshots the set and returns an iterator that keeps the set locked
	/// until it is dropped.
	///
	/// On error the lock is released before returning.
	///
	/// # Example
	///
	/// ```
	/// use redfern::{Error, OrderedSet};
	///
	/// let set: OrderedSet<i32> = OrderedSet::default();
	/// assert_eq!(set.iter().unwrap_err(), Error::Empty);
	/// assert!(!set.is_locked());
	///
	/// set.add(1).unwrap();
	/// let mut iter = set.iter().unwrap();
	/// assert!(set.is_locked());
	/// assert_eq!(iter.next(), Ok(&1));
	/// assert_eq!(iter.next(), Err(Error::IterEnd));
	/// iter.destroy();
	/// assert!(!set.is_locked());
	/// ```
	pub fn iter(&self) -> Result<LockedIter<'_, T, C>> {
		let guard = self.latch.lock();
		let snapshot = guard.borrow().snapshot();
		match snapshot {
			Ok(snapshot) => Ok(LockedIter::new(SnapshotIter::new(snapshot), guard)),
			Err(e) => {
				drop(guard);
				Err(e)
			}
		}
	}
}

impl<T: fmt::Debug, C: Comparator<T>> fmt::Debug for OrderedSet<T, C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.latch.try_lock() {
			Some(guard) => {
				let tree = guard.borrow();
				fmt::Debug::fmt(&*tree, f)
			}
			None => f.write_str("{<locked>}"),
		}
	}
}

// ===========================================================================
// Test-Only Validation
// ===========================================================================

#[cfg(any(test, feature = "test-utils"))]
impl<T: fmt::Debug, C: Comparator<T>> OrderedSet<T, C> {
	/// Locks the set and validates all tree invariants.
	/// See [`RawTree::assert_invariants`].
	pub fn assert_invariants(&self) {
		self.latch.lock().borrow().assert_invariants();
	}
}
