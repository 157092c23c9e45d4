//! Iterators and snapshots for the ordered set.
//!
//! - [`Iter`]: borrowing in-order walk over a [`RawTree`](crate::RawTree).
//! - [`Snapshot`]: an owned, ascending copy of the elements at one moment.
//! - [`SnapshotIter`]: a forward-only cursor over a snapshot.
//! - [`LockedIter`]: a `SnapshotIter` that also owns the set's lock, handed
//!   over by [`OrderedSet::iter`](crate::OrderedSet::iter).

use std::fmt;
use std::iter::FusedIterator;
use std::ops::Index;
use std::slice;

use smallvec::SmallVec;

use crate::arena::{Arena, NodeId};
use crate::error::{Error, Result};
use crate::latch::LatchGuard;
use crate::raw::RawTree;

/// Inline stack depth for traversal. Height never exceeds `2 * log2(n + 1)`,
/// so this covers any tree with fewer than 2^32 elements without spilling.
const STACK_INLINE: usize = 64;

// ===========================================================================
// In-Order Traversal
// ===========================================================================

/// Borrowing iterator over a tree's elements in ascending order.
///
/// Walks with an explicit stack of pending ancestors instead of recursion.
pub struct Iter<'a, T> {
	arena: &'a Arena<T>,
	stack: SmallVec<[NodeId; STACK_INLINE]>,
	remaining: usize,
}

impl<'a, T> Iter<'a, T> {
	pub(crate) fn new(arena: &'a Arena<T>, root: Option<NodeId>) -> Iter<'a, T> {
		let mut iter = Iter {
			arena,
			stack: SmallVec::new(),
			remaining: arena.len(),
		};
		iter.push_left_spine(root);
		iter
	}

	fn push_left_spine(&mut self, mut cursor: Option<NodeId>) {
		while let Some(id) = cursor {
			self.stack.push(id);
			cursor = self.arena[id].left;
		}
	}
}

impl<'a, T> Iterator for Iter<'a, T> {
	type Item = &'a T;

	fn next(&mut self) -> Option<&'a T> {
		let id = self.stack.pop()?;
		let arena = self.arena;
		let node = &arena[id];
		self.push_left_spine(node.right);
		self.remaining -= 1;
		Some(&node.value)
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(self.remaining, Some(self.remaining))
	}
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

// ===========================================================================
// Snapshot
// ===========================================================================

/// An owned copy of a set's elements, in ascending order, taken at a single
/// point in time.
///
/// Independent of the tree it came from: later changes to the tree are never
/// visible through it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Snapshot<T> {
	items: Vec<T>,
}

/// Clones everything `iter` yields into a snapshot, reserving the whole
/// array up front so a refused allocation leaves nothing half built.
pub(crate) fn build_snapshot<T: Clone>(iter: Iter<'_, T>) -> Result<Snapshot<T>> {
	let mut items = Vec::new();
	items.try_reserve_exact(iter.len()).map_err(|e| {
		tracing::warn!(len = iter.len(), "snapshot allocation refused");
		Error::from(e)
	})?;
	items.extend(iter.cloned());
	Ok(Snapshot {
		items,
	})
}

impl<T> Snapshot<T> {
	/// Number of elements captured.
	#[inline]
	pub fn len(&self) -> usize {
		self.items.len()
	}

	/// Always `false` for snapshots built from a tree, which refuse to
	/// capture an empty set.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// The captured elements as a slice.
	pub fn items(&self) -> &[T] {
		&self.items
	}

	/// Returns the element at `index`, or [`Error::InvalidIndex`].
	pub fn get(&self, index: usize) -> Result<&T> {
		self.items.get(index).ok_or(Error::InvalidIndex {
			index,
			len: self.items.len(),
		})
	}

	/// Iterates over the captured elements.
	pub fn iter(&self) -> slice::Iter<'_, T> {
		self.items.iter()
	}

	/// Takes ownership of the underlying vector.
	pub fn into_vec(self) -> Vec<T> {
		self.items
	}
}

impl<T> Index<usize> for Snapshot<T> {
	type Output = T;

	fn index(&self, index: usize) -> &T {
		&self.items[index]
	}
}

impl<T> IntoIterator for Snapshot<T> {
	type Item = T;
	type IntoIter = std::vec::IntoIter<T>;

	fn into_iter(self) -> Self::IntoIter {
		self.items.into_iter()
	}
}

impl<'a, T> IntoIterator for &'a Snapshot<T> {
	type Item = &'a T;
	type IntoIter = slice::Iter<'a, T>;

	fn into_iter(self) -> Self::IntoIter {
		self.items.iter()
	}
}

impl<T: fmt::Debug> fmt::Debug for Snapshot<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(&self.items).finish()
	}
}

// ===========================================================================
// Snapshot Iterator
// ===========================================================================

/// Forward-only, non-restartable cursor over a [`Snapshot`].
///
/// ```text
/// Active(0) ──next──► Active(1) ──next──► ... ──next──► Exhausted
///                                                         │  ▲
///                                                         └──┘ next = Err(IterEnd)
/// ```
///
/// # Example
///
/// ```
/// use redfern::{Error, RawTree, SnapshotIter};
///
/// let tree: RawTree<i32> = [2, 1].into_iter().collect();
/// let mut iter = SnapshotIter::new(tree.snapshot().unwrap());
///
/// assert_eq!(iter.next(), Ok(&1));
/// assert_eq!(iter.next(), Ok(&2));
/// assert!(!iter.has_next());
/// assert_eq!(iter.next(), Err(Error::IterEnd));
/// ```
pub struct SnapshotIter<T> {
	snapshot: Snapshot<T>,
	cursor: usize,
}

impl<T> SnapshotIter<T> {
	/// Starts a cursor at the first element of `snapshot`.
	pub fn new(snapshot: Snapshot<T>) -> SnapshotIter<T> {
		SnapshotIter {
			snapshot,
			cursor: 0,
		}
	}

	/// Returns `true` while elements remain.
	#[inline]
	pub fn has_next(&self) -> bool {
		self.cursor < self.snapshot.len()
	}

	/// Yields the next element, or [`Error::IterEnd`] once every element has
	/// been returned. Stays exhausted.
	#[allow(clippy::should_implement_trait)]
	pub fn next(&mut self) -> Result<&T> {
		let item = self.snapshot.items.get(self.cursor).ok_or(Error::IterEnd)?;
		self.cursor += 1;
		Ok(item)
	}

	/// Number of elements not yet yielded.
	pub fn remaining(&self) -> usize {
		self.snapshot.len() - self.cursor
	}

	/// Total number of elements in the underlying snapshot.
	pub fn len(&self) -> usize {
		self.snapshot.len()
	}

	/// Returns `true` if the underlying snapshot holds no elements.
	pub fn is_empty(&self) -> bool {
		self.snapshot.is_empty()
	}

	/// Releases the snapshot. Equivalent to dropping the iterator.
	pub fn destroy(self) {}
}

impl<T: fmt::Debug> fmt::Debug for SnapshotIter<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SnapshotIter")
			.field("cursor", &self.cursor)
			.field("len", &self.snapshot.len())
			.finish()
	}
}

// ===========================================================================
// Lock-Holding Iterator
// ===========================================================================

/// A snapshot iterator that owns its set's lock.
///
/// Returned by [`OrderedSet::iter`](crate::OrderedSet::iter), which acquires
/// the lock, captures the snapshot and returns *without* unlocking. The lock
/// stays held until this value is dropped or [`destroy`](Self::destroy)ed, so
/// every other thread calling into the same set blocks for the iterator's
/// entire lifetime. The owning thread may keep calling into the set because
/// the lock is re-entrant; such calls never affect what this iterator yields.
///
/// The type is `!Send`: the lock must be released by the thread that took it.
#[must_use = "the set stays locked until the iterator is dropped"]
pub struct LockedIter<'a, T, C> {
	// Field order matters: the snapshot is released before the lock
	inner: SnapshotIter<T>,
	_guard: LatchGuard<'a, RawTree<T, C>>,
}

impl<'a, T, C> LockedIter<'a, T, C> {
	pub(crate) fn new(inner: SnapshotIter<T>, guard: LatchGuard<'a, RawTree<T, C>>) -> Self {
		tracing::trace!(len = inner.len(), "lock handed over to snapshot iterator");
		LockedIter {
			inner,
			_guard: guard,
		}
	}

	/// Returns `true` while elements remain.
	#[inline]
	pub fn has_next(&self) -> bool {
		self.inner.has_next()
	}

	/// Yields the next element, or [`Error::IterEnd`] once exhausted.
	#[allow(clippy::should_implement_trait)]
	pub fn next(&mut self) -> Result<&T> {
		self.inner.next()
	}

	/// Number of elements not yet yielded.
	pub fn remaining(&self) -> usize {
		self.inner.remaining()
	}

	/// Total number of elements captured.
	pub fn len(&self) -> usize {
		self.inner.len()
	}

	/// Returns `true` if no elements were captured.
	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	/// Releases the snapshot and then the lock.
	pub fn destroy(self) {}
}

impl<T, C> Drop for LockedIter<'_, T, C> {
	fn drop(&mut self) {
		tracing::trace!(yielded = self.inner.len() - self.inner.remaining(), "snapshot iterator releasing lock");
	}
}

impl<T: fmt::Debug, C> fmt::Debug for LockedIter<'_, T, C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LockedIter").field("inner", &self.inner).finish_non_exhaustive()
	}
}
