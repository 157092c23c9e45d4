//! # The Single-Threaded Red-Black Tree
//!
//! [`RawTree`] is the ordered-set engine. It performs no locking of its own;
//! [`OrderedSet`](crate::OrderedSet) wraps it for shared use.
//!
//! ## Layout
//!
//! ```text
//!   RawTree
//!   ├── root: Option<NodeId> ──────────────┐
//!   ├── cmp:  C (Comparator<T>)            │
//!   └── arena: Arena<T>                    ▼
//!          ┌─────────────────────────────────────────────┐
//!          │ #0 (5,B)  #1 (3,R)  #2 (8,R)  #3 vacant ... │
//!          └─────────────────────────────────────────────┘
//!            left/right/parent are indices into the arena
//! ```
//!
//! ## Invariants
//!
//! Held before and after every public method:
//!
//! 1. In-order traversal is strictly ascending under the comparator.
//! 2. The root is black.
//! 3. A red node never has a red child.
//! 4. Every path from a node down to a missing child crosses the same
//!    number of black nodes.
//! 5. `len()` equals the number of nodes reachable from the root.
//!
//! Insertion and removal rewrite links and colors locally (rotations and
//! recoloring) and always run their repair pass to completion before
//! returning, so no caller ever observes a partially balanced tree.

use std::cmp::Ordering;
use std::fmt;

use crate::arena::{Arena, Color, Node, NodeId};
use crate::compare::{Comparator, Natural};
use crate::error::{Error, Result};
use crate::iter::{self, Iter, Snapshot};
use crate::Direction;

/// A red-black tree of unique elements ordered by `C`.
///
/// All queries and updates are `O(log n)`; traversal and [`clear`](Self::clear)
/// are `O(n)`. Operations on an empty tree report [`Error::Empty`] before any
/// tree logic runs.
///
/// # Example
///
/// ```
/// use redfern::{Error, RawTree};
///
/// let mut tree = RawTree::default();
/// for x in [5, 3, 8, 1, 4, 7, 9, 2, 6] {
///     tree.add(x).unwrap();
/// }
///
/// assert_eq!(tree.add(4), Err(Error::AlreadyExists));
/// assert_eq!(tree.ceiling(&5), Ok(&5));
/// assert_eq!(tree.higher(&5), Ok(&6));
/// assert_eq!(tree.lower(&5), Ok(&4));
/// assert_eq!(tree.lower(&1), Err(Error::NotFound));
/// ```
pub struct RawTree<T, C = Natural> {
	pub(crate) arena: Arena<T>,
	pub(crate) root: Option<NodeId>,
	cmp: C,
}

impl<T: Ord> Default for RawTree<T, Natural> {
	fn default() -> Self {
		Self::new(Natural)
	}
}

impl<T, C: Comparator<T>> RawTree<T, C> {
	// -----------------------------------------------------------------------
	// Construction
	// -----------------------------------------------------------------------

	/// Creates an empty tree ordered by `cmp`. Does not allocate.
	pub const fn new(cmp: C) -> Self {
		RawTree {
			arena: Arena::new(),
			root: None,
			cmp,
		}
	}

	/// Creates an empty tree with room for `capacity` elements.
	///
	/// Returns [`Error::AllocFailure`] if the storage cannot be reserved.
	pub fn with_capacity(cmp: C, capacity: usize) -> Result<Self> {
		Ok(RawTree {
			arena: Arena::try_with_capacity(capacity)?,
			root: None,
			cmp,
		})
	}

	/// Reserves room so that the next `additional` insertions cannot fail
	/// with [`Error::AllocFailure`].
	pub fn reserve(&mut self, additional: usize) -> Result<()> {
		self.arena.try_reserve(additional)
	}

	/// Number of elements the tree can hold before it must grow its storage,
	/// including the ones it already holds.
	pub fn capacity(&self) -> usize {
		self.arena.capacity()
	}

	/// Returns the comparator this tree was built with.
	pub fn comparator(&self) -> &C {
		&self.cmp
	}

	// -----------------------------------------------------------------------
	// Size
	// -----------------------------------------------------------------------

	/// Returns the number of elements.
	#[inline]
	pub fn len(&self) -> usize {
		self.arena.len()
	}

	/// Returns `true` if the tree holds no elements.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.root.is_none()
	}

	/// Number of black nodes on any path from the root to a missing child.
	///
	/// Zero for an empty tree. Height is at most twice this value plus one.
	pub fn black_height(&self) -> usize {
		let mut height = 0;
		let mut cursor = self.root;
		while let Some(id) = cursor {
			if self.arena[id].color == Color::Black {
				height += 1;
			}
			cursor = self.arena[id].left;
		}
		height
	}

	// -----------------------------------------------------------------------
	// Lookups
	// -----------------------------------------------------------------------

	/// Returns `true` if an element comparing equal to `item` is present.
	pub fn contains(&self, item: &T) -> bool {
		self.find(item).is_some()
	}

	/// Returns the smallest element.
	pub fn first(&self) -> Result<&T> {
		let root = self.root.ok_or(Error::Empty)?;
		Ok(&self.arena[self.leftmost(root)].value)
	}

	/// Returns the largest element.
	pub fn last(&self) -> Result<&T> {
		let root = self.root.ok_or(Error::Empty)?;
		Ok(&self.arena[self.rightmost(root)].value)
	}

	/// Greatest element less than or equal to `item`.
	pub fn floor(&self, item: &T) -> Result<&T> {
		self.nearest(item, Direction::Reverse, true)
	}

	/// Least element greater than or equal to `item`.
	pub fn ceiling(&self, item: &T) -> Result<&T> {
		self.nearest(item, Direction::Forward, true)
	}

	/// Greatest element strictly less than `item`.
	pub fn lower(&self, item: &T) -> Result<&T> {
		self.nearest(item, Direction::Reverse, false)
	}

	/// Least element strictly greater than `item`.
	pub fn higher(&self, item: &T) -> Result<&T> {
		self.nearest(item, Direction::Forward, false)
	}

	/// Single descent that remembers the best candidate seen on the wanted
	/// side of `item`.
	fn nearest(&self, item: &T, direction: Direction, inclusive: bool) -> Result<&T> {
		let mut cursor = Some(self.root.ok_or(Error::Empty)?);
		let mut best = None;

		while let Some(id) = cursor {
			let node = &self.arena[id];
			match (self.cmp.compare(item, &node.value), direction) {
				(Ordering::Equal, _) if inclusive => return Ok(&node.value),
				// Node lies above the query: a floor/lower candidate must be to the left
				(Ordering::Less, Direction::Reverse)
				| (Ordering::Equal, Direction::Reverse) => cursor = node.left,
				(Ordering::Greater, Direction::Reverse) => {
					best = Some(id);
					cursor = node.right;
				}
				(Ordering::Greater, Direction::Forward)
				| (Ordering::Equal, Direction::Forward) => cursor = node.right,
				(Ordering::Less, Direction::Forward) => {
					best = Some(id);
					cursor = node.left;
				}
			}
		}

		best.map(|id| &self.arena[id].value).ok_or(Error::NotFound)
	}

	fn find(&self, item: &T) -> Option<NodeId> {
		let mut cursor = self.root;
		while let Some(id) = cursor {
			let node = &self.arena[id];
			cursor = match self.cmp.compare(item, &node.value) {
				Ordering::Less => node.left,
				Ordering::Greater => node.right,
				Ordering::Equal => return Some(id),
			};
		}
		None
	}

	fn leftmost(&self, mut id: NodeId) -> NodeId {
		while let Some(left) = self.arena[id].left {
			id = left;
		}
		id
	}

	fn rightmost(&self, mut id: NodeId) -> NodeId {
		while let Some(right) = self.arena[id].right {
			id = right;
		}
		id
	}

	// -----------------------------------------------------------------------
	// Insertion
	// -----------------------------------------------------------------------

	/// Inserts `item`.
	///
	/// Returns [`Error::AlreadyExists`] if an equal element is present, or
	/// [`Error::AllocFailure`] if no node could be allocated. The tree is
	/// unchanged on either error.
	pub fn add(&mut self, item: T) -> Result<()> {
		// Locate the attachment point before touching any link
		let mut parent = None;
		let mut go_left = false;
		let mut cursor = self.root;
		while let Some(id) = cursor {
			let node = &self.arena[id];
			parent = Some(id);
			match self.cmp.compare(&item, &node.value) {
				Ordering::Less => {
					go_left = true;
					cursor = node.left;
				}
				Ordering::Greater => {
					go_left = false;
					cursor = node.right;
				}
				Ordering::Equal => return Err(Error::AlreadyExists),
			}
		}

		let id = self.arena.alloc(Node::leaf(item, parent))?;
		match parent {
			None => self.root = Some(id),
			Some(p) if go_left => self.arena[p].left = Some(id),
			Some(p) => self.arena[p].right = Some(id),
		}

		self.insert_fixup(id);
		Ok(())
	}

	/// Restores the coloring invariants after `node` was linked as a red leaf.
	fn insert_fixup(&mut self, mut node: NodeId) {
		while let Some(parent) = self.arena[node].parent {
			if self.arena[parent].color == Color::Black {
				break;
			}
			// A red parent is never the root, so the grandparent exists
			let Some(grandparent) = self.arena[parent].parent else {
				break;
			};

			if Some(parent) == self.arena[grandparent].left {
				let uncle = self.arena[grandparent].right;
				if self.is_red(uncle) {
					self.set_black(uncle);
					self.arena[parent].color = Color::Black;
					self.arena[grandparent].color = Color::Red;
					node = grandparent;
				} else {
					if Some(node) == self.arena[parent].right {
						node = parent;
						self.rotate_left(node);
					}
					let parent = self.parent_of(node);
					let grandparent = self.parent_of(parent);
					self.arena[parent].color = Color::Black;
					self.arena[grandparent].color = Color::Red;
					self.rotate_right(grandparent);
				}
			} else {
				let uncle = self.arena[grandparent].left;
				if self.is_red(uncle) {
					self.set_black(uncle);
					self.arena[parent].color = Color::Black;
					self.arena[grandparent].color = Color::Red;
					node = grandparent;
				} else {
					if Some(node) == self.arena[parent].left {
						node = parent;
						self.rotate_right(node);
					}
					let parent = self.parent_of(node);
					let grandparent = self.parent_of(parent);
					self.arena[parent].color = Color::Black;
					self.arena[grandparent].color = Color::Red;
					self.rotate_left(grandparent);
				}
			}
		}

		self.set_black(self.root);
	}

	// -----------------------------------------------------------------------
	// Removal
	// -----------------------------------------------------------------------

	/// Removes the element comparing equal to `item` and returns it.
	///
	/// Returns [`Error::Empty`] on an empty tree and [`Error::NotFound`] if no
	/// such element exists.
	pub fn remove(&mut self, item: &T) -> Result<T> {
		if self.root.is_none() {
			return Err(Error::Empty);
		}
		let id = self.find(item).ok_or(Error::NotFound)?;
		Ok(self.detach(id))
	}

	/// Removes the element comparing equal to `item` and passes it to
	/// `destructor` once it is no longer linked into the tree.
	pub fn remove_with<F>(&mut self, item: &T, destructor: F) -> Result<()>
	where
		F: FnOnce(T),
	{
		let value = self.remove(item)?;
		destructor(value);
		Ok(())
	}

	/// Removes and returns the smallest element.
	pub fn poll_first(&mut self) -> Result<T> {
		let root = self.root.ok_or(Error::Empty)?;
		let id = self.leftmost(root);
		Ok(self.detach(id))
	}

	/// Removes and returns the largest element.
	pub fn poll_last(&mut self) -> Result<T> {
		let root = self.root.ok_or(Error::Empty)?;
		let id = self.rightmost(root);
		Ok(self.detach(id))
	}

	/// Removes every element.
	pub fn clear(&mut self) {
		tracing::debug!(len = self.len(), "clearing tree");
		self.root = None;
		self.arena.clear();
	}

	/// Removes every element, passing each one to `destructor` after the
	/// tree has been emptied. Elements are handed over in no particular order.
	pub fn clear_with<F>(&mut self, destructor: F)
	where
		F: FnMut(T),
	{
		self.take_all().into_values().for_each(destructor);
	}

	/// Unlinks every node at once, leaving the tree empty, and returns the
	/// storage that held them.
	pub(crate) fn take_all(&mut self) -> Arena<T> {
		tracing::debug!(len = self.len(), "detaching all nodes");
		self.root = None;
		std::mem::take(&mut self.arena)
	}

	/// The deletion primitive: unlinks `target`'s element from the tree,
	/// rebalances and returns the element.
	///
	/// A node with two children trades elements with its in-order
	/// predecessor, and the predecessor's node (at most one child) is the one
	/// spliced out.
	fn detach(&mut self, target: NodeId) -> T {
		let mut victim = target;
		if let (Some(left), Some(_)) = (self.arena[target].left, self.arena[target].right) {
			let predecessor = self.rightmost(left);
			self.arena.swap_values(target, predecessor);
			victim = predecessor;
		}

		let node = &self.arena[victim];
		let child = node.left.or(node.right);
		let parent = node.parent;
		let color = node.color;

		if let Some(child) = child {
			self.arena[child].parent = parent;
		}
		self.replace_child(parent, victim, child);

		let value = self.arena.free(victim);
		if color == Color::Black {
			self.delete_fixup(child, parent);
		}
		value
	}

	/// Restores black-height balance after a black node was spliced out.
	///
	/// `node` occupies the spliced position (possibly a missing child) and
	/// carries one unit of extra blackness; `parent` is its parent.
	fn delete_fixup(&mut self, mut node: Option<NodeId>, mut parent: Option<NodeId>) {
		while node != self.root && !self.is_red(node) {
			let Some(p) = parent else {
				break;
			};

			if node == self.arena[p].left {
				let mut sibling = self.sibling_of(p, Direction::Forward);
				if self.arena[sibling].color == Color::Red {
					self.arena[sibling].color = Color::Black;
					self.arena[p].color = Color::Red;
					self.rotate_left(p);
					sibling = self.sibling_of(p, Direction::Forward);
				}

				let (near, far) = (self.arena[sibling].left, self.arena[sibling].right);
				if !self.is_red(near) && !self.is_red(far) {
					self.arena[sibling].color = Color::Red;
					node = Some(p);
					parent = self.arena[p].parent;
				} else {
					if !self.is_red(far) {
						self.set_black(near);
						self.arena[sibling].color = Color::Red;
						self.rotate_right(sibling);
						sibling = self.sibling_of(p, Direction::Forward);
					}
					self.arena[sibling].color = self.arena[p].color;
					self.arena[p].color = Color::Black;
					self.set_black(self.arena[sibling].right);
					self.rotate_left(p);
					node = self.root;
					parent = None;
				}
			} else {
				let mut sibling = self.sibling_of(p, Direction::Reverse);
				if self.arena[sibling].color == Color::Red {
					self.arena[sibling].color = Color::Black;
					self.arena[p].color = Color::Red;
					self.rotate_right(p);
					sibling = self.sibling_of(p, Direction::Reverse);
				}

				let (near, far) = (self.arena[sibling].right, self.arena[sibling].left);
				if !self.is_red(near) && !self.is_red(far) {
					self.arena[sibling].color = Color::Red;
					node = Some(p);
					parent = self.arena[p].parent;
				} else {
					if !self.is_red(far) {
						self.set_black(near);
						self.arena[sibling].color = Color::Red;
						self.rotate_left(sibling);
						sibling = self.sibling_of(p, Direction::Reverse);
					}
					self.arena[sibling].color = self.arena[p].color;
					self.arena[p].color = Color::Black;
					self.set_black(self.arena[sibling].left);
					self.rotate_right(p);
					node = self.root;
					parent = None;
				}
			}
		}

		self.set_black(node);
		self.set_black(self.root);
	}

	// -----------------------------------------------------------------------
	// Rotations and link helpers
	// -----------------------------------------------------------------------

	/// Rotates `x` down to the left; its right child takes its place.
	///
	/// ```text
	///      x               y
	///     / \             / \
	///    a   y    ==>    x   c
	///       / \         / \
	///      b   c       a   b
	/// ```
	fn rotate_left(&mut self, x: NodeId) {
		let y = self.arena[x].right.expect("rotate_left needs a right child");
		let b = self.arena[y].left;

		self.arena[x].right = b;
		if let Some(b) = b {
			self.arena[b].parent = Some(x);
		}

		let parent = self.arena[x].parent;
		self.arena[y].parent = parent;
		self.replace_child(parent, x, Some(y));

		self.arena[y].left = Some(x);
		self.arena[x].parent = Some(y);
	}

	/// Mirror image of [`rotate_left`](Self::rotate_left).
	fn rotate_right(&mut self, x: NodeId) {
		let y = self.arena[x].left.expect("rotate_right needs a left child");
		let b = self.arena[y].right;

		self.arena[x].left = b;
		if let Some(b) = b {
			self.arena[b].parent = Some(x);
		}

		let parent = self.arena[x].parent;
		self.arena[y].parent = parent;
		self.replace_child(parent, x, Some(y));

		self.arena[y].right = Some(x);
		self.arena[x].parent = Some(y);
	}

	/// Points whichever link of `parent` referred to `old` at `new`. A missing
	/// parent means `old` was the root.
	fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
		match parent {
			None => self.root = new,
			Some(p) if self.arena[p].left == Some(old) => self.arena[p].left = new,
			Some(p) => self.arena[p].right = new,
		}
	}

	/// The child of `parent` on the given side, which must exist while a
	/// black-height deficit is being repaired beneath `parent`.
	fn sibling_of(&self, parent: NodeId, side: Direction) -> NodeId {
		let link = match side {
			Direction::Forward => self.arena[parent].right,
			Direction::Reverse => self.arena[parent].left,
		};
		link.expect("doubly black node must have a sibling")
	}

	fn parent_of(&self, id: NodeId) -> NodeId {
		self.arena[id].parent.expect("node below a red parent must have ancestors")
	}

	#[inline]
	fn is_red(&self, link: Option<NodeId>) -> bool {
		link.is_some_and(|id| self.arena[id].color == Color::Red)
	}

	#[inline]
	fn set_black(&mut self, link: Option<NodeId>) {
		if let Some(id) = link {
			self.arena[id].color = Color::Black;
		}
	}

	// -----------------------------------------------------------------------
	// Traversal
	// -----------------------------------------------------------------------

	/// Returns a borrowing iterator over the elements in ascending order.
	pub fn iter(&self) -> Iter<'_, T> {
		Iter::new(&self.arena, self.root)
	}

	/// Copies the elements, in ascending order, into a freshly allocated
	/// [`Snapshot`].
	///
	/// Returns [`Error::Empty`] without allocating if the tree has no
	/// elements, or [`Error::AllocFailure`] if the snapshot cannot be
	/// reserved.
	pub fn snapshot(&self) -> Result<Snapshot<T>>
	where
		T: Clone,
	{
		if self.is_empty() {
			return Err(Error::Empty);
		}
		iter::build_snapshot(self.iter())
	}

	/// Alias of [`snapshot`](Self::snapshot).
	pub fn to_array(&self) -> Result<Snapshot<T>>
	where
		T: Clone,
	{
		self.snapshot()
	}

	/// Consumes the tree, handing every element to `destructor`.
	pub fn destroy_with<F>(mut self, destructor: F)
	where
		F: FnMut(T),
	{
		self.clear_with(destructor);
	}
}

impl<'a, T, C: Comparator<T>> IntoIterator for &'a RawTree<T, C> {
	type Item = &'a T;
	type IntoIter = Iter<'a, T>;

	fn into_iter(self) -> Iter<'a, T> {
		self.iter()
	}
}

impl<T: Ord> FromIterator<T> for RawTree<T, Natural> {
	/// Builds a tree from `iter`, skipping elements equal to one already added.
	///
	/// # Panics
	///
	/// Panics if node storage cannot be allocated, like other infallible
	/// collection constructors.
	fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
		let mut tree = RawTree::default();
		tree.extend(iter);
		tree
	}
}

impl<T: Ord> Extend<T> for RawTree<T, Natural> {
	fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
		for item in iter {
			match self.add(item) {
				Ok(()) | Err(Error::AlreadyExists) => {}
				Err(e) => panic!("failed to extend tree: {}", e),
			}
		}
	}
}

impl<T: fmt::Debug, C: Comparator<T>> fmt::Debug for RawTree<T, C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.iter()).finish()
	}
}

// ===========================================================================
// Test-Only Validation
// ===========================================================================

/// Invariant validation for testing.
#[cfg(any(test, feature = "test-utils"))]
impl<T: fmt::Debug, C: Comparator<T>> RawTree<T, C> {
	/// Validates all tree invariants. Panics with diagnostic info if any
	/// invariant is violated.
	///
	/// # Invariants Checked
	///
	/// 1. Root is black and has no parent
	/// 2. Parent back-links agree with child links
	/// 3. No red node has a red child
	/// 4. Equal black count on every root-to-nil path
	/// 5. In-order traversal strictly ascending
	/// 6. `len()` matches the reachable node count and the arena bookkeeping
	pub fn assert_invariants(&self) {
		let Some(root) = self.root else {
			assert_eq!(self.len(), 0, "Empty tree reports len {}", self.len());
			return;
		};

		assert_eq!(self.arena[root].color, Color::Black, "Root {:?} is red", self.arena[root].value);
		assert_eq!(self.arena[root].parent, None, "Root has a parent link");

		let mut reachable = 0;
		self.validate_node_recursive(root, &mut reachable);
		assert_eq!(reachable, self.len(), "Reachable nodes {} != len {}", reachable, self.len());

		let mut prev: Option<&T> = None;
		for value in self.iter() {
			if let Some(prev) = prev {
				assert_eq!(
					self.cmp.compare(prev, value),
					Ordering::Less,
					"Elements out of order: {:?} then {:?}",
					prev,
					value
				);
			}
			prev = Some(value);
		}

		assert_eq!(
			self.arena.slot_count(),
			self.len() + self.arena.free_list_len(),
			"Arena slots do not add up to live nodes plus free list"
		);
	}

	/// Checks links and colors beneath `id`, returning the subtree's black
	/// height (counting the missing children below the leaves as one).
	fn validate_node_recursive(&self, id: NodeId, reachable: &mut usize) -> usize {
		*reachable += 1;
		let node = &self.arena[id];

		for child in [node.left, node.right].into_iter().flatten() {
			assert_eq!(
				self.arena[child].parent,
				Some(id),
				"Child {:?} does not point back to parent {:?}",
				self.arena[child].value,
				node.value
			);
			if node.color == Color::Red {
				assert_eq!(
					self.arena[child].color,
					Color::Black,
					"Red node {:?} has red child {:?}",
					node.value,
					self.arena[child].value
				);
			}
		}

		let left = node.left.map_or(1, |c| self.validate_node_recursive(c, reachable));
		let right = node.right.map_or(1, |c| self.validate_node_recursive(c, reachable));
		assert_eq!(
			left, right,
			"Black height mismatch under {:?}: left {} right {}",
			node.value, left, right
		);

		left + usize::from(node.color == Color::Black)
	}
}
