//! Index-addressed node storage.
//!
//! Nodes of the red-black tree refer to each other (children and parent)
//! through [`NodeId`]s into a single [`Arena`] rather than through pointers.
//! The arena owns every node; the tree owns the arena. Removed slots are
//! threaded onto a free list and handed out again by later insertions.
//!
//! ```text
//!  slots: [ Occupied(5) | Vacant(None) | Occupied(3) | Vacant(Some(1)) ]
//!                               ▲                            │
//!                               └────────────────────────────┘
//!  free ──────────────────────────────────────────────────────► 3
//! ```
//!
//! Growth is fallible: [`Arena::alloc`] reserves room before it writes, so a
//! refused allocation surfaces as [`Error::AllocFailure`] with the arena (and
//! the tree around it) unchanged.

use std::fmt;
use std::mem;
use std::ops::{Index, IndexMut};

use crate::error::{Error, Result};

/// Position of a node inside an [`Arena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

impl fmt::Debug for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Node color for red-black balancing. A missing child counts as black.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Color {
	Red,
	Black,
}

/// A tree node. Links are arena indices; `parent` is a back-reference only.
#[derive(Debug)]
pub(crate) struct Node<T> {
	pub(crate) value: T,
	pub(crate) color: Color,
	pub(crate) parent: Option<NodeId>,
	pub(crate) left: Option<NodeId>,
	pub(crate) right: Option<NodeId>,
}

impl<T> Node<T> {
	/// A fresh red leaf, as created by insertion.
	pub(crate) fn leaf(value: T, parent: Option<NodeId>) -> Node<T> {
		Node {
			value,
			color: Color::Red,
			parent,
			left: None,
			right: None,
		}
	}
}

enum Slot<T> {
	Occupied(Node<T>),
	/// Holds the next vacant slot of the free list.
	Vacant(Option<NodeId>),
}

/// Slab of nodes with a free list of vacant slots.
pub(crate) struct Arena<T> {
	slots: Vec<Slot<T>>,
	free: Option<NodeId>,
	len: usize,
}

impl<T> Default for Arena<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Arena<T> {
	pub(crate) const fn new() -> Arena<T> {
		Arena {
			slots: Vec::new(),
			free: None,
			len: 0,
		}
	}

	/// Creates an arena with room for `capacity` nodes.
	pub(crate) fn try_with_capacity(capacity: usize) -> Result<Arena<T>> {
		let mut arena = Arena::new();
		arena.slots.try_reserve_exact(capacity).map_err(|e| {
			tracing::warn!(capacity, "arena preallocation refused");
			Error::from(e)
		})?;
		Ok(arena)
	}

	/// Number of occupied slots.
	#[inline]
	pub(crate) fn len(&self) -> usize {
		self.len
	}

	/// Total number of nodes the arena can hold without growing, counting
	/// occupied slots.
	pub(crate) fn capacity(&self) -> usize {
		self.slots.capacity()
	}

	#[inline]
	fn vacant(&self) -> usize {
		self.slots.len() - self.len
	}

	/// Ensures the next `additional` allocations cannot fail.
	pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<()> {
		let needed = additional.saturating_sub(self.vacant());
		if needed == 0 {
			return Ok(());
		}
		self.slots.try_reserve(needed).map_err(|e| {
			tracing::warn!(additional, "arena reservation refused");
			Error::from(e)
		})
	}

	/// Stores `node`, reusing a vacant slot when one exists.
	///
	/// Nothing is modified when growing the slot vector fails.
	pub(crate) fn alloc(&mut self, node: Node<T>) -> Result<NodeId> {
		if let Some(id) = self.free {
			let slot = mem::replace(&mut self.slots[id.0], Slot::Occupied(node));
			match slot {
				Slot::Vacant(next) => self.free = next,
				Slot::Occupied(_) => unreachable!("free list points at an occupied slot"),
			}
			self.len += 1;
			return Ok(id);
		}

		if self.slots.len() == self.slots.capacity() {
			self.slots.try_reserve(1).map_err(|e| {
				tracing::warn!(len = self.len, "node allocation refused");
				Error::from(e)
			})?;
		}
		let id = NodeId(self.slots.len());
		self.slots.push(Slot::Occupied(node));
		self.len += 1;
		Ok(id)
	}

	/// Vacates the slot of `id` and returns the element it held.
	pub(crate) fn free(&mut self, id: NodeId) -> T {
		let slot = mem::replace(&mut self.slots[id.0], Slot::Vacant(self.free));
		match slot {
			Slot::Occupied(node) => {
				self.free = Some(id);
				self.len -= 1;
				node.value
			}
			Slot::Vacant(_) => unreachable!("double free of arena slot {:?}", id),
		}
	}

	/// Exchanges the elements stored in two distinct nodes, leaving links and
	/// colors in place.
	pub(crate) fn swap_values(&mut self, a: NodeId, b: NodeId) {
		debug_assert_ne!(a, b);
		let (lo, hi) = if a.0 < b.0 {
			(a.0, b.0)
		} else {
			(b.0, a.0)
		};
		let (head, tail) = self.slots.split_at_mut(hi);
		match (&mut head[lo], &mut tail[0]) {
			(Slot::Occupied(x), Slot::Occupied(y)) => mem::swap(&mut x.value, &mut y.value),
			_ => unreachable!("value swap on a vacant slot"),
		}
	}

	/// Drops every node but keeps the slot vector's allocation.
	pub(crate) fn clear(&mut self) {
		self.slots.clear();
		self.free = None;
		self.len = 0;
	}

	/// Consumes the arena, yielding the stored elements in slot order.
	pub(crate) fn into_values(self) -> impl Iterator<Item = T> {
		self.slots.into_iter().filter_map(|slot| match slot {
			Slot::Occupied(node) => Some(node.value),
			Slot::Vacant(_) => None,
		})
	}

	/// Length of the free list, walked link by link.
	#[cfg(any(test, feature = "test-utils"))]
	pub(crate) fn free_list_len(&self) -> usize {
		let mut count = 0;
		let mut cursor = self.free;
		while let Some(id) = cursor {
			match self.slots[id.0] {
				Slot::Vacant(next) => cursor = next,
				Slot::Occupied(_) => panic!("free list reaches occupied slot {:?}", id),
			}
			count += 1;
		}
		count
	}

	/// Total slot count, occupied or not.
	#[cfg(any(test, feature = "test-utils"))]
	pub(crate) fn slot_count(&self) -> usize {
		self.slots.len()
	}
}

impl<T> Index<NodeId> for Arena<T> {
	type Output = Node<T>;

	#[inline]
	fn index(&self, id: NodeId) -> &Node<T> {
		match &self.slots[id.0] {
			Slot::Occupied(node) => node,
			Slot::Vacant(_) => unreachable!("link to vacant arena slot {:?}", id),
		}
	}
}

impl<T> IndexMut<NodeId> for Arena<T> {
	#[inline]
	fn index_mut(&mut self, id: NodeId) -> &mut Node<T> {
		match &mut self.slots[id.0] {
			Slot::Occupied(node) => node,
			Slot::Vacant(_) => unreachable!("link to vacant arena slot {:?}", id),
		}
	}
}
