//! Allocation fault injection for tests.
//!
//! This module provides a global allocator that forwards to the system
//! allocator but can be told to refuse the next few requests made by the
//! current thread. It exists so tests can drive the
//! [`Error::AllocFailure`](crate::Error::AllocFailure) paths and check that a
//! refused allocation leaves the tree unchanged.
//!
//! # Usage
//!
//! In a test binary that wants to inject failures, use:
//!
//! ```ignore
//! use redfern::alloc::{refuse_next_allocations, FailingAllocator};
//!
//! #[global_allocator]
//! static ALLOC: FailingAllocator = FailingAllocator;
//!
//! #[test]
//! fn add_reports_alloc_failure() {
//!     let mut tree = redfern::RawTree::with_capacity(redfern::Natural, 4).unwrap();
//!     while tree.len() < tree.capacity() {
//!         tree.add(tree.len()).unwrap();
//!     }
//!     let result = {
//!         let _guard = refuse_next_allocations(1);
//!         tree.add(99)
//!     };
//!     assert_eq!(result, Err(redfern::Error::AllocFailure));
//! }
//! ```
//!
//! # Caveats
//!
//! - Only the arming thread is affected, so parallel tests do not interfere.
//! - Refusing a request the standard library treats as infallible aborts the
//!   process. Refuse only as many requests as the code under test makes
//!   through fallible paths; after the budget is spent, allocation resumes
//!   normally even while the guard is alive.
//! - Deallocations and shrinking reallocations are never refused.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::marker::PhantomData;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

thread_local! {
	static BUDGET: Cell<usize> = const { Cell::new(0) };
}

/// Total number of requests refused by this process.
static REFUSED_COUNT: AtomicUsize = AtomicUsize::new(0);

/// A global allocator that fails on demand.
///
/// Forwards to [`System`] unless the calling thread has armed it with
/// [`refuse_next_allocations`].
pub struct FailingAllocator;

/// Consumes one unit of this thread's refusal budget, if any is left.
#[inline]
fn should_refuse() -> bool {
	// During thread teardown the budget may already be gone; allocate normally
	BUDGET
		.try_with(|budget| {
			let left = budget.get();
			if left == 0 {
				return false;
			}
			budget.set(left - 1);
			true
		})
		.unwrap_or(false)
}

#[inline]
fn refuse() -> *mut u8 {
	REFUSED_COUNT.fetch_add(1, Ordering::Relaxed);
	ptr::null_mut()
}

unsafe impl GlobalAlloc for FailingAllocator {
	unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
		if should_refuse() {
			return refuse();
		}
		System.alloc(layout)
	}

	unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
		System.dealloc(ptr, layout)
	}

	unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
		if should_refuse() {
			return refuse();
		}
		System.alloc_zeroed(layout)
	}

	unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
		if new_size > layout.size() && should_refuse() {
			return refuse();
		}
		System.realloc(ptr, layout, new_size)
	}
}

/// Restores the thread's previous refusal budget when dropped.
///
/// `!Send`, since the budget belongs to the creating thread.
#[must_use = "the refusal budget is cleared when the guard drops"]
pub struct RefusalGuard {
	previous: usize,
	_not_send: PhantomData<*const ()>,
}

/// Arms [`FailingAllocator`] to refuse the next `count` allocating requests
/// made by the current thread.
///
/// Has no effect unless `FailingAllocator` is the `#[global_allocator]`.
pub fn refuse_next_allocations(count: usize) -> RefusalGuard {
	let previous = BUDGET.with(|budget| budget.replace(count));
	RefusalGuard {
		previous,
		_not_send: PhantomData,
	}
}

impl RefusalGuard {
	/// Requests still to be refused.
	pub fn remaining(&self) -> usize {
		BUDGET.with(Cell::get)
	}
}

impl Drop for RefusalGuard {
	fn drop(&mut self) {
		BUDGET.with(|budget| budget.set(self.previous));
	}
}

/// Returns how many requests have been refused.
pub fn refused_count() -> usize {
	REFUSED_COUNT.load(Ordering::SeqCst)
}
