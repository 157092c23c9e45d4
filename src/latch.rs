//! Re-entrant exclusive latch guarding one tree.
//!
//! A [`Latch`] pairs a `parking_lot::ReentrantMutex` with a `RefCell`: the
//! mutex gives one thread at a time access to the data, the cell hands out
//! shared or mutable borrows to that thread. Because the mutex is
//! re-entrant, a thread that already holds the latch (for instance through a
//! [`LockedIter`](crate::LockedIter), or while holding two latches for a
//! two-instance operation) can lock it again without deadlocking itself.
//!
//! ```text
//!   thread A                              thread B
//!   ────────                              ────────
//!   lock() ──► guard#1                    lock() ... blocks
//!   lock() ──► guard#2   (re-entrant)           .
//!   drop(guard#2)                               .
//!   drop(guard#1) ──► released ───────────► guard
//! ```
//!
//! Borrows taken through a guard must not overlap mutably on the same
//! thread; a nested `borrow_mut` while another borrow is alive panics. The
//! set's methods release their borrow before running any user callback that
//! could re-enter the set.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// A re-entrant lock around `T`.
pub struct Latch<T> {
	lock: ReentrantMutex<RefCell<T>>,
}

impl<T> Latch<T> {
	/// Creates a new, unlocked latch.
	#[inline]
	pub fn new(data: T) -> Latch<T> {
		Latch {
			lock: ReentrantMutex::new(RefCell::new(data)),
		}
	}

	/// Acquires the latch, blocking until it is available.
	///
	/// Returns immediately if the current thread already holds it.
	#[inline]
	pub fn lock(&self) -> LatchGuard<'_, T> {
		LatchGuard {
			guard: self.lock.lock(),
		}
	}

	/// Acquires the latch only if no other thread holds it.
	#[inline]
	pub fn try_lock(&self) -> Option<LatchGuard<'_, T>> {
		self.lock.try_lock().map(|guard| LatchGuard {
			guard,
		})
	}

	/// Returns `true` if any thread currently holds the latch.
	#[inline]
	pub fn is_locked(&self) -> bool {
		self.lock.is_locked()
	}

	/// Returns `true` if the calling thread holds the latch.
	#[inline]
	pub fn is_owned_by_current_thread(&self) -> bool {
		self.lock.is_owned_by_current_thread()
	}

	/// Consumes the latch, returning the data.
	#[inline]
	pub fn into_inner(self) -> T {
		self.lock.into_inner().into_inner()
	}
}

impl<T> fmt::Debug for Latch<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Latch").field("locked", &self.is_locked()).finish_non_exhaustive()
	}
}

/// RAII guard releasing the latch when dropped.
///
/// `!Send`: the latch must be released on the thread that acquired it.
pub struct LatchGuard<'a, T> {
	guard: ReentrantMutexGuard<'a, RefCell<T>>,
}

impl<'a, T> LatchGuard<'a, T> {
	/// Shared access to the guarded data.
	///
	/// # Panics
	///
	/// Panics if the current thread holds a mutable borrow of the same data.
	#[inline]
	pub fn borrow(&self) -> Ref<'_, T> {
		self.guard.borrow()
	}

	/// Mutable access to the guarded data.
	///
	/// # Panics
	///
	/// Panics if the current thread holds any other borrow of the same data.
	#[inline]
	pub fn borrow_mut(&self) -> RefMut<'_, T> {
		self.guard.borrow_mut()
	}
}

/// Acquires two latches in a single global order (by address) so that
/// concurrent calls locking the same pair in opposite argument order cannot
/// deadlock. Guards are returned in argument order.
///
/// Passing the same latch twice locks it twice, which the re-entrant mutex
/// permits.
pub fn lock_pair<'a, T>(a: &'a Latch<T>, b: &'a Latch<T>) -> (LatchGuard<'a, T>, LatchGuard<'a, T>) {
	if (a as *const Latch<T>) <= (b as *const Latch<T>) {
		let first = a.lock();
		let second = b.lock();
		(first, second)
	} else {
		let second = b.lock();
		let first = a.lock();
		(first, second)
	}
}
