//! # Error Types for the Ordered Set
//!
//! Every fallible operation in this crate reports its outcome through
//! [`Result`]. `Ok(..)` plays the role of a success status; each variant of
//! [`Error`] is one of the non-success statuses a caller may branch on.
//!
//! ## Error Classes
//!
//! ```text
//! Operation starts
//!      │
//!      ├──► tree has no elements ─────────────► Err(Empty)
//!      │
//!      ├──► logical outcome (dup / miss / end) ► Err(AlreadyExists | NotFound | IterEnd)
//!      │
//!      ├──► arena or snapshot growth refused ──► Err(AllocFailure), state untouched
//!      │
//!      ▼
//! Structural change + fixup run to completion
//!      │
//!      ▼
//!     Ok(..)
//! ```
//!
//! None of these are retried internally. Logical errors are part of ordinary
//! control flow; `AllocFailure` is raised before any link is rewritten, so the
//! tree is always left in its last consistent state.

use std::collections::TryReserveError;

use thiserror::Error;

/// Errors returned by tree, snapshot and iterator operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
	/// An element comparing equal to the one being added is already present.
	#[error("an equal element is already present")]
	AlreadyExists,

	/// The operation needs at least one element but the set is empty.
	///
	/// Checked before any tree logic runs, so it takes precedence over
	/// [`Error::NotFound`].
	#[error("the set is empty")]
	Empty,

	/// No element satisfies the query.
	///
	/// Returned by `remove` for an absent element and by the range queries
	/// (`floor`, `ceiling`, `lower`, `higher`) when no candidate exists.
	#[error("no matching element")]
	NotFound,

	/// A positional access fell outside `0..len`.
	#[error("index {index} out of range for length {len}")]
	InvalidIndex {
		/// The requested position.
		index: usize,
		/// The length of the sequence that was indexed.
		len: usize,
	},

	/// The iterator has already yielded every element.
	#[error("iterator exhausted")]
	IterEnd,

	/// Storage for a node or a snapshot could not be reserved.
	#[error("allocation failed")]
	AllocFailure,
}

impl From<TryReserveError> for Error {
	fn from(_: TryReserveError) -> Self {
		Error::AllocFailure
	}
}

/// A Result type alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
