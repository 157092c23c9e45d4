//! Comparator strategies.
//!
//! A tree orders its elements with a [`Comparator`] supplied at construction.
//! The comparator must define a strict total order and must keep answering
//! the same way for as long as the tree holds elements; a comparator that
//! changes its mind corrupts the tree's ordering without any runtime check.

use std::cmp::Ordering;
use std::fmt;

/// A total order over `T`.
///
/// Implemented for [`Natural`] (delegates to [`Ord`]) and for any
/// `Fn(&T, &T) -> Ordering`, so closures can be passed directly:
///
/// ```
/// use redfern::RawTree;
///
/// let mut tree = RawTree::new(|a: &i32, b: &i32| b.cmp(a));
/// tree.add(1).unwrap();
/// tree.add(2).unwrap();
/// assert_eq!(tree.first(), Ok(&2));
/// ```
pub trait Comparator<T: ?Sized> {
	/// Returns the relative order of `a` and `b`.
	fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// The natural ordering of `T` as given by its [`Ord`] implementation.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Natural;

impl fmt::Debug for Natural {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Natural")
	}
}

impl<T: Ord + ?Sized> Comparator<T> for Natural {
	#[inline]
	fn compare(&self, a: &T, b: &T) -> Ordering {
		a.cmp(b)
	}
}

impl<T: ?Sized, F> Comparator<T> for F
where
	F: Fn(&T, &T) -> Ordering,
{
	#[inline]
	fn compare(&self, a: &T, b: &T) -> Ordering {
		self(a, b)
	}
}

/// Reverses the order produced by another comparator.
#[derive(Clone, Copy, Debug, Default)]
pub struct Reverse<C>(pub C);

impl<T: ?Sized, C: Comparator<T>> Comparator<T> for Reverse<C> {
	#[inline]
	fn compare(&self, a: &T, b: &T) -> Ordering {
		self.0.compare(b, a)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn natural_follows_ord() {
		assert_eq!(Natural.compare(&1, &2), Ordering::Less);
		assert_eq!(Natural.compare(&2, &2), Ordering::Equal);
		assert_eq!(Natural.compare("b", "a"), Ordering::Greater);
	}

	#[test]
	fn closures_are_comparators() {
		let by_len = |a: &&str, b: &&str| a.len().cmp(&b.len());
		assert_eq!(by_len.compare(&"aa", &"b"), Ordering::Greater);
	}

	#[test]
	fn reverse_flips_order() {
		assert_eq!(Reverse(Natural).compare(&1, &2), Ordering::Greater);
		assert_eq!(Reverse(Natural).compare(&3, &3), Ordering::Equal);
	}
}
