//! Ordered insertion and lookup in comparator-sorted slices.
//!
//! None of these loop or panic when the comparator is not a consistent order;
//! the resulting positions are then merely arbitrary.

use std::cmp::Ordering;

/// Binary search for `key`: `Ok(idx)` if an equal element exists,
/// `Err(idx)` with the position it would be inserted at otherwise.
pub fn search<T, K: ?Sized>(
    list: &[T],
    key: &K,
    mut cmp: impl FnMut(&T, &K) -> Ordering,
) -> Result<usize, usize> {
    list.binary_search_by(|entry| cmp(entry, key))
}

/// Position after every element that does not sort after `key`, so that
/// equal elements keep their arrival order.
pub fn insertion_point<T, K: ?Sized>(
    list: &[T],
    key: &K,
    mut cmp: impl FnMut(&T, &K) -> Ordering,
) -> usize {
    list.partition_point(|entry| cmp(entry, key) != Ordering::Greater)
}

/// Finds the element for which `is_same` holds.
///
/// The run of elements comparing equal to `key` is searched first; if the
/// element is not in there (its sort key went stale) the whole slice is
/// scanned.
pub fn locate<T, K: ?Sized>(
    list: &[T],
    key: &K,
    mut cmp: impl FnMut(&T, &K) -> Ordering,
    mut is_same: impl FnMut(&T) -> bool,
) -> Option<usize> {
    let lo = list.partition_point(|entry| cmp(entry, key) == Ordering::Less);
    let hi = list.partition_point(|entry| cmp(entry, key) != Ordering::Greater);

    if lo < hi {
        if let Some(offset) = list[lo..hi].iter().position(&mut is_same) {
            return Some(lo + offset);
        }
    }

    list.iter().position(is_same)
}

/// Stable binary insertion sort.
///
/// Unlike `slice::sort_by` this never panics on inconsistent comparators, and
/// an already sorted list costs O(n log n) comparisons and no moves.
pub fn sort_stable<T>(list: &mut Vec<T>, mut cmp: impl FnMut(&T, &T) -> Ordering) {
    let mut sorted: Vec<T> = Vec::with_capacity(list.len());
    for item in list.drain(..) {
        let at = insertion_point(&sorted, &item, &mut cmp);
        sorted.insert(at, item);
    }
    *list = sorted;
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
