//! Binary search over the sorted entry vector.
//!
//! Both searches share one recursive halving routine over the half-open
//! range `entries[lo..hi]`. The midpoint rounds toward `lo`, so every step
//! strictly shrinks the range and the recursion terminates. An empty range
//! is the base case and touches no element.

use std::cmp::Ordering;

use super::{Entry, SearchKey};

/// Halving search over `entries[lo..hi]`.
///
/// Returns `Ok(i)` if `entries[i].key == key`, otherwise `Err(i)` where `i`
/// is the position at which `key` would have to be inserted to keep the
/// slice sorted (`lo <= i <= hi`).
fn search_range(entries: &[Entry], lo: usize, hi: usize, key: SearchKey) -> Result<usize, usize> {
    if lo >= hi {
        return Err(lo);
    }

    let mid = lo + (hi - lo) / 2;
    match entries[mid].key.cmp(&key) {
        Ordering::Equal => Ok(mid),
        Ordering::Greater => search_range(entries, lo, mid, key),
        Ordering::Less => search_range(entries, mid + 1, hi, key),
    }
}

/// Exact-match search. `None` means the key is not present.
pub(super) fn find_exact(entries: &[Entry], key: SearchKey) -> Option<usize> {
    search_range(entries, 0, entries.len(), key).ok()
}

/// Insertion-point search.
///
/// Returns the index of the entry holding `key` if there is one, otherwise
/// the smallest index at which a new entry keeps the vector sorted. The
/// result is always in `0..=entries.len()`; `entries.len()` means append.
pub(super) fn insertion_point(entries: &[Entry], key: SearchKey) -> usize {
    match search_range(entries, 0, entries.len(), key) {
        Ok(pos) | Err(pos) => pos,
    }
}
