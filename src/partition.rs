//! Contiguous range partitioning of the work array.
//!
//! Splits `[0, len-1]` into `shares` inclusive ranges using integer
//! division, so share sizes differ by at most one element when `len` is not
//! divisible by `shares`. The last range belongs to the coordinator; the
//! others are handed to forked workers.

use serde::Serialize;

/// An inclusive index range into the work array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexRange {
    /// First index covered by this range.
    pub start: usize,
    /// Last index covered by this range (inclusive).
    pub end: usize,
}

impl IndexRange {
    /// Number of elements covered.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for IndexRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Split `[0, len-1]` into `shares` contiguous, non-overlapping ranges.
///
/// Share `i` covers `i*len/shares ..= (i+1)*len/shares - 1`. For
/// `1 <= shares <= len` the ranges are all non-empty and their union covers
/// the whole interval exactly once. Callers validate the bounds; inputs with
/// `shares > len` are not meaningful here.
pub fn partition(len: usize, shares: usize) -> Vec<IndexRange> {
    (0..shares)
        .map(|i| IndexRange {
            start: i * len / shares,
            end: (i + 1) * len / shares - 1,
        })
        .collect()
}
