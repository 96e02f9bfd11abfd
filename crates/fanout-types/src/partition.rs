//! Workload partition ranges

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// A contiguous half-open range `[start, end)` of the logical problem domain.
///
/// `index` is the position of the partition in its table, which is also the
/// index of the execution context it is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Partition {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl Partition {
    /// Create a partition; `end` must not precede `start`
    pub fn new(index: usize, start: usize, end: usize) -> Self {
        debug_assert!(
            end >= start,
            "partition #{} ends at {} before it starts at {}",
            index,
            end,
            start
        );
        Self { index, start, end }
    }

    /// An empty range `[at, at)`
    pub fn empty(index: usize, at: usize) -> Self {
        Self {
            index,
            start: at,
            end: at,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }

    /// Scale the range by a fixed number of elements per domain index
    /// (rows of a matrix, for instance)
    pub fn scaled(&self, stride: usize) -> Range<usize> {
        self.start * stride..self.end * stride
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} [{}, {})", self.index, self.start, self.end)
    }
}
