//! Workload partitioning
//!
//! Splits a logical domain `[0, total)` into one contiguous range per
//! execution context. Ranges are ordered, disjoint and cover the domain;
//! the last range absorbs the remainder of the division.

use fanout_types::{FanoutError, Partition, Result};

/// Split `[0, total)` across `count` contexts.
///
/// Every context but the last gets `total / count` elements and the last
/// gets the remainder on top. When there are more contexts than elements,
/// the first `total` contexts get one element each and the rest get empty
/// ranges at `total`.
pub fn partition(total: usize, count: usize) -> Result<Vec<Partition>> {
    if count == 0 {
        return Err(FanoutError::invalid_parameter(
            "cannot partition across zero contexts",
        ));
    }

    if count > total {
        return Ok((0..count)
            .map(|i| {
                if i < total {
                    Partition::new(i, i, i + 1)
                } else {
                    Partition::empty(i, total)
                }
            })
            .collect());
    }

    let base = total / count;
    let remainder = total % count;
    Ok((0..count)
        .map(|i| {
            let start = i * base;
            let len = if i == count - 1 { base + remainder } else { base };
            Partition::new(i, start, start + len)
        })
        .collect())
}

/// Split across groups first (root devices) and then within each group
/// (its sub-devices), both with [`partition`]. Partition indices are
/// renumbered in group order.
pub fn hierarchical(total: usize, group_sizes: &[usize]) -> Result<Vec<Partition>> {
    if group_sizes.iter().any(|&n| n == 0) {
        return Err(FanoutError::invalid_parameter(
            "every device group needs at least one context",
        ));
    }

    let outer = partition(total, group_sizes.len())?;
    let mut partitions = Vec::with_capacity(group_sizes.iter().sum());
    for (group, &size) in outer.iter().zip(group_sizes) {
        for inner in partition(group.len(), size)? {
            partitions.push(Partition::new(
                partitions.len(),
                group.start + inner.start,
                group.start + inner.end,
            ));
        }
    }
    Ok(partitions)
}

/// An ordered partition table covering `[0, total)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionTable {
    total: usize,
    partitions: Vec<Partition>,
}

impl PartitionTable {
    pub fn flat(total: usize, count: usize) -> Result<Self> {
        Self::from_partitions(total, partition(total, count)?)
    }

    pub fn hierarchical(total: usize, group_sizes: &[usize]) -> Result<Self> {
        Self::from_partitions(total, hierarchical(total, group_sizes)?)
    }

    /// Build a table, checking that the ranges tile `[0, total)` in order
    pub fn from_partitions(total: usize, partitions: Vec<Partition>) -> Result<Self> {
        let mut cursor = 0;
        for (position, p) in partitions.iter().enumerate() {
            if p.index != position {
                return Err(FanoutError::internal(format!(
                    "partition {} is at position {}",
                    p, position
                )));
            }
            if p.start != cursor {
                return Err(FanoutError::internal(format!(
                    "partition {} leaves a gap or overlap at {}",
                    p, cursor
                )));
            }
            cursor = p.end;
        }
        if cursor != total {
            return Err(FanoutError::internal(format!(
                "partitions cover [0, {}) instead of [0, {})",
                cursor, total
            )));
        }
        Ok(Self { total, partitions })
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Partition> {
        self.partitions.get(index)
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Partition> {
        self.partitions.iter()
    }

    /// Index of the partition containing domain index `index`
    pub fn owner_of(&self, index: usize) -> Option<usize> {
        if index >= self.total {
            return None;
        }
        let candidate = self.partitions.partition_point(|p| p.end <= index);
        self.partitions
            .get(candidate)
            .filter(|p| p.contains(index))
            .map(|p| p.index)
    }

    /// Difference between the longest and shortest partition
    pub fn imbalance(&self) -> usize {
        let lens = self.partitions.iter().map(Partition::len);
        match (lens.clone().max(), lens.min()) {
            (Some(max), Some(min)) => max - min,
            _ => 0,
        }
    }
}
