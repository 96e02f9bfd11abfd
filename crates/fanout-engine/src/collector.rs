//! Reassembly of partition outputs into one logical array

use crate::partitioner::PartitionTable;
use crate::workloads::PartitionWork;
use fanout_interfaces::Element;
use fanout_types::{FanoutError, Partition, Result};

/// The whole problem domain, gathered from every context
#[derive(Debug, Clone)]
pub struct LogicalArray<T> {
    data: Vec<T>,
    stride: usize,
    table: PartitionTable,
}

/// One partition's slice of a [`LogicalArray`]
#[derive(Debug, Clone, Copy)]
pub struct SliceView<'a, T> {
    pub partition: Partition,
    pub data: &'a [T],
}

impl<T: Element> LogicalArray<T> {
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Number of output elements (domain size times stride)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.data.get(index).copied()
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Index of the partition that wrote output element `index`
    pub fn owner_of(&self, index: usize) -> Option<usize> {
        if self.stride == 0 {
            return None;
        }
        self.table.owner_of(index / self.stride)
    }

    /// Output elements owned by partition `index`
    pub fn slice(&self, index: usize) -> Option<SliceView<'_, T>> {
        let partition = *self.table.get(index)?;
        let start = partition.start * self.stride;
        let end = partition.end * self.stride;
        Some(SliceView {
            partition,
            data: &self.data[start..end],
        })
    }
}

/// Read every partition's output back and concatenate in index order.
///
/// `work` must be in partition order and match `table` exactly.
pub fn gather<T: Element>(
    work: &[PartitionWork<T>],
    table: &PartitionTable,
    stride: usize,
) -> Result<LogicalArray<T>> {
    if work.len() != table.len() {
        return Err(FanoutError::internal(format!(
            "gathering {} partitions against a table of {}",
            work.len(),
            table.len()
        )));
    }

    let mut data = Vec::with_capacity(table.total() * stride);
    for (w, expected) in work.iter().zip(table.iter()) {
        if w.partition != *expected {
            return Err(FanoutError::internal(format!(
                "partition {} out of order, expected {}",
                w.partition, expected
            )));
        }
        let slice = w.output.to_host();
        if slice.len() != expected.len() * stride {
            return Err(FanoutError::internal(format!(
                "partition {} returned {} elements, expected {}",
                expected,
                slice.len(),
                expected.len() * stride
            )));
        }
        data.extend(slice);
    }

    Ok(LogicalArray {
        data,
        stride,
        table: table.clone(),
    })
}
