//! Per-partition fill, used to check that partitions never write across
//! their boundaries

use super::{allocate_output, PartitionWork, Workload};
use crate::context::ExecutionContext;
use crate::partitioner::PartitionTable;
use fanout_interfaces::{BufferBinding, KernelJob};
use fanout_types::{AccessMode, ContextId, Partition, Result};

/// Every partition writes its own index into its slice
#[derive(Debug, Clone)]
pub struct Fill {
    size: usize,
}

impl Fill {
    pub const KERNEL: &'static str = "fill";

    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl Workload for Fill {
    type Element = i32;

    fn name(&self) -> &str {
        Self::KERNEL
    }

    fn domain_size(&self) -> usize {
        self.size
    }

    fn prepare(
        &self,
        context: &ExecutionContext,
        partition: &Partition,
    ) -> Result<PartitionWork<i32>> {
        Ok(PartitionWork {
            partition: *partition,
            context: context.id(),
            inputs: Vec::new(),
            output: allocate_output(context, partition, 1, AccessMode::WriteOnly)?,
        })
    }

    fn kernel(
        &self,
        partition: &Partition,
        _context: ContextId,
        _inputs: Vec<BufferBinding<i32>>,
        output: BufferBinding<i32>,
    ) -> Result<KernelJob> {
        let value = partition.index as i32;
        Ok(KernelJob::new(Self::KERNEL, partition.len(), move || {
            output.write()?.fill(value);
            Ok(())
        }))
    }

    fn expected(&self, index: usize, _rounds: usize, table: &PartitionTable) -> i32 {
        table.owner_of(index).map(|owner| owner as i32).unwrap_or(-1)
    }
}
