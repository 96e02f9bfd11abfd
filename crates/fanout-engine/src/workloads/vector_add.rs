//! Element-wise integer vector addition

use super::{allocate_output, take_inputs, PartitionWork, Workload};
use crate::context::ExecutionContext;
use crate::partitioner::PartitionTable;
use fanout_interfaces::{BufferBinding, KernelJob};
use fanout_types::{AccessMode, ContextId, FanoutError, Partition, Result};

/// `sum[i] = a[i] + b[i]` with `a[i] = b[i] = i`
#[derive(Debug, Clone)]
pub struct VectorAdd {
    size: usize,
}

impl VectorAdd {
    pub const KERNEL: &'static str = "vector_add";

    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl Workload for VectorAdd {
    type Element = i32;

    fn name(&self) -> &str {
        Self::KERNEL
    }

    fn domain_size(&self) -> usize {
        self.size
    }

    fn validate(&self) -> Result<()> {
        // the largest sum is 2 * (size - 1)
        if self.size > (i32::MAX as usize) / 2 + 1 {
            return Err(FanoutError::invalid_parameter(format!(
                "vector size {} overflows 32-bit sums",
                self.size
            )));
        }
        Ok(())
    }

    fn prepare(
        &self,
        context: &ExecutionContext,
        partition: &Partition,
    ) -> Result<PartitionWork<i32>> {
        let start = partition.start;
        let value = |i: usize| (start + i) as i32;
        let a = context.upload_with(partition.len(), AccessMode::ReadOnly, value)?;
        let b = context.upload_with(partition.len(), AccessMode::ReadOnly, value)?;
        let output = allocate_output(context, partition, 1, AccessMode::WriteOnly)?;
        Ok(PartitionWork {
            partition: *partition,
            context: context.id(),
            inputs: vec![a, b],
            output,
        })
    }

    fn kernel(
        &self,
        partition: &Partition,
        _context: ContextId,
        inputs: Vec<BufferBinding<i32>>,
        output: BufferBinding<i32>,
    ) -> Result<KernelJob> {
        let [a, b] = take_inputs(Self::KERNEL, inputs)?;
        Ok(KernelJob::new(Self::KERNEL, partition.len(), move || {
            let a = a.read()?;
            let b = b.read()?;
            let mut sum = output.write()?;
            for ((s, x), y) in sum.iter_mut().zip(a.iter()).zip(b.iter()) {
                *s = x + y;
            }
            Ok(())
        }))
    }

    fn expected(&self, index: usize, _rounds: usize, _table: &PartitionTable) -> i32 {
        2 * index as i32
    }
}
