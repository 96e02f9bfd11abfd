//! Read-write accumulation over repeated rounds

use super::{allocate_output, take_inputs, PartitionWork, Workload};
use crate::context::ExecutionContext;
use crate::partitioner::PartitionTable;
use fanout_interfaces::{BufferBinding, KernelJob};
use fanout_types::{AccessMode, ContextId, FanoutError, Partition, Result};

/// `out[i] += b[i]`, `passes` times per launch, with `b[i] = i`.
///
/// The output is read-write and carries over between rounds, so after `r`
/// rounds `out[i] = r * passes * i`. Kernels are named after the context
/// that runs them (`accumulate1`, `accumulate2`, ...) so their timings can
/// be told apart.
#[derive(Debug, Clone)]
pub struct Accumulate {
    size: usize,
    passes: usize,
}

impl Accumulate {
    pub const KERNEL: &'static str = "accumulate";

    pub fn new(size: usize, passes: usize) -> Self {
        Self { size, passes }
    }

    pub fn kernel_name(context: ContextId) -> String {
        format!("{}{}", Self::KERNEL, context.index() + 1)
    }
}

impl Workload for Accumulate {
    type Element = i64;

    fn name(&self) -> &str {
        Self::KERNEL
    }

    fn domain_size(&self) -> usize {
        self.size
    }

    fn validate(&self) -> Result<()> {
        if self.passes == 0 {
            return Err(FanoutError::invalid_parameter(
                "accumulate needs at least one pass per launch",
            ));
        }
        Ok(())
    }

    fn prepare(
        &self,
        context: &ExecutionContext,
        partition: &Partition,
    ) -> Result<PartitionWork<i64>> {
        let start = partition.start;
        let b = context.upload_with(partition.len(), AccessMode::ReadOnly, |i| {
            (start + i) as i64
        })?;
        Ok(PartitionWork {
            partition: *partition,
            context: context.id(),
            inputs: vec![b],
            output: allocate_output(context, partition, 1, AccessMode::ReadWrite)?,
        })
    }

    fn kernel(
        &self,
        partition: &Partition,
        context: ContextId,
        inputs: Vec<BufferBinding<i64>>,
        output: BufferBinding<i64>,
    ) -> Result<KernelJob> {
        let [b] = take_inputs(Self::KERNEL, inputs)?;
        let passes = self.passes;
        Ok(KernelJob::new(Self::kernel_name(context), partition.len(), move || {
            let b = b.read()?;
            let mut out = output.write()?;
            for _ in 0..passes {
                for (o, x) in out.iter_mut().zip(b.iter()) {
                    *o = o.wrapping_add(*x);
                }
            }
            Ok(())
        }))
    }

    fn expected(&self, index: usize, rounds: usize, _table: &PartitionTable) -> i64 {
        (rounds * self.passes) as i64 * index as i64
    }
}
