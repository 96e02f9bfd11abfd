//! Kernel payloads
//!
//! A [`Workload`] knows how to size the problem domain, allocate and
//! initialise the buffers of one partition, build the kernel for it and
//! compute the expected value of any output element. The distribution
//! machinery treats workloads as interchangeable.

pub mod accumulate;
pub mod fill;
pub mod matmul;
pub mod vector_add;

pub use accumulate::Accumulate;
pub use fill::Fill;
pub use matmul::MatMul;
pub use vector_add::VectorAdd;

use crate::context::ExecutionContext;
use crate::partitioner::PartitionTable;
use fanout_interfaces::{Buffer, BufferBinding, Element, KernelJob};
use fanout_types::{AccessMode, ContextId, FanoutError, Partition, Result};

/// Buffers of one partition on its context
pub struct PartitionWork<T: Element> {
    pub partition: Partition,
    pub context: ContextId,
    pub inputs: Vec<Buffer<T>>,
    pub output: Buffer<T>,
}

impl<T: Element> PartitionWork<T> {
    /// Total bytes reserved for this partition
    pub fn size_bytes(&self) -> usize {
        self.inputs.iter().map(Buffer::size_bytes).sum::<usize>() + self.output.size_bytes()
    }
}

/// An interchangeable kernel payload
pub trait Workload: Send + Sync {
    type Element: Element;

    /// Name used in reports
    fn name(&self) -> &str;

    /// Number of domain indices to partition
    fn domain_size(&self) -> usize;

    /// Output elements per domain index
    fn output_stride(&self) -> usize {
        1
    }

    /// Reject parameters the workload cannot compute correctly
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Allocate and initialise the buffers of one partition
    fn prepare(
        &self,
        context: &ExecutionContext,
        partition: &Partition,
    ) -> Result<PartitionWork<Self::Element>>;

    /// Build the kernel computing one partition
    fn kernel(
        &self,
        partition: &Partition,
        context: ContextId,
        inputs: Vec<BufferBinding<Self::Element>>,
        output: BufferBinding<Self::Element>,
    ) -> Result<KernelJob>;

    /// Expected value of output element `index` after `rounds` rounds
    fn expected(&self, index: usize, rounds: usize, table: &PartitionTable) -> Self::Element;
}

/// Destructure a fixed number of kernel inputs
pub(crate) fn take_inputs<T: Element, const N: usize>(
    kernel: &str,
    inputs: Vec<BufferBinding<T>>,
) -> Result<[BufferBinding<T>; N]> {
    let found = inputs.len();
    inputs.try_into().map_err(|_| {
        FanoutError::invalid_parameter(format!(
            "kernel '{}' takes {} input buffer(s), got {}",
            kernel, N, found
        ))
    })
}

/// Allocate an output buffer for `partition`
pub(crate) fn allocate_output<T: Element>(
    context: &ExecutionContext,
    partition: &Partition,
    stride: usize,
    access: AccessMode,
) -> Result<Buffer<T>> {
    context.allocate(partition.len() * stride, access)
}
