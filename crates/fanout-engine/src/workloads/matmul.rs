//! Row-partitioned single precision matrix multiply

use super::{allocate_output, take_inputs, PartitionWork, Workload};
use crate::context::ExecutionContext;
use crate::partitioner::PartitionTable;
use fanout_interfaces::{BufferBinding, KernelJob};
use fanout_types::{AccessMode, ContextId, FanoutError, Partition, Result};

/// `C(M x P) = A(M x N) * B(N x P)` with `A = 1` and `B[k][j] = k + 1`.
///
/// Rows of `C` are partitioned; every context holds its rows of `A`, a full
/// copy of `B` and its rows of `C`. Every element of `C` equals
/// `N (N + 1) / 2`.
#[derive(Debug, Clone)]
pub struct MatMul {
    m: usize,
    n: usize,
    p: usize,
}

impl MatMul {
    pub const KERNEL: &'static str = "matmul";

    pub fn new(m: usize, n: usize, p: usize) -> Self {
        Self { m, n, p }
    }

    /// `M = size / 8`, `N = size / 4`, `P = size / 2`
    pub fn from_size(size: usize) -> Self {
        Self::new(size / 8, size / 4, size / 2)
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        (self.m, self.n, self.p)
    }
}

impl Workload for MatMul {
    type Element = f32;

    fn name(&self) -> &str {
        Self::KERNEL
    }

    fn domain_size(&self) -> usize {
        self.m
    }

    fn output_stride(&self) -> usize {
        self.p
    }

    fn validate(&self) -> Result<()> {
        if self.m == 0 || self.n == 0 || self.p == 0 {
            return Err(FanoutError::invalid_parameter(format!(
                "matrix dimensions must be non-zero, got {}x{}x{}",
                self.m, self.n, self.p
            )));
        }
        let largest = self.m.max(self.n);
        if largest.checked_mul(self.n.max(self.p)).is_none() {
            return Err(FanoutError::invalid_parameter(format!(
                "matrix dimensions {}x{}x{} overflow the index space",
                self.m, self.n, self.p
            )));
        }
        Ok(())
    }

    fn prepare(
        &self,
        context: &ExecutionContext,
        partition: &Partition,
    ) -> Result<PartitionWork<f32>> {
        let (n, p) = (self.n, self.p);
        let a = context.upload_with(partition.len() * n, AccessMode::ReadOnly, |_| 1.0f32)?;
        let b = context.upload_with(n * p, AccessMode::ReadOnly, |idx| {
            (idx / p) as f32 + 1.0
        })?;
        let output = allocate_output(context, partition, p, AccessMode::WriteOnly)?;
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
        inputs: Vec<BufferBinding<f32>>,
        output: BufferBinding<f32>,
    ) -> Result<KernelJob> {
        let [a, b] = take_inputs(Self::KERNEL, inputs)?;
        let (n, p) = (self.n, self.p);
        let rows = partition.len();
        Ok(KernelJob::new(Self::KERNEL, rows * p, move || {
            let a = a.read()?;
            let b = b.read()?;
            let mut c = output.write()?;
            if a.len() != rows * n || b.len() != n * p || c.len() != rows * p {
                return Err("matmul operand shapes do not match the partition".to_string());
            }
            for row in 0..rows {
                let a_row = &a[row * n..(row + 1) * n];
                for col in 0..p {
                    let mut sum = 0.0f32;
                    for (k, a_val) in a_row.iter().enumerate() {
                        sum += a_val * b[k * p + col];
                    }
                    c[row * p + col] = sum;
                }
            }
            Ok(())
        }))
    }

    fn expected(&self, _index: usize, _rounds: usize, _table: &PartitionTable) -> f32 {
        let n = self.n as f64;
        (n * (n + 1.0) / 2.0) as f32
    }
}
