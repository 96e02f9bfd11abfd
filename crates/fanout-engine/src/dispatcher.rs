//! Fan-out of kernel launches across contexts
//!
//! Dispatch never blocks on device work: it validates the buffers of a
//! partition, builds the kernel and enqueues it on the partition's context.
//! Launches on one context keep their submission order; launches on
//! different contexts are unordered.

use crate::context::{ContextPool, ExecutionContext};
use crate::workloads::{PartitionWork, Workload};
use fanout_interfaces::{check_access, Launch};
use fanout_types::{ContextId, DeviceId, FanoutError, Partition, Result, SubmissionMode};
use tracing::{debug, trace};

/// A submitted launch and the slice of the domain it computes
#[derive(Debug, Clone)]
pub struct DispatchedLaunch {
    pub launch: Launch,
    pub context: ContextId,
    pub device: DeviceId,
    pub partition: Partition,
}

/// Submits partition kernels, from one thread or one thread per context
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    mode: SubmissionMode,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(SubmissionMode::SingleThread)
    }
}

impl Dispatcher {
    pub fn new(mode: SubmissionMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> SubmissionMode {
        self.mode
    }

    /// Submit the kernel for one partition on `context`.
    ///
    /// Returns `None` for an empty partition, which has nothing to compute.
    pub fn dispatch<W: Workload + ?Sized>(
        &self,
        workload: &W,
        work: &PartitionWork<W::Element>,
        context: &ExecutionContext,
    ) -> Result<Option<DispatchedLaunch>> {
        validate(workload, work, context)?;
        if work.partition.is_empty() {
            trace!(
                context = %context.id(),
                partition = %work.partition,
                "empty partition, nothing to dispatch"
            );
            return Ok(None);
        }

        let inputs = work.inputs.iter().map(|b| b.binding()).collect();
        let job = workload.kernel(&work.partition, context.id(), inputs, work.output.binding())?;
        let launch = context.submit(job)?;
        debug!(
            context = %context.id(),
            device = %context.device_id(),
            partition = %work.partition,
            launch = %launch.id(),
            items = launch.global_size(),
            "dispatched"
        );
        Ok(Some(DispatchedLaunch {
            launch,
            context: context.id(),
            device: context.device_id(),
            partition: work.partition,
        }))
    }

    /// Dispatch one round: every partition on its own context.
    ///
    /// `work[i]` must belong to context `i`. The returned launches are in
    /// partition order regardless of the submission mode.
    pub fn dispatch_round<W: Workload + ?Sized>(
        &self,
        workload: &W,
        work: &[PartitionWork<W::Element>],
        pool: &ContextPool,
    ) -> Result<Vec<DispatchedLaunch>> {
        if work.len() != pool.len() {
            return Err(FanoutError::internal(format!(
                "{} partitions for {} contexts",
                work.len(),
                pool.len()
            )));
        }

        let results: Vec<Result<Option<DispatchedLaunch>>> = match self.mode {
            SubmissionMode::SingleThread => work
                .iter()
                .zip(pool.iter())
                .map(|(w, ctx)| self.dispatch(workload, w, ctx))
                .collect(),
            SubmissionMode::ThreadPerContext => std::thread::scope(|scope| {
                let handles: Vec<_> = work
                    .iter()
                    .zip(pool.iter())
                    .map(|(w, ctx)| scope.spawn(move || self.dispatch(workload, w, ctx)))
                    .collect();
                handles
                    .into_iter()
                    .map(|h| {
                        h.join().unwrap_or_else(|_| {
                            Err(FanoutError::internal("submission thread panicked"))
                        })
                    })
                    .collect()
            }),
        };

        let mut launches = Vec::with_capacity(results.len());
        for result in results {
            if let Some(launch) = result? {
                launches.push(launch);
            }
        }
        Ok(launches)
    }
}

fn validate<W: Workload + ?Sized>(
    workload: &W,
    work: &PartitionWork<W::Element>,
    context: &ExecutionContext,
) -> Result<()> {
    if work.context != context.id() {
        return Err(FanoutError::invalid_parameter(format!(
            "partition {} was prepared for {}, not {}",
            work.partition,
            work.context,
            context.id()
        )));
    }
    for input in &work.inputs {
        check_access(input.id(), input.access(), false)?;
    }
    check_access(work.output.id(), work.output.access(), true)?;

    let device = context.device_id();
    if let Some(foreign) = work
        .inputs
        .iter()
        .map(|b| b.device())
        .chain(std::iter::once(work.output.device()))
        .find(|d| *d != device)
    {
        return Err(FanoutError::invalid_parameter(format!(
            "buffer on {} passed to a context on {}",
            foreign, device
        )));
    }

    let expected = work.partition.len() * workload.output_stride();
    if work.output.len() != expected {
        return Err(FanoutError::invalid_parameter(format!(
            "output of partition {} holds {} elements, expected {}",
            work.partition,
            work.output.len(),
            expected
        )));
    }
    Ok(())
}
