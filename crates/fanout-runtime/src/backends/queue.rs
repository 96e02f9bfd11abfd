//! FIFO execution queue backed by one worker thread

use crate::faults::FaultPlan;
use crate::memory::DeviceMemory;
use fanout_interfaces::{ExecutionQueue, KernelJob, Launch, LaunchCompleter, MemoryLedger};
use fanout_types::{DeviceInfo, FanoutError, LaunchId, LaunchTiming, QueueProperties, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Fault the worker applies to one launch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Injected {
    Nothing,
    Fail,
    Skip,
}

struct QueuedLaunch {
    job: KernelJob,
    completer: LaunchCompleter,
    queued_ns: u64,
    injected: Injected,
}

/// Queue whose launches run one at a time, in submission order, on a
/// dedicated thread
pub struct HostQueue {
    device: DeviceInfo,
    properties: QueueProperties,
    memory: Arc<DeviceMemory>,
    launch_ids: Arc<AtomicU64>,
    faults: Arc<FaultPlan>,
    epoch: Instant,
    sender: Option<mpsc::UnboundedSender<QueuedLaunch>>,
    worker: Option<JoinHandle<()>>,
}

impl HostQueue {
    pub(crate) fn spawn(
        device: DeviceInfo,
        properties: QueueProperties,
        memory: Arc<DeviceMemory>,
        launch_ids: Arc<AtomicU64>,
        faults: Arc<FaultPlan>,
        epoch: Instant,
    ) -> Result<Self> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let profiling = properties.enable_profiling;
        let worker = std::thread::Builder::new()
            .name(format!("fanout-queue-{}", device.id))
            .spawn(move || run_worker(receiver, profiling, epoch))
            .map_err(|e| FanoutError::context_creation(device.id, e.to_string()))?;

        debug!(device = %device.id, profiling, "created host queue");
        Ok(Self {
            device,
            properties,
            memory,
            launch_ids,
            faults,
            epoch,
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    fn now_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }
}

impl ExecutionQueue for HostQueue {
    fn device(&self) -> &DeviceInfo {
        &self.device
    }

    fn properties(&self) -> QueueProperties {
        self.properties
    }

    fn memory(&self) -> Arc<dyn MemoryLedger> {
        self.memory.clone()
    }

    fn submit(&self, job: KernelJob) -> Result<Launch> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| FanoutError::backend("queue is shut down"))?;

        let id = LaunchId(self.launch_ids.fetch_add(1, Ordering::Relaxed));
        let (launch, completer) = Launch::new(id, job.name.clone(), job.global_size);
        trace!(device = %self.device.id, launch = %id, kernel = %job.name, "submit");

        let queued = QueuedLaunch {
            injected: if self.faults.launch_fails(id) {
                Injected::Fail
            } else if self.faults.launch_skipped(id) {
                Injected::Skip
            } else {
                Injected::Nothing
            },
            queued_ns: self.now_ns(),
            job,
            completer,
        };
        // A send error hands the item back; dropping it fails the launch
        sender.send(queued).map_err(|_| {
            FanoutError::backend(format!("queue worker for {} exited", self.device.id))
        })?;
        Ok(launch)
    }
}

impl Drop for HostQueue {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain what is queued and exit
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!(device = %self.device.id, "queue worker panicked");
            }
        }
        debug!(device = %self.device.id, "host queue shut down");
    }
}

fn run_worker(
    mut receiver: mpsc::UnboundedReceiver<QueuedLaunch>,
    profiling: bool,
    epoch: Instant,
) {
    let now = || epoch.elapsed().as_nanos() as u64;

    while let Some(item) = receiver.blocking_recv() {
        let QueuedLaunch {
            job,
            completer,
            queued_ns,
            injected,
        } = item;

        let started_ns = now();
        // The body (and the buffers it binds) is gone before the launch resolves
        let result = match injected {
            Injected::Fail => {
                drop(job.body);
                Err(format!("injected device fault in kernel '{}'", job.name))
            }
            Injected::Skip => {
                drop(job.body);
                trace!(launch = %completer.id(), kernel = %job.name, "kernel skipped");
                Ok(())
            }
            Injected::Nothing => match catch_unwind(AssertUnwindSafe(job.body)) {
                Ok(result) => result,
                Err(payload) => Err(panic_message(payload.as_ref())),
            },
        };
        let ended_ns = now();

        let timing = profiling.then_some(LaunchTiming {
            queued_ns,
            started_ns,
            ended_ns,
        });
        match result {
            Ok(()) => completer.complete(timing),
            Err(message) => {
                debug!(
                    launch = %completer.id(),
                    kernel = %job.name,
                    error = %message,
                    "launch failed"
                );
                completer.fail(message, timing);
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("kernel panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("kernel panicked: {}", s)
    } else {
        "kernel panicked".to_string()
    }
}
