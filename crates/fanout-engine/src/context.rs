//! Execution contexts and the context pool
//!
//! An [`ExecutionContext`] wraps one backend queue bound to one device. It
//! remembers every launch submitted through it so that failures nobody
//! waited for can be handed to the asynchronous error handler, either at an
//! explicit [`ExecutionContext::wait_and_throw`] or when the context is
//! dropped.

use fanout_interfaces::{Buffer, ComputeBackend, Element, ExecutionQueue, KernelJob, Launch};
use fanout_types::{
    AccessMode, AsyncErrorPolicy, ContextFailurePolicy, ContextId, DeviceId, DeviceInfo,
    FanoutError, QueueProperties, Result,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Receives launch failures that were never awaited
pub type AsyncErrorHandler = Arc<dyn Fn(&FanoutError) + Send + Sync>;

/// Handler that logs the error and terminates the process
pub fn abort_handler() -> AsyncErrorHandler {
    Arc::new(|err: &FanoutError| {
        error!(error = %err, "unhandled asynchronous launch error, aborting");
        std::process::abort();
    })
}

/// Handler that logs the error and lets the run continue
pub fn logging_handler() -> AsyncErrorHandler {
    Arc::new(|err: &FanoutError| {
        error!(error = %err, "asynchronous launch error");
    })
}

pub fn handler_for(policy: AsyncErrorPolicy) -> AsyncErrorHandler {
    match policy {
        AsyncErrorPolicy::Abort => abort_handler(),
        AsyncErrorPolicy::LogAndContinue => logging_handler(),
    }
}

/// A device-bound serial submission channel
pub struct ExecutionContext {
    id: ContextId,
    queue: Arc<dyn ExecutionQueue>,
    handler: AsyncErrorHandler,
    in_flight: Mutex<Vec<Launch>>,
}

impl ExecutionContext {
    pub fn new(id: ContextId, queue: Arc<dyn ExecutionQueue>, handler: AsyncErrorHandler) -> Self {
        Self {
            id,
            queue,
            handler,
            in_flight: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn device(&self) -> &DeviceInfo {
        self.queue.device()
    }

    pub fn device_id(&self) -> DeviceId {
        self.queue.device().id
    }

    pub fn is_profiling(&self) -> bool {
        self.queue.properties().enable_profiling
    }

    pub fn queue(&self) -> &dyn ExecutionQueue {
        self.queue.as_ref()
    }

    /// Allocate a buffer on this context's device and fill it from the host
    pub fn upload<T: Element>(&self, data: Vec<T>, access: AccessMode) -> Result<Buffer<T>> {
        Buffer::from_host(self.queue.as_ref(), data, access)
    }

    /// Allocate a buffer on this context's device and set element `i` to
    /// `init(i)`; nothing is built on the host unless the device has room
    pub fn upload_with<T, F>(&self, len: usize, access: AccessMode, init: F) -> Result<Buffer<T>>
    where
        T: Element,
        F: FnMut(usize) -> T,
    {
        Buffer::from_fn(self.queue.as_ref(), len, access, init)
    }

    /// Allocate a default-initialised buffer on this context's device
    pub fn allocate<T: Element>(&self, len: usize, access: AccessMode) -> Result<Buffer<T>> {
        Buffer::allocate(self.queue.as_ref(), len, access)
    }

    /// Submit a kernel; returns as soon as it is enqueued
    pub fn submit(&self, job: KernelJob) -> Result<Launch> {
        let launch = self.queue.submit(job)?;
        self.in_flight.lock().push(launch.clone());
        Ok(launch)
    }

    /// Number of launches submitted since the last `wait_and_throw`
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Wait for every tracked launch and report the failures nobody
    /// observed to the asynchronous error handler.
    ///
    /// Returns the number of failures reported.
    pub fn wait_and_throw(&self) -> usize {
        let launches = std::mem::take(&mut *self.in_flight.lock());
        let mut reported = 0;
        for launch in launches {
            let seen = launch.is_observed();
            let outcome = launch.wait();
            if let Some(message) = outcome.error_message() {
                if !seen {
                    let err = FanoutError::async_launch(
                        self.device_id(),
                        format!(
                            "{} ({}) on {}: {}",
                            outcome.launch, outcome.kernel, self.id, message
                        ),
                    );
                    (self.handler)(&err);
                    reported += 1;
                }
            }
        }
        reported
    }
}

impl Drop for ExecutionContext {
    fn drop(&mut self) {
        let pending = self.in_flight();
        if pending > 0 {
            debug!(context = %self.id, pending, "draining context before teardown");
        }
        self.wait_and_throw();
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("id", &self.id)
            .field("device", &self.device_id())
            .field("profiling", &self.is_profiling())
            .finish()
    }
}

/// How contexts are created
#[derive(Clone)]
pub struct ContextOptions {
    pub profiling: bool,
    pub failure_policy: ContextFailurePolicy,
    pub async_errors: AsyncErrorHandler,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            profiling: false,
            failure_policy: ContextFailurePolicy::Abort,
            async_errors: abort_handler(),
        }
    }
}

/// One context per device, with dense ids in device order
pub struct ContextPool {
    contexts: Vec<ExecutionContext>,
    skipped: Vec<(DeviceId, FanoutError)>,
}

impl ContextPool {
    /// Create a context bound to `device`
    pub fn create_context(
        backend: &dyn ComputeBackend,
        device: &DeviceInfo,
        id: ContextId,
        options: &ContextOptions,
    ) -> Result<ExecutionContext> {
        let queue = backend.create_queue(
            device,
            QueueProperties {
                enable_profiling: options.profiling,
            },
        )?;
        debug!(
            context = %id,
            device = %device.id,
            name = %device.name,
            "created execution context"
        );
        Ok(ExecutionContext::new(id, queue, options.async_errors.clone()))
    }

    /// Create one context per device.
    ///
    /// Under `SkipDevice`, devices whose context cannot be created are
    /// dropped from the pool; the pool still fails if nothing is left.
    pub fn create(
        backend: &dyn ComputeBackend,
        devices: &[DeviceInfo],
        options: &ContextOptions,
    ) -> Result<Self> {
        let mut contexts = Vec::with_capacity(devices.len());
        let mut skipped = Vec::new();

        for device in devices {
            let id = ContextId::new(contexts.len());
            match Self::create_context(backend, device, id, options) {
                Ok(ctx) => contexts.push(ctx),
                Err(e) => match options.failure_policy {
                    ContextFailurePolicy::Abort => return Err(e),
                    ContextFailurePolicy::SkipDevice => {
                        warn!(device = %device.id, error = %e, "skipping device");
                        skipped.push((device.id, e));
                    }
                },
            }
        }

        if contexts.is_empty() {
            return Err(FanoutError::no_device(format!(
                "no execution context could be created ({} device(s) skipped)",
                skipped.len()
            )));
        }

        info!(contexts = contexts.len(), skipped = skipped.len(), "context pool ready");
        Ok(Self { contexts, skipped })
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ExecutionContext> {
        self.contexts.get(index)
    }

    pub fn contexts(&self) -> &[ExecutionContext] {
        &self.contexts
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExecutionContext> {
        self.contexts.iter()
    }

    /// Devices that were dropped under `SkipDevice`
    pub fn skipped(&self) -> &[(DeviceId, FanoutError)] {
        &self.skipped
    }

    /// `wait_and_throw` on every context; returns the failures reported
    pub fn synchronize(&self) -> usize {
        self.contexts.iter().map(ExecutionContext::wait_and_throw).sum()
    }
}
