//! Accelerator backend seam
//!
//! The engine never talks to a driver directly. A [`ComputeBackend`] reports
//! platforms and devices, optionally splits a device into sub-devices and
//! creates [`ExecutionQueue`]s; queues accept [`KernelJob`]s and hand back
//! [`Launch`] handles.

use crate::launch::Launch;
use crate::memory::MemoryLedger;
use fanout_types::{DeviceInfo, DeviceMemoryStats, PlatformInfo, QueueProperties, Result};
use std::sync::Arc;

/// Body of a kernel, run once by the queue's executor.
///
/// The body iterates over its own index range and reports failure as a
/// message, which becomes the launch's `Failed` status.
pub type KernelBody = Box<dyn FnOnce() -> std::result::Result<(), String> + Send + 'static>;

/// One kernel submission
pub struct KernelJob {
    /// Kernel name, used for diagnostics and profiling
    pub name: String,
    /// Number of work items
    pub global_size: usize,
    pub body: KernelBody,
}

impl KernelJob {
    pub fn new<F>(name: impl Into<String>, global_size: usize, body: F) -> Self
    where
        F: FnOnce() -> std::result::Result<(), String> + Send + 'static,
    {
        Self {
            name: name.into(),
            global_size,
            body: Box::new(body),
        }
    }
}

impl std::fmt::Debug for KernelJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelJob")
            .field("name", &self.name)
            .field("global_size", &self.global_size)
            .finish()
    }
}

/// Serial, device-bound submission channel.
///
/// Launches submitted to one queue execute in submission order; there is no
/// ordering between queues.
pub trait ExecutionQueue: Send + Sync {
    /// Device this queue submits to
    fn device(&self) -> &DeviceInfo;

    fn properties(&self) -> QueueProperties;

    /// Memory ledger of the queue's device
    fn memory(&self) -> Arc<dyn MemoryLedger>;

    /// Enqueue a kernel without waiting for it
    fn submit(&self, job: KernelJob) -> Result<Launch>;
}

/// Compute backend for device discovery and queue creation
pub trait ComputeBackend: Send + Sync {
    /// Get backend name/identifier
    fn name(&self) -> &str;

    /// Platforms in backend enumeration order
    fn platforms(&self) -> Vec<PlatformInfo>;

    /// Root devices of a platform in enumeration order
    fn devices(&self, platform: &PlatformInfo) -> Result<Vec<DeviceInfo>>;

    /// Split a device along its affinity domain.
    ///
    /// Fails with `PartitionUnsupported` when the device cannot be split.
    fn partition_device(&self, device: &DeviceInfo) -> Result<Vec<DeviceInfo>>;

    /// Create a submission queue for a device
    fn create_queue(
        &self,
        device: &DeviceInfo,
        properties: QueueProperties,
    ) -> Result<Arc<dyn ExecutionQueue>>;

    /// Memory counters of every device the backend has handed out queues for
    fn memory_stats(&self) -> Vec<DeviceMemoryStats>;
}
