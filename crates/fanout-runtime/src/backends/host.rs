//! In-process backend simulating a multi-GPU machine

use crate::backends::queue::HostQueue;
use crate::faults::FaultPlan;
use crate::memory::DeviceMemory;
use crate::topology::{DeviceSpec, HostTopology};
use fanout_interfaces::{ComputeBackend, ExecutionQueue, MemoryLedger};
use fanout_types::{
    DeviceId, DeviceInfo, DeviceMemoryStats, FanoutError, PlatformInfo, QueueProperties, Result,
};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

struct RootDevice {
    info: DeviceInfo,
    tiles: usize,
}

struct Platform {
    info: PlatformInfo,
    devices: Vec<RootDevice>,
}

/// Backend that executes kernels on host threads.
///
/// Root devices are numbered across all platforms in declaration order.
/// Sub-devices get an equal share of their root's compute units and memory.
pub struct HostBackend {
    platforms: Vec<Platform>,
    faults: Arc<FaultPlan>,
    epoch: Instant,
    launch_ids: Arc<AtomicU64>,
    memory: Mutex<BTreeMap<DeviceId, Arc<DeviceMemory>>>,
}

impl HostBackend {
    pub fn new(topology: HostTopology) -> Self {
        Self::with_faults(topology, FaultPlan::none())
    }

    pub fn with_faults(topology: HostTopology, faults: FaultPlan) -> Self {
        let mut ordinal = 0;
        let platforms = topology
            .platforms
            .into_iter()
            .enumerate()
            .map(|(index, spec)| {
                let devices = spec
                    .devices
                    .iter()
                    .map(|device| {
                        let root = RootDevice {
                            info: root_info(device, ordinal, index),
                            tiles: device.tiles,
                        };
                        ordinal += 1;
                        root
                    })
                    .collect();
                Platform {
                    info: PlatformInfo {
                        index,
                        name: spec.name,
                        kind: spec.kind,
                        submittable: spec.submittable,
                    },
                    devices,
                }
            })
            .collect::<Vec<_>>();

        info!(
            platforms = platforms.len(),
            root_devices = ordinal,
            faults = !faults.is_empty(),
            "host backend initialized"
        );
        Self {
            platforms,
            faults: Arc::new(faults),
            epoch: Instant::now(),
            launch_ids: Arc::new(AtomicU64::new(0)),
            memory: Mutex::new(BTreeMap::new()),
        }
    }

    fn root(&self, ordinal: usize) -> Option<(&Platform, &RootDevice)> {
        self.platforms.iter().find_map(|p| {
            p.devices
                .iter()
                .find(|d| d.info.id.ordinal == ordinal)
                .map(|d| (p, d))
        })
    }

    /// Ledger of a device, created on first use
    pub fn device_memory(&self, device: &DeviceInfo) -> Arc<DeviceMemory> {
        self.memory
            .lock()
            .entry(device.id)
            .or_insert_with(|| Arc::new(DeviceMemory::new(device.id, device.global_memory_bytes)))
            .clone()
    }
}

impl Default for HostBackend {
    fn default() -> Self {
        Self::new(HostTopology::default())
    }
}

fn root_info(spec: &DeviceSpec, ordinal: usize, platform: usize) -> DeviceInfo {
    DeviceInfo {
        id: DeviceId::root(ordinal),
        name: spec.name.clone(),
        vendor: spec.vendor.clone(),
        kind: spec.kind,
        platform,
        compute_units: spec.compute_units,
        max_work_group_size: spec.max_work_group_size,
        global_memory_bytes: spec.memory_bytes,
        partitionable: spec.is_partitionable(),
    }
}

impl ComputeBackend for HostBackend {
    fn name(&self) -> &str {
        "host"
    }

    fn platforms(&self) -> Vec<PlatformInfo> {
        self.platforms.iter().map(|p| p.info.clone()).collect()
    }

    fn devices(&self, platform: &PlatformInfo) -> Result<Vec<DeviceInfo>> {
        let platform = self.platforms.get(platform.index).ok_or_else(|| {
            FanoutError::invalid_parameter(format!("unknown platform index {}", platform.index))
        })?;
        Ok(platform.devices.iter().map(|d| d.info.clone()).collect())
    }

    fn partition_device(&self, device: &DeviceInfo) -> Result<Vec<DeviceInfo>> {
        if device.is_sub_device() {
            return Err(FanoutError::partition_unsupported(
                device.id,
                "sub-devices cannot be partitioned further",
            ));
        }
        let (_, root) = self
            .root(device.id.ordinal)
            .ok_or_else(|| {
                FanoutError::invalid_parameter(format!("unknown device {}", device.id))
            })?;

        if root.tiles < 2 {
            return Err(FanoutError::partition_unsupported(
                device.id,
                "device does not support next-partitionable affinity domain partitioning",
            ));
        }
        if self.faults.partition_fails(device.id.ordinal) {
            return Err(FanoutError::partition_unsupported(
                device.id,
                "driver rejected affinity domain partitioning",
            ));
        }

        let tiles = root.tiles;
        let subs = (0..tiles)
            .map(|t| DeviceInfo {
                id: DeviceId::sub_device(device.id.ordinal, t),
                compute_units: (root.info.compute_units / tiles as u32).max(1),
                global_memory_bytes: root.info.global_memory_bytes / tiles,
                partitionable: false,
                ..root.info.clone()
            })
            .collect();
        debug!(device = %device.id, tiles, "partitioned device");
        Ok(subs)
    }

    fn create_queue(
        &self,
        device: &DeviceInfo,
        properties: QueueProperties,
    ) -> Result<Arc<dyn ExecutionQueue>> {
        let (platform, _) = self
            .root(device.id.ordinal)
            .ok_or_else(|| FanoutError::context_creation(device.id, "unknown device"))?;
        if !platform.info.submittable {
            return Err(FanoutError::context_creation(
                device.id,
                format!("platform '{}' cannot host queues", platform.info.name),
            ));
        }
        if self.faults.queue_fails(device.id) {
            return Err(FanoutError::context_creation(
                device.id,
                "driver refused to create a queue",
            ));
        }

        let queue = HostQueue::spawn(
            device.clone(),
            properties,
            self.device_memory(device),
            self.launch_ids.clone(),
            self.faults.clone(),
            self.epoch,
        )?;
        Ok(Arc::new(queue))
    }

    fn memory_stats(&self) -> Vec<DeviceMemoryStats> {
        self.memory.lock().values().map(|m| m.stats()).collect()
    }
}
