//! Description of the machine simulated by the host backend

use fanout_types::{BackendKind, DeviceKind, FanoutError, Result};
use serde::{Deserialize, Serialize};

const GIB: usize = 1024 * 1024 * 1024;

/// Platforms and devices the host backend reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostTopology {
    pub platforms: Vec<PlatformSpec>,
}

/// One platform of the simulated machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSpec {
    pub name: String,
    pub kind: BackendKind,
    /// Whether queues can be created for the platform's devices
    #[serde(default = "default_submittable")]
    pub submittable: bool,
    #[serde(default)]
    pub devices: Vec<DeviceSpec>,
}

/// One root device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSpec {
    pub name: String,
    #[serde(default = "default_vendor")]
    pub vendor: String,
    #[serde(default = "default_kind")]
    pub kind: DeviceKind,
    pub compute_units: u32,
    #[serde(default = "default_work_group_size")]
    pub max_work_group_size: u32,
    pub memory_bytes: usize,
    /// Number of tiles the device splits into; 0 or 1 means not partitionable
    #[serde(default)]
    pub tiles: usize,
}

fn default_submittable() -> bool {
    true
}

fn default_vendor() -> String {
    "Intel(R) Corporation".to_string()
}

fn default_kind() -> DeviceKind {
    DeviceKind::Gpu
}

fn default_work_group_size() -> u32 {
    1024
}

impl DeviceSpec {
    fn max_1550() -> Self {
        Self {
            name: "Intel(R) Data Center GPU Max 1550".to_string(),
            vendor: default_vendor(),
            kind: DeviceKind::Gpu,
            compute_units: 448,
            max_work_group_size: 1024,
            memory_bytes: 128 * GIB,
            tiles: 2,
        }
    }

    pub fn is_partitionable(&self) -> bool {
        self.tiles > 1
    }
}

impl HostTopology {
    /// Two 2-tile GPUs on a Level-Zero platform, mirrored by an OpenCL
    /// platform that cannot host queues
    pub fn dual_max_1550() -> Self {
        Self {
            platforms: vec![
                PlatformSpec {
                    name: "Intel(R) Level-Zero".to_string(),
                    kind: BackendKind::LevelZero,
                    submittable: true,
                    devices: vec![DeviceSpec::max_1550(), DeviceSpec::max_1550()],
                },
                PlatformSpec {
                    name: "Intel(R) OpenCL Graphics".to_string(),
                    kind: BackendKind::OpenCl,
                    submittable: false,
                    devices: vec![DeviceSpec::max_1550(), DeviceSpec::max_1550()],
                },
            ],
        }
    }

    /// A single GPU that does not partition
    pub fn single_gpu() -> Self {
        Self {
            platforms: vec![PlatformSpec {
                name: "Intel(R) Level-Zero".to_string(),
                kind: BackendKind::LevelZero,
                submittable: true,
                devices: vec![DeviceSpec {
                    name: "Intel(R) Data Center GPU Flex 170".to_string(),
                    vendor: default_vendor(),
                    kind: DeviceKind::Gpu,
                    compute_units: 512,
                    max_work_group_size: 1024,
                    memory_bytes: 16 * GIB,
                    tiles: 0,
                }],
            }],
        }
    }

    /// The host processor only
    pub fn host_cpu() -> Self {
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            platforms: vec![PlatformSpec {
                name: "Host".to_string(),
                kind: BackendKind::Host,
                submittable: true,
                devices: vec![DeviceSpec {
                    name: "Host CPU".to_string(),
                    vendor: "host".to_string(),
                    kind: DeviceKind::Cpu,
                    compute_units: threads as u32,
                    max_work_group_size: 8192,
                    memory_bytes: 4 * GIB,
                    tiles: 0,
                }],
            }],
        }
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> Result<Self> {
        match name {
            "dual_max_1550" | "dual-max-1550" => Ok(Self::dual_max_1550()),
            "single_gpu" | "single-gpu" => Ok(Self::single_gpu()),
            "host_cpu" | "host-cpu" => Ok(Self::host_cpu()),
            other => Err(FanoutError::config(format!(
                "unknown topology preset '{}' (expected dual_max_1550, single_gpu or host_cpu)",
                other
            ))),
        }
    }

    pub fn root_device_count(&self) -> usize {
        self.platforms.iter().map(|p| p.devices.len()).sum()
    }
}

impl Default for HostTopology {
    fn default() -> Self {
        Self::dual_max_1550()
    }
}
