//! Device, platform and memory access descriptors

use crate::ids::DeviceId;
use serde::{Deserialize, Serialize};

/// Driver stack a platform is exposed through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// oneAPI Level-Zero
    LevelZero,
    /// OpenCL
    OpenCl,
    /// NVIDIA CUDA
    Cuda,
    /// In-process host execution
    Host,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BackendKind::LevelZero => "level-zero",
            BackendKind::OpenCl => "opencl",
            BackendKind::Cuda => "cuda",
            BackendKind::Host => "host",
        };
        write!(f, "{}", name)
    }
}

/// A platform reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    /// Position in backend enumeration order
    pub index: usize,
    /// Human-readable platform name
    pub name: String,
    /// Driver stack
    pub kind: BackendKind,
    /// Whether devices of this platform can back an execution context
    pub submittable: bool,
}

/// Coarse device category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Gpu,
    Cpu,
    Accelerator,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceKind::Gpu => write!(f, "gpu"),
            DeviceKind::Cpu => write!(f, "cpu"),
            DeviceKind::Accelerator => write!(f, "accelerator"),
        }
    }
}

/// Read-only description of a root device or sub-device.
///
/// Owned by the backend; the core only clones and reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device identifier
    pub id: DeviceId,
    /// Device name
    pub name: String,
    /// Vendor string
    pub vendor: String,
    /// Device category
    pub kind: DeviceKind,
    /// Platform the device was enumerated from
    pub platform: usize,
    /// Number of compute units (max parallelism hint)
    pub compute_units: u32,
    /// Maximum work-group size
    pub max_work_group_size: u32,
    /// Global memory in bytes
    pub global_memory_bytes: usize,
    /// Whether the device advertises affinity-domain partitioning
    pub partitionable: bool,
}

impl DeviceInfo {
    /// Whether this is a sub-device carved out of a root device
    pub fn is_sub_device(&self) -> bool {
        self.id.is_sub_device()
    }

    /// One-line description used in diagnostics
    pub fn describe(&self) -> String {
        format!(
            "{} [{}] ({} CUs, {} MiB)",
            self.name,
            self.id,
            self.compute_units,
            self.global_memory_bytes / (1024 * 1024)
        )
    }
}

/// Properties requested when creating an execution queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueProperties {
    /// Record queued/start/end timestamps for every launch
    pub enable_profiling: bool,
}

/// How a kernel accesses a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessMode {
    /// Whether a kernel may read the buffer
    pub fn is_readable(&self) -> bool {
        matches!(self, AccessMode::ReadOnly | AccessMode::ReadWrite)
    }

    /// Whether a kernel may write the buffer
    pub fn is_writable(&self) -> bool {
        matches!(self, AccessMode::WriteOnly | AccessMode::ReadWrite)
    }
}

/// Element type of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 32-bit floating point
    FP32,
    /// 64-bit floating point
    FP64,
    /// 32-bit signed integer
    INT32,
    /// 64-bit signed integer
    INT64,
    /// 32-bit unsigned integer
    UINT32,
    /// 64-bit unsigned integer
    UINT64,
}

impl DataType {
    /// Get size in bytes for this data type
    pub fn size_bytes(&self) -> usize {
        match self {
            DataType::FP32 | DataType::INT32 | DataType::UINT32 => 4,
            DataType::FP64 | DataType::INT64 | DataType::UINT64 => 8,
        }
    }

    /// Check if this is a floating point type
    pub fn is_float(&self) -> bool {
        matches!(self, DataType::FP32 | DataType::FP64)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DataType::FP32 => "fp32",
            DataType::FP64 => "fp64",
            DataType::INT32 => "int32",
            DataType::INT64 => "int64",
            DataType::UINT32 => "uint32",
            DataType::UINT64 => "uint64",
        };
        write!(f, "{}", name)
    }
}
