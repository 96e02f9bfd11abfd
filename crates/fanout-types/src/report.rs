//! Run, discovery and profiling reports

use crate::devices::DeviceInfo;
use crate::ids::{ContextId, DeviceId, LaunchId, RunId};
use crate::partition::Partition;
use crate::verification::{SamplingPolicy, VerificationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Which context and device computed which partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionAssignment {
    pub context: ContextId,
    pub device: DeviceId,
    pub device_name: String,
    pub partition: Partition,
}

/// One recorded mismatch, rendered for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MismatchRecord {
    pub index: usize,
    pub expected: String,
    pub actual: String,
}

/// Element-type independent view of a verification result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub policy: SamplingPolicy,
    pub checked: usize,
    pub mismatch_count: usize,
    /// Percentage of checked indices that mismatched
    pub mismatch_rate: f64,
    pub passed: bool,
    pub first_mismatches: Vec<MismatchRecord>,
}

impl<T: Display> From<&VerificationResult<T>> for VerificationSummary {
    fn from(result: &VerificationResult<T>) -> Self {
        Self {
            policy: result.policy,
            checked: result.checked,
            mismatch_count: result.mismatch_count,
            mismatch_rate: result.mismatch_rate(),
            passed: result.passed(),
            first_mismatches: result
                .first_mismatches
                .iter()
                .map(|m| MismatchRecord {
                    index: m.index,
                    expected: m.expected.to_string(),
                    actual: m.actual.to_string(),
                })
                .collect(),
        }
    }
}

/// Duration statistics of one kernel across its launches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelStats {
    pub kernel: String,
    pub count: usize,
    pub avg_us: f64,
    pub min_us: f64,
    pub max_us: f64,
}

/// Two launches whose execution windows intersect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchOverlap {
    pub first: LaunchId,
    pub first_kernel: String,
    pub first_context: ContextId,
    pub second: LaunchId,
    pub second_kernel: String,
    pub second_context: ContextId,
    pub overlap_us: f64,
    /// Overlap as a percentage of the first launch's duration
    pub first_percent: f64,
    /// Overlap as a percentage of the second launch's duration
    pub second_percent: f64,
}

/// Memory ledger counters of one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMemoryStats {
    pub device: DeviceId,
    pub capacity_bytes: usize,
    pub used_bytes: usize,
    pub peak_bytes: usize,
    pub live_allocations: usize,
    pub total_allocations: u64,
    pub failed_allocations: u64,
}

impl DeviceMemoryStats {
    pub fn utilization_percent(&self) -> f32 {
        if self.capacity_bytes > 0 {
            (self.used_bytes as f32 / self.capacity_bytes as f32) * 100.0
        } else {
            0.0
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub workload: String,
    pub started_at: DateTime<Utc>,
    pub problem_size: usize,
    pub iterations: usize,
    pub devices: Vec<DeviceInfo>,
    pub assignments: Vec<PartitionAssignment>,
    /// Largest minus smallest partition length
    pub partition_imbalance: usize,
    /// Dispatch through the last await, all rounds
    pub compute_ms: f64,
    pub verification_ms: f64,
    pub verification: VerificationSummary,
    pub kernel_stats: Vec<KernelStats>,
    pub overlaps: Vec<LaunchOverlap>,
    pub memory: Vec<DeviceMemoryStats>,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.verification.passed
    }
}

/// How one root device was expanded during enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootDeviceReport {
    pub root: DeviceInfo,
    /// Devices used in its place (the root itself when not split)
    pub leaves: Vec<DeviceInfo>,
    /// Why partitioning was not applied, if it was attempted and failed
    pub fallback: Option<String>,
}

/// Result of device discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub roots: Vec<RootDeviceReport>,
}

impl DiscoveryReport {
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.roots.iter().map(|r| r.leaves.len()).sum()
    }

    /// Leaf devices in enumeration order
    pub fn leaves(&self) -> Vec<DeviceInfo> {
        self.roots
            .iter()
            .flat_map(|r| r.leaves.iter().cloned())
            .collect()
    }
}
