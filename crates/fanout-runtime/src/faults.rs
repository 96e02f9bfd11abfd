//! Fault injection for the host backend

use fanout_types::{DeviceId, LaunchId};
use serde::{Deserialize, Serialize};

/// Failures the host backend should produce on purpose
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultPlan {
    /// Root device ordinals whose partitioning fails
    pub unpartitionable: Vec<usize>,
    /// Devices (as `dev0`, `dev1.1`, ...) that refuse queue creation
    pub queue_failures: Vec<String>,
    /// Launch ids that fail on the device instead of running
    pub failing_launches: Vec<u64>,
    /// Launch ids that report success without running their kernel, leaving
    /// the output as it was
    pub skipped_launches: Vec<u64>,
}

impl FaultPlan {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.unpartitionable.is_empty()
            && self.queue_failures.is_empty()
            && self.failing_launches.is_empty()
            && self.skipped_launches.is_empty()
    }

    pub fn partition_fails(&self, root_ordinal: usize) -> bool {
        self.unpartitionable.contains(&root_ordinal)
    }

    pub fn queue_fails(&self, device: DeviceId) -> bool {
        let name = device.to_string();
        self.queue_failures.iter().any(|d| *d == name)
    }

    pub fn launch_fails(&self, launch: LaunchId) -> bool {
        self.failing_launches.contains(&launch.0)
    }

    pub fn launch_skipped(&self, launch: LaunchId) -> bool {
        self.skipped_launches.contains(&launch.0)
    }
}
