//! Launch status, timing and failure records

use crate::ids::{ContextId, DeviceId, LaunchId};
use crate::partition::Partition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a launch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchStatus {
    /// Submitted, not yet terminal
    Pending,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed { message: String },
}

impl LaunchStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LaunchStatus::Pending)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LaunchStatus::Failed { .. })
    }
}

/// Device-clock timestamps of a launch, in nanoseconds since the backend epoch.
///
/// Only recorded on profiling-enabled queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchTiming {
    pub queued_ns: u64,
    pub started_ns: u64,
    pub ended_ns: u64,
}

impl LaunchTiming {
    /// Execution time on the device
    pub fn duration_ns(&self) -> u64 {
        self.ended_ns.saturating_sub(self.started_ns)
    }

    /// Time spent waiting behind earlier launches of the same queue
    pub fn queue_delay_ns(&self) -> u64 {
        self.started_ns.saturating_sub(self.queued_ns)
    }

    pub fn duration_us(&self) -> f64 {
        self.duration_ns() as f64 / 1e3
    }
}

/// Terminal outcome of one launch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchOutcome {
    pub launch: LaunchId,
    pub kernel: String,
    pub status: LaunchStatus,
    pub timing: Option<LaunchTiming>,
}

impl LaunchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, LaunchStatus::Completed)
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            LaunchStatus::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// A failed launch with enough context to tell which slice failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchFailure {
    pub launch: LaunchId,
    pub context: ContextId,
    pub device: DeviceId,
    pub partition: Partition,
    pub kernel: String,
    pub message: String,
}

impl fmt::Display for LaunchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) on {}/{} partition {}: {}",
            self.launch, self.kernel, self.context, self.device, self.partition, self.message
        )
    }
}
