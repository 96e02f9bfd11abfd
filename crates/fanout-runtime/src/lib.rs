//! # Fanout Runtime
//!
//! In-process implementation of the fanout backend interfaces. The host
//! backend simulates a machine described by a [`HostTopology`]: platforms,
//! root devices that may split into tiles, per-device memory capacity and a
//! FIFO worker thread per queue. A [`FaultPlan`] makes it fail on purpose.

// Re-export traits from fanout-interfaces
pub use fanout_interfaces::{ComputeBackend, ExecutionQueue, MemoryLedger};

// Re-export types from fanout-types
pub use fanout_types::{DeviceId, DeviceInfo, Result};

pub mod backends;
pub mod faults;
pub mod memory;
pub mod topology;

// Re-exports
pub use backends::*;
pub use faults::FaultPlan;
pub use memory::*;
pub use topology::{DeviceSpec, HostTopology, PlatformSpec};
