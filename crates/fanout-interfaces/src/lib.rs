//! Interface definitions for fanout backends
//!
//! This crate defines the seam between the work distribution engine and an
//! accelerator runtime: backend and queue traits, launch completion handles,
//! memory reservations and typed buffers. Implementations live in
//! `fanout-runtime`; the engine only depends on what is declared here.

pub mod backend;
pub mod buffer;
pub mod element;
pub mod launch;
pub mod memory;

pub use backend::{ComputeBackend, ExecutionQueue, KernelBody, KernelJob};
pub use buffer::{check_access, Buffer, BufferBinding};
pub use element::Element;
pub use launch::{Launch, LaunchCompleter};
pub use memory::{MemoryLedger, Reservation};

// Re-export the types every implementation needs
pub use fanout_types::{
    AccessMode, BufferId, DataType, DeviceId, DeviceInfo, DeviceKind, DeviceMemoryStats,
    FanoutError, LaunchId, LaunchOutcome, LaunchStatus, LaunchTiming, PlatformInfo,
    QueueProperties, Result,
};
