//! Work distribution engine for fanout
//!
//! Turns a backend into a set of execution contexts, splits a problem
//! domain across them, fans kernels out, waits for every launch and checks
//! the reassembled result.
//!
//! ```text
//! DeviceEnumerator -> ContextPool -> PartitionTable
//!        -> Dispatcher -> synchronizer -> collector -> Verifier
//! ```
//!
//! [`RunContext`] and [`Runner`] wire the pieces together for one run.

pub mod collector;
pub mod context;
pub mod dispatcher;
pub mod enumerator;
pub mod partitioner;
pub mod profiling;
pub mod run_context;
pub mod runner;
pub mod synchronizer;
pub mod verifier;
pub mod workloads;

pub use collector::{gather, LogicalArray, SliceView};
pub use context::{
    abort_handler, handler_for, logging_handler, AsyncErrorHandler, ContextOptions, ContextPool,
    ExecutionContext,
};
pub use dispatcher::{DispatchedLaunch, Dispatcher};
pub use enumerator::{DeviceEnumerator, EnumeratorOptions};
pub use partitioner::{hierarchical, partition, PartitionTable};
pub use profiling::{find_overlaps, kernel_stats, KernelExecution, Profile};
pub use run_context::RunContext;
pub use runner::{RunOutput, Runner};
pub use synchronizer::{await_all, collect, BatchOutcome};
pub use verifier::Verifier;
pub use workloads::{Accumulate, Fill, MatMul, PartitionWork, VectorAdd, Workload};

pub use fanout_types::{FanoutError, Result, RunConfig, RunReport};
