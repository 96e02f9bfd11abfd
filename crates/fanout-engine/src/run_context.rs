//! Everything a run owns: backend, discovered devices and contexts

use crate::context::{handler_for, ContextOptions, ContextPool};
use crate::enumerator::{DeviceEnumerator, EnumeratorOptions};
use crate::partitioner::PartitionTable;
use fanout_interfaces::ComputeBackend;
use fanout_types::{
    DeviceId, DeviceInfo, DiscoveryReport, FanoutError, PartitionStrategy, Result, RunConfig,
};
use std::sync::Arc;
use tracing::info;

/// Explicitly constructed state of one run.
///
/// Dropping it drains every context before the backend goes away.
pub struct RunContext {
    // Field order matters: contexts are dropped before the backend.
    pool: ContextPool,
    discovery: DiscoveryReport,
    config: RunConfig,
    backend: Arc<dyn ComputeBackend>,
}

impl RunContext {
    /// Discover devices, select the requested roots and create one context
    /// per leaf device
    pub fn new(backend: Arc<dyn ComputeBackend>, config: RunConfig) -> Result<Self> {
        config.validate()?;

        let enumerator = DeviceEnumerator::new(
            backend.clone(),
            EnumeratorOptions {
                split_sub_devices: config.split_devices,
                required_backend: config.required_backend,
            },
        );
        let mut discovery = enumerator.discover()?;

        if let Some(required) = config.device_count {
            let found = discovery.root_count();
            if found < required {
                return Err(FanoutError::insufficient_devices(required, found));
            }
            discovery.roots.truncate(required);
        }

        let options = ContextOptions {
            profiling: config.profiling,
            failure_policy: config.context_failure,
            async_errors: handler_for(config.async_errors),
        };
        let pool = ContextPool::create(backend.as_ref(), &discovery.leaves(), &options)?;

        info!(
            roots = discovery.root_count(),
            contexts = pool.len(),
            profiling = config.profiling,
            "run context ready"
        );
        Ok(Self {
            pool,
            discovery,
            config,
            backend,
        })
    }

    pub fn backend(&self) -> &Arc<dyn ComputeBackend> {
        &self.backend
    }

    pub fn discovery(&self) -> &DiscoveryReport {
        &self.discovery
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn pool(&self) -> &ContextPool {
        &self.pool
    }

    /// Devices backing the contexts, in context order
    pub fn devices(&self) -> Vec<DeviceInfo> {
        self.pool.iter().map(|c| c.device().clone()).collect()
    }

    /// Number of contexts per root device, in context order
    pub fn root_groups(&self) -> Vec<usize> {
        let mut groups: Vec<(DeviceId, usize)> = Vec::new();
        for ctx in self.pool.iter() {
            let root = ctx.device_id().root_id();
            match groups.last_mut() {
                Some((last, n)) if *last == root => *n += 1,
                _ => groups.push((root, 1)),
            }
        }
        groups.into_iter().map(|(_, n)| n).collect()
    }

    /// Partition `[0, total)` across the contexts with the configured
    /// strategy
    pub fn partition_table(&self, total: usize) -> Result<PartitionTable> {
        match self.config.partition_strategy {
            PartitionStrategy::Flat => PartitionTable::flat(total, self.pool.len()),
            PartitionStrategy::Hierarchical => {
                PartitionTable::hierarchical(total, &self.root_groups())
            }
        }
    }
}
