//! Device discovery
//!
//! Walks the backend's platforms in enumeration order, keeps only platforms
//! that can host execution contexts, and optionally expands every root
//! device into its sub-devices. A device that cannot be partitioned is kept
//! whole; partitioning failures are diagnostics, never errors.

use fanout_interfaces::ComputeBackend;
use fanout_types::{
    BackendKind, DeviceInfo, DiscoveryReport, FanoutError, PlatformInfo, Result, RootDeviceReport,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Enumeration options
#[derive(Debug, Clone)]
pub struct EnumeratorOptions {
    /// Expand partitionable devices into sub-devices
    pub split_sub_devices: bool,
    /// Only consider platforms of this kind
    pub required_backend: Option<BackendKind>,
}

impl Default for EnumeratorOptions {
    fn default() -> Self {
        Self {
            split_sub_devices: true,
            required_backend: None,
        }
    }
}

/// Discovers the devices a run can use
pub struct DeviceEnumerator {
    backend: Arc<dyn ComputeBackend>,
    options: EnumeratorOptions,
}

impl DeviceEnumerator {
    pub fn new(backend: Arc<dyn ComputeBackend>, options: EnumeratorOptions) -> Self {
        Self { backend, options }
    }

    /// Platforms whose devices can back a context, in backend order
    pub fn usable_platforms(&self) -> Vec<PlatformInfo> {
        self.backend
            .platforms()
            .into_iter()
            .filter(|p| {
                if !p.submittable {
                    debug!(platform = %p.name, "skipping platform without queue support");
                    return false;
                }
                match self.options.required_backend {
                    Some(kind) if kind != p.kind => {
                        debug!(
                            platform = %p.name,
                            kind = %p.kind,
                            required = %kind,
                            "skipping platform"
                        );
                        false
                    }
                    _ => true,
                }
            })
            .collect()
    }

    /// Root devices of all usable platforms, in enumeration order
    pub fn root_devices(&self) -> Result<Vec<DeviceInfo>> {
        let mut roots = Vec::new();
        for platform in self.usable_platforms() {
            match self.backend.devices(&platform) {
                Ok(devices) => roots.extend(devices),
                Err(e) => warn!(platform = %platform.name, error = %e, "failed to list devices"),
            }
        }
        if roots.is_empty() {
            return Err(FanoutError::no_device(match self.options.required_backend {
                Some(kind) => format!("no {} device can host an execution context", kind),
                None => "no device can host an execution context".to_string(),
            }));
        }
        Ok(roots)
    }

    /// Discover root devices and how each one expands
    pub fn discover(&self) -> Result<DiscoveryReport> {
        let roots = self
            .root_devices()?
            .into_iter()
            .map(|root| self.expand(root))
            .collect::<Vec<_>>();

        let report = DiscoveryReport { roots };
        info!(
            backend = self.backend.name(),
            roots = report.root_count(),
            devices = report.leaf_count(),
            "device discovery complete"
        );
        Ok(report)
    }

    /// Leaf devices in enumeration order
    pub fn enumerate(&self) -> Result<Vec<DeviceInfo>> {
        Ok(self.discover()?.leaves())
    }

    fn expand(&self, root: DeviceInfo) -> RootDeviceReport {
        if !self.options.split_sub_devices {
            return RootDeviceReport {
                leaves: vec![root.clone()],
                root,
                fallback: None,
            };
        }

        let failure = match self.backend.partition_device(&root) {
            Ok(subs) if !subs.is_empty() => {
                debug!(device = %root.id, sub_devices = subs.len(), "partitioned device");
                return RootDeviceReport {
                    root,
                    leaves: subs,
                    fallback: None,
                };
            }
            Ok(_) => "backend returned no sub-devices".to_string(),
            Err(e) => e.to_string(),
        };

        warn!(
            device = %root.id,
            name = %root.name,
            reason = %failure,
            "partitioning failed, using the whole device"
        );
        RootDeviceReport {
            leaves: vec![root.clone()],
            root,
            fallback: Some(failure),
        }
    }
}
