//! Capacity-bounded device memory ledger

use crate::memory::stats::MemoryStatsTracker;
use fanout_interfaces::MemoryLedger;
use fanout_types::{BufferId, DeviceId, DeviceMemoryStats, FanoutError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Allocation granularity in bytes
pub const ALLOCATION_ALIGNMENT: usize = 256;

/// Memory of one device: a fixed capacity and the live reservations
/// against it
pub struct DeviceMemory {
    device: DeviceId,
    capacity: usize,
    blocks: Mutex<HashMap<BufferId, usize>>,
    next_id: AtomicU64,
    stats: MemoryStatsTracker,
}

impl DeviceMemory {
    pub fn new(device: DeviceId, capacity: usize) -> Self {
        Self {
            device,
            capacity,
            blocks: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            stats: MemoryStatsTracker::new(device),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn used(&self) -> usize {
        self.stats.current_usage()
    }
}

impl MemoryLedger for DeviceMemory {
    fn device(&self) -> DeviceId {
        self.device
    }

    fn reserve(&self, bytes: usize) -> Result<BufferId> {
        let aligned = align_size(bytes, ALLOCATION_ALIGNMENT);

        // Hold the block table while checking so concurrent reservations
        // cannot overcommit
        let mut blocks = self.blocks.lock();
        let used = self.stats.current_usage();
        if used.saturating_add(aligned) > self.capacity {
            self.stats.record_allocation_failure();
            warn!(
                device = %self.device,
                requested = bytes,
                used,
                capacity = self.capacity,
                "device allocation failed"
            );
            return Err(FanoutError::allocation(
                self.device,
                bytes,
                format!(
                    "{} of {} bytes in use, {} aligned bytes do not fit",
                    used, self.capacity, aligned
                ),
            ));
        }

        let id = BufferId(self.next_id.fetch_add(1, Ordering::Relaxed));
        blocks.insert(id, aligned);
        self.stats.record_allocation(aligned);
        debug!(device = %self.device, buffer = %id, bytes = aligned, "reserved device memory");
        Ok(id)
    }

    fn release(&self, id: BufferId) {
        match self.blocks.lock().remove(&id) {
            Some(size) => {
                self.stats.record_deallocation(size);
                debug!(device = %self.device, buffer = %id, bytes = size, "released device memory");
            }
            None => warn!(device = %self.device, buffer = %id, "release of unknown buffer"),
        }
    }

    fn stats(&self) -> DeviceMemoryStats {
        self.stats.snapshot(self.capacity)
    }
}

/// Align size to specified boundary
fn align_size(size: usize, alignment: usize) -> usize {
    size.saturating_add(alignment - 1) & !(alignment - 1)
}
