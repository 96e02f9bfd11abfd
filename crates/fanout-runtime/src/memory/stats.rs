//! Memory statistics tracking

use fanout_types::{DeviceId, DeviceMemoryStats};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Lock-free counters for one device
pub struct MemoryStatsTracker {
    device: DeviceId,
    current_usage: AtomicUsize,
    peak_usage: AtomicUsize,
    active_allocations: AtomicUsize,
    allocation_count: AtomicU64,
    deallocation_count: AtomicU64,
    allocation_failures: AtomicU64,
}

impl MemoryStatsTracker {
    pub fn new(device: DeviceId) -> Self {
        Self {
            device,
            current_usage: AtomicUsize::new(0),
            peak_usage: AtomicUsize::new(0),
            active_allocations: AtomicUsize::new(0),
            allocation_count: AtomicU64::new(0),
            deallocation_count: AtomicU64::new(0),
            allocation_failures: AtomicU64::new(0),
        }
    }

    /// Record allocation
    pub fn record_allocation(&self, size: usize) {
        self.allocation_count.fetch_add(1, Ordering::Relaxed);
        self.active_allocations.fetch_add(1, Ordering::Relaxed);

        let new_usage = self.current_usage.fetch_add(size, Ordering::Relaxed) + size;

        let mut peak = self.peak_usage.load(Ordering::Relaxed);
        while new_usage > peak {
            match self.peak_usage.compare_exchange_weak(
                peak,
                new_usage,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current_peak) => peak = current_peak,
            }
        }
    }

    /// Record deallocation
    pub fn record_deallocation(&self, size: usize) {
        self.deallocation_count.fetch_add(1, Ordering::Relaxed);
        self.active_allocations.fetch_sub(1, Ordering::Relaxed);
        self.current_usage.fetch_sub(size, Ordering::Relaxed);
    }

    /// Record allocation failure
    pub fn record_allocation_failure(&self) {
        self.allocation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn current_usage(&self) -> usize {
        self.current_usage.load(Ordering::Relaxed)
    }

    pub fn deallocation_count(&self) -> u64 {
        self.deallocation_count.load(Ordering::Relaxed)
    }

    /// Snapshot against a device capacity
    pub fn snapshot(&self, capacity_bytes: usize) -> DeviceMemoryStats {
        DeviceMemoryStats {
            device: self.device,
            capacity_bytes,
            used_bytes: self.current_usage.load(Ordering::Relaxed),
            peak_bytes: self.peak_usage.load(Ordering::Relaxed),
            live_allocations: self.active_allocations.load(Ordering::Relaxed),
            total_allocations: self.allocation_count.load(Ordering::Relaxed),
            failed_allocations: self.allocation_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_survives_deallocation() {
        let tracker = MemoryStatsTracker::new(DeviceId::root(0));
        tracker.record_allocation(100);
        tracker.record_allocation(50);
        tracker.record_deallocation(100);

        let stats = tracker.snapshot(1000);
        assert_eq!(stats.used_bytes, 50);
        assert_eq!(stats.peak_bytes, 150);
        assert_eq!(stats.live_allocations, 1);
        assert_eq!(stats.total_allocations, 2);
        assert_eq!(tracker.deallocation_count(), 1);
    }
}
