//! Device memory accounting
//!
//! Buffers do not talk to the allocator directly: they hold a
//! [`Reservation`] against the [`MemoryLedger`] of their device, which is
//! released when the last owner drops it.

use fanout_types::{BufferId, DeviceId, DeviceMemoryStats, Result};
use std::sync::Arc;

/// Per-device memory accounting
pub trait MemoryLedger: Send + Sync {
    /// Device the ledger accounts for
    fn device(&self) -> DeviceId;

    /// Reserve `bytes`, failing with an allocation error when the device
    /// cannot hold them
    fn reserve(&self, bytes: usize) -> Result<BufferId>;

    /// Return a reservation; unknown ids are ignored
    fn release(&self, id: BufferId);

    /// Current counters
    fn stats(&self) -> DeviceMemoryStats;
}

/// A live reservation, released on drop
pub struct Reservation {
    id: BufferId,
    bytes: usize,
    ledger: Arc<dyn MemoryLedger>,
}

impl Reservation {
    pub fn new(ledger: Arc<dyn MemoryLedger>, bytes: usize) -> Result<Self> {
        let id = ledger.reserve(bytes)?;
        Ok(Self { id, bytes, ledger })
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn device(&self) -> DeviceId {
        self.ledger.device()
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.ledger.release(self.id);
    }
}

impl std::fmt::Debug for Reservation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reservation")
            .field("id", &self.id)
            .field("bytes", &self.bytes)
            .field("device", &self.ledger.device())
            .finish()
    }
}
