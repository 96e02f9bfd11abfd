//! Typed device buffers
//!
//! A [`Buffer`] is memory associated with one execution queue. Kernels never
//! see the buffer itself; they capture a [`BufferBinding`], which shares the
//! storage and the memory reservation and enforces the access mode the
//! buffer was created with.

use crate::backend::ExecutionQueue;
use crate::element::Element;
use crate::memory::Reservation;
use fanout_types::{AccessMode, BufferId, DeviceId, FanoutError, Result};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Memory owned by one context, holding `len` elements of `T`
pub struct Buffer<T: Element> {
    access: AccessMode,
    len: usize,
    data: Arc<RwLock<Vec<T>>>,
    reservation: Arc<Reservation>,
}

impl<T: Element> Buffer<T> {
    /// Allocate a default-initialised buffer on the queue's device
    pub fn allocate(
        queue: &dyn ExecutionQueue,
        len: usize,
        access: AccessMode,
    ) -> Result<Self> {
        Self::from_fn(queue, len, access, |_| T::default())
    }

    /// Allocate a buffer and initialise element `i` with `init(i)`.
    ///
    /// Device memory is reserved before any host memory is touched.
    pub fn from_fn<F>(
        queue: &dyn ExecutionQueue,
        len: usize,
        access: AccessMode,
        init: F,
    ) -> Result<Self>
    where
        F: FnMut(usize) -> T,
    {
        let reservation = reserve::<T>(queue, len)?;
        Ok(Self::with_reservation((0..len).map(init).collect(), access, reservation))
    }

    /// Allocate a buffer and copy `data` into it
    pub fn from_host(
        queue: &dyn ExecutionQueue,
        data: Vec<T>,
        access: AccessMode,
    ) -> Result<Self> {
        let reservation = reserve::<T>(queue, data.len())?;
        Ok(Self::with_reservation(data, access, reservation))
    }

    fn with_reservation(data: Vec<T>, access: AccessMode, reservation: Reservation) -> Self {
        Self {
            access,
            len: data.len(),
            data: Arc::new(RwLock::new(data)),
            reservation: Arc::new(reservation),
        }
    }

    pub fn id(&self) -> BufferId {
        self.reservation.id()
    }

    pub fn device(&self) -> DeviceId {
        self.reservation.device()
    }

    pub fn access(&self) -> AccessMode {
        self.access
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn size_bytes(&self) -> usize {
        self.reservation.bytes()
    }

    /// Handle for a kernel body
    pub fn binding(&self) -> BufferBinding<T> {
        BufferBinding {
            id: self.id(),
            access: self.access,
            data: self.data.clone(),
            _reservation: self.reservation.clone(),
        }
    }

    /// Copy the contents back to the host.
    ///
    /// Only meaningful once every launch writing the buffer is terminal.
    pub fn to_host(&self) -> Vec<T> {
        self.data.read().clone()
    }
}

impl<T: Element> std::fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.id())
            .field("device", &self.device())
            .field("dtype", &T::DTYPE)
            .field("len", &self.len)
            .field("access", &self.access)
            .finish()
    }
}

fn reserve<T: Element>(queue: &dyn ExecutionQueue, len: usize) -> Result<Reservation> {
    let ledger = queue.memory();
    let bytes = len.checked_mul(T::DTYPE.size_bytes()).ok_or_else(|| {
        FanoutError::allocation(
            ledger.device(),
            usize::MAX,
            format!("{} elements of {:?} overflow the address space", len, T::DTYPE),
        )
    })?;
    Reservation::new(ledger, bytes)
}

/// Kernel-side view of a buffer
#[derive(Clone)]
pub struct BufferBinding<T: Element> {
    id: BufferId,
    access: AccessMode,
    data: Arc<RwLock<Vec<T>>>,
    _reservation: Arc<Reservation>,
}

impl<T: Element> BufferBinding<T> {
    pub fn read(&self) -> std::result::Result<RwLockReadGuard<'_, Vec<T>>, String> {
        if !self.access.is_readable() {
            return Err(format!("{} is write-only", self.id));
        }
        Ok(self.data.read())
    }

    pub fn write(&self) -> std::result::Result<RwLockWriteGuard<'_, Vec<T>>, String> {
        if !self.access.is_writable() {
            return Err(format!("{} is read-only", self.id));
        }
        Ok(self.data.write())
    }
}

/// Fail unless `access` allows what a kernel argument needs
pub fn check_access(id: BufferId, access: AccessMode, needs_write: bool) -> Result<()> {
    let ok = if needs_write {
        access.is_writable()
    } else {
        access.is_readable()
    };
    if ok {
        Ok(())
    } else {
        Err(FanoutError::invalid_parameter(format!(
            "{} has access mode {:?}, cannot be used as {}",
            id,
            access,
            if needs_write { "an output" } else { "an input" }
        )))
    }
}
