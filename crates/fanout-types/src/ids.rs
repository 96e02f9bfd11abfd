//! Identifier types for fanout entities

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a root device or one of its sub-devices.
///
/// `ordinal` is the position of the root device in backend enumeration order
/// (across all platforms); `sub` is the tile index when the device was carved
/// out of a root device.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId {
    pub ordinal: usize,
    pub sub: Option<usize>,
}

impl DeviceId {
    /// Identifier of a root device
    pub const fn root(ordinal: usize) -> Self {
        Self { ordinal, sub: None }
    }

    /// Identifier of a sub-device of `ordinal`
    pub const fn sub_device(ordinal: usize, sub: usize) -> Self {
        Self {
            ordinal,
            sub: Some(sub),
        }
    }

    /// Whether this id names a sub-device
    pub fn is_sub_device(&self) -> bool {
        self.sub.is_some()
    }

    /// The root device this id belongs to
    pub fn root_id(&self) -> DeviceId {
        DeviceId::root(self.ordinal)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sub {
            Some(sub) => write!(f, "dev{}.{}", self.ordinal, sub),
            None => write!(f, "dev{}", self.ordinal),
        }
    }
}

/// Execution context identifier, dense and zero-based within a run
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(pub usize);

impl ContextId {
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx{}", self.0)
    }
}

/// Launch identifier, unique per backend
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LaunchId(pub u64);

impl fmt::Display for LaunchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "launch#{}", self.0)
    }
}

/// Buffer identifier, unique per device memory ledger
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BufferId(pub u64);

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buf#{}", self.0)
    }
}

/// Run identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
