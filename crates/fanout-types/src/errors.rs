//! Error types for fanout

use crate::launch::LaunchFailure;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for fanout operations
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
pub enum FanoutError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Invalid parameters passed to an operation
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// Enumeration produced no usable device
    #[error("No device found: {message}")]
    NoDeviceFound { message: String },

    /// Fewer devices than the run asked for
    #[error("Insufficient devices: {required} required, {found} found")]
    InsufficientDevices { required: usize, found: usize },

    /// The backend cannot split a device into sub-devices
    #[error("Partitioning unsupported for {device}: {message}")]
    PartitionUnsupported { device: String, message: String },

    /// The backend refused to create a queue for a device
    #[error("Context creation failed for {device}: {message}")]
    ContextCreation { device: String, message: String },

    /// A buffer allocation could not be satisfied
    #[error("Allocation failed on {device}: requested {requested_bytes} bytes: {message}")]
    Allocation {
        device: String,
        requested_bytes: usize,
        message: String,
    },

    /// A launch failed outside the normal return path
    #[error("Asynchronous launch error on {device}: {message}")]
    AsyncLaunch { device: String, message: String },

    /// One or more launches of a batch failed
    #[error("{} of {total} launches failed{}", .failures.len(), summarize(.failures))]
    PartialExecution {
        failures: Vec<LaunchFailure>,
        total: usize,
    },

    /// Backend/runtime errors
    #[error("Backend error: {message}")]
    Backend { message: String },

    /// I/O errors
    #[error("I/O error: {message}")]
    IO { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Internal errors (should not happen in normal operation)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn summarize(failures: &[LaunchFailure]) -> String {
    match failures.first() {
        Some(first) => format!(": first failure {}", first),
        None => String::new(),
    }
}

impl FanoutError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create a no-device error
    pub fn no_device(message: impl Into<String>) -> Self {
        Self::NoDeviceFound {
            message: message.into(),
        }
    }

    /// Create an insufficient-devices error
    pub fn insufficient_devices(required: usize, found: usize) -> Self {
        Self::InsufficientDevices { required, found }
    }

    /// Create a partition-unsupported error
    pub fn partition_unsupported(device: impl ToString, message: impl Into<String>) -> Self {
        Self::PartitionUnsupported {
            device: device.to_string(),
            message: message.into(),
        }
    }

    /// Create a context creation error
    pub fn context_creation(device: impl ToString, message: impl Into<String>) -> Self {
        Self::ContextCreation {
            device: device.to_string(),
            message: message.into(),
        }
    }

    /// Create an allocation error
    pub fn allocation(
        device: impl ToString,
        requested_bytes: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Allocation {
            device: device.to_string(),
            requested_bytes,
            message: message.into(),
        }
    }

    /// Create an asynchronous launch error
    pub fn async_launch(device: impl ToString, message: impl Into<String>) -> Self {
        Self::AsyncLaunch {
            device: device.to_string(),
            message: message.into(),
        }
    }

    /// Create a partial execution error from the failed launches of a batch
    pub fn partial_execution(failures: Vec<LaunchFailure>, total: usize) -> Self {
        Self::PartialExecution { failures, total }
    }

    /// Create a backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Create an I/O error
    pub fn io(message: impl Into<String>) -> Self {
        Self::IO {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Errors that stop the whole run as soon as they are raised
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NoDeviceFound { .. }
                | Self::InsufficientDevices { .. }
                | Self::ContextCreation { .. }
                | Self::Allocation { .. }
                | Self::AsyncLaunch { .. }
                | Self::Backend { .. }
                | Self::Internal { .. }
        )
    }

    /// Errors the enumerator absorbs locally
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PartitionUnsupported { .. })
    }

    /// Failed launches carried by a partial execution error
    pub fn launch_failures(&self) -> &[LaunchFailure] {
        match self {
            Self::PartialExecution { failures, .. } => failures,
            _ => &[],
        }
    }
}

/// Conversion from std::io::Error
impl From<std::io::Error> for FanoutError {
    fn from(err: std::io::Error) -> Self {
        Self::io(format!("{}", err))
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for FanoutError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("{}", err))
    }
}
