//! Core type definitions for fanout
//!
//! This crate contains the identifiers, device descriptors, partition ranges,
//! launch bookkeeping, verification results, run configuration and error
//! taxonomy shared by every other fanout crate. It carries no runtime logic
//! beyond small helpers on the types themselves.

pub mod config;
pub mod devices;
pub mod errors;
pub mod ids;
pub mod launch;
pub mod partition;
pub mod report;
pub mod verification;

// Re-export commonly used types
pub use config::*;
pub use devices::*;
pub use errors::*;
pub use ids::*;
pub use launch::*;
pub use partition::*;
pub use report::*;
pub use verification::*;

/// Result type used throughout fanout
pub type Result<T> = std::result::Result<T, FanoutError>;
