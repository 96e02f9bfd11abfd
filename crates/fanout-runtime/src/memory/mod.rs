//! Device memory accounting for the host backend

pub mod pool;
pub mod stats;

// Re-export memory components
pub use pool::*;
pub use stats::*;
