//! Backend implementations

pub mod host;
pub mod queue;

// Re-export backend implementations
pub use host::*;
pub use queue::*;
