//! # Fanout CLI Library
//!
//! Command-line front end for the fanout work distribution engine.
//!
//! ## Commands
//!
//! - `devices`: Show discovered root devices and their sub-devices
//! - `vecadd`: Distributed vector addition
//! - `matmul`: Row-partitioned matrix multiply
//! - `overlap`: Concurrent busy kernels with execution timing
//! - `config`: Show, validate or generate `fanout.toml`

pub mod commands;
pub mod config;
pub mod output;
pub mod utils;

// Re-exports
pub use config::CliConfig;
