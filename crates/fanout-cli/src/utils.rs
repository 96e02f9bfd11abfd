//! CLI utility functions

use fanout_types::{FanoutError, Result};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Setup logging based on verbosity level.
///
/// `-v` and `-q` win over everything; otherwise `RUST_LOG` is honoured and
/// `default_level` (from the config file) applies when it is unset.
pub fn setup_logging(verbose: bool, quiet: bool, default_level: &str) -> Result<()> {
    let filter = if quiet {
        EnvFilter::new(tracing::Level::ERROR.to_string())
    } else if verbose {
        EnvFilter::new(tracing::Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_level))
            .map_err(|e| {
                FanoutError::config(format!("Invalid log level '{}': {}", default_level, e))
            })?
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init()
        .map_err(|e| FanoutError::internal(format!("Failed to install logger: {}", e)))
}

/// Render a byte count with a binary unit
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(4096), "4.0 KiB");
        assert_eq!(format_bytes(128 * 1024 * 1024 * 1024), "128.0 GiB");
    }
}
