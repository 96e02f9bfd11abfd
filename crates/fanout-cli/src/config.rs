//! CLI configuration management
//!
//! Handles loading and saving of the `fanout.toml` configuration file.

use fanout_runtime::{FaultPlan, HostBackend, HostTopology};
use fanout_types::{FanoutError, Result, RunConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "fanout.toml";

/// CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Run settings shared by every workload command
    pub run: RunConfig,

    /// Simulated machine
    pub backend: BackendConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Topology preset, used when no inline topology is given
    pub preset: String,

    /// Inline topology description
    pub topology: Option<HostTopology>,

    /// Failures to inject
    pub faults: FaultPlan,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when neither `-v` nor `-q` is given and `RUST_LOG` is unset
    pub level: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            preset: "dual_max_1550".to_string(),
            topology: None,
            faults: FaultPlan::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl BackendConfig {
    /// The topology to simulate: inline description first, then the preset
    pub fn resolve_topology(&self) -> Result<HostTopology> {
        match &self.topology {
            Some(topology) => Ok(topology.clone()),
            None => HostTopology::preset(&self.preset),
        }
    }

    pub fn build(&self) -> Result<Arc<HostBackend>> {
        Ok(Arc::new(HostBackend::with_faults(
            self.resolve_topology()?,
            self.faults.clone(),
        )))
    }
}

impl CliConfig {
    /// Load configuration from file, falling back to defaults when the file
    /// does not exist
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| FanoutError::io(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| FanoutError::config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to file
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FanoutError::config(format!("Failed to serialize config: {}", e)))?;

        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                FanoutError::io(format!("Failed to create config directory: {}", e))
            })?;
        }

        fs::write(path, content)
            .await
            .map_err(|e| FanoutError::io(format!("Failed to write config file: {}", e)))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.run.validate()?;
        let topology = self.backend.resolve_topology()?;
        if topology.root_device_count() == 0 {
            return Err(FanoutError::config("Topology declares no devices"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = CliConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: CliConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let text = r#"
            [run]
            problem_size = 4096
            device_count = 1

            [run.verification]
            policy = "full"

            [backend.faults]
            unpartitionable = [0]
        "#;
        let config: CliConfig = toml::from_str(text).unwrap();
        assert_eq!(config.run.problem_size, 4096);
        assert_eq!(config.run.device_count, Some(1));
        assert_eq!(config.run.iterations, 1);
        assert_eq!(config.backend.preset, "dual_max_1550");
        assert_eq!(config.backend.faults.unpartitionable, vec![0]);
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_preset_fails_validation() {
        let mut config = CliConfig::default();
        config.backend.preset = "quad".to_string();
        assert!(matches!(config.validate(), Err(FanoutError::Config { .. })));
    }
}
