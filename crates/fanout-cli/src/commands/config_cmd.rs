//! Configuration command implementation

use super::CommandStatus;
use crate::{
    config::{CliConfig, DEFAULT_CONFIG_FILE},
    output::{print_json, OutputFormat},
};
use clap::Args;
use colored::*;
use fanout_types::{FanoutError, Result};
use std::path::Path;

#[derive(Args)]
pub struct ConfigCommand {
    /// Show the effective configuration
    #[arg(short, long)]
    pub show: bool,

    /// Validate configuration
    #[arg(long)]
    pub validate: bool,

    /// Write a default configuration file
    #[arg(long)]
    pub generate: bool,

    /// Output file for the generated config
    #[arg(short, long)]
    pub output: Option<String>,

    /// Overwrite an existing file when generating
    #[arg(long)]
    pub force: bool,
}

pub async fn execute(
    cmd: ConfigCommand,
    config: CliConfig,
    format: OutputFormat,
) -> Result<CommandStatus> {
    if cmd.validate {
        validate_config(&config)?;
    } else if cmd.generate {
        let output = cmd.output.as_deref().unwrap_or(DEFAULT_CONFIG_FILE);
        generate_config(output, cmd.force).await?;
    } else {
        show_config(&config, format)?;
    }
    Ok(CommandStatus::Success)
}

fn show_config(config: &CliConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(config),
        OutputFormat::Pretty => {
            let text = toml::to_string_pretty(config).map_err(|e| {
                FanoutError::serialization(format!("Failed to serialize config: {}", e))
            })?;
            println!("{}", text.trim_end());
            Ok(())
        }
    }
}

fn validate_config(config: &CliConfig) -> Result<()> {
    match config.validate() {
        Ok(()) => {
            println!("{} Configuration is valid", "✓".green());
            Ok(())
        }
        Err(e) => {
            println!("{} Configuration validation failed", "✗".red());
            Err(e)
        }
    }
}

async fn generate_config(output: &str, force: bool) -> Result<()> {
    if Path::new(output).exists() && !force {
        return Err(FanoutError::config(format!(
            "{} already exists, pass --force to overwrite",
            output
        )));
    }

    CliConfig::default().save(output).await?;
    println!("{} Wrote default configuration to {}", "✓".green(), output.cyan());
    Ok(())
}
