//! Fanout CLI - distribute compute kernels across devices and sub-devices
//!
//! This binary discovers devices, runs the bundled workloads across every
//! usable context and reports how the work was split and whether the
//! reassembled output verified.

use clap::{Parser, Subcommand};
use fanout_cli::{
    commands::*,
    config::{CliConfig, DEFAULT_CONFIG_FILE},
    output::{print_error, OutputFormat},
    utils::setup_logging,
};
use std::process;

#[derive(Parser)]
#[command(name = "fanout")]
#[command(about = "Multi-device work distribution")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    long_about = "Splits a problem across every device and sub-device a backend exposes, \
                  dispatches one kernel per slice and verifies the gathered result"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (only errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    format: OutputFormat,

    /// Topology preset to simulate, overriding the config file
    #[arg(long, global = true)]
    topology: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show discovered devices
    Devices(DevicesCommand),

    /// Distributed vector addition
    Vecadd(VecaddCommand),

    /// Row-partitioned matrix multiply
    Matmul(MatmulCommand),

    /// Concurrent kernels with execution timing
    Overlap(OverlapCommand),

    /// Show, validate or generate configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match CliConfig::load(&cli.config).await {
        Ok(config) => config,
        Err(e) => {
            print_error(&e);
            process::exit(1);
        }
    };
    if let Some(preset) = cli.topology {
        config.backend.preset = preset;
        config.backend.topology = None;
    }

    if let Err(e) = setup_logging(cli.verbose, cli.quiet, &config.logging.level) {
        print_error(&e);
        process::exit(1);
    }

    let result = match cli.command {
        Commands::Devices(cmd) => devices::execute(cmd, config, cli.format).await,
        Commands::Vecadd(cmd) => vecadd::execute(cmd, config, cli.format).await,
        Commands::Matmul(cmd) => matmul::execute(cmd, config, cli.format).await,
        Commands::Overlap(cmd) => overlap::execute(cmd, config, cli.format).await,
        Commands::Config(cmd) => config_cmd::execute(cmd, config, cli.format).await,
    };

    match result {
        Ok(CommandStatus::Success) => {}
        Ok(CommandStatus::VerificationFailed) => process::exit(1),
        Err(e) => {
            print_error(&e);
            process::exit(1);
        }
    }
}
