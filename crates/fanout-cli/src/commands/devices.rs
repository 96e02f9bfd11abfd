//! Devices command - show what enumeration finds

use super::{BackendArg, CommandStatus};
use crate::{config::CliConfig, output::print_discovery, output::OutputFormat};
use clap::Args;
use fanout_engine::{DeviceEnumerator, EnumeratorOptions};
use fanout_types::Result;

#[derive(Args)]
pub struct DevicesCommand {
    /// Do not split root devices into sub-devices
    #[arg(long)]
    pub no_split: bool,

    /// Only list platforms of this backend
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,
}

pub async fn execute(
    cmd: DevicesCommand,
    config: CliConfig,
    format: OutputFormat,
) -> Result<CommandStatus> {
    let backend = config.backend.build()?;
    let options = EnumeratorOptions {
        split_sub_devices: config.run.split_devices && !cmd.no_split,
        required_backend: cmd
            .backend
            .map(Into::into)
            .or(config.run.required_backend),
    };

    let report = DeviceEnumerator::new(backend, options).discover()?;
    print_discovery(&report, format)?;
    Ok(CommandStatus::Success)
}
