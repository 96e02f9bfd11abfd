//! Vecadd command - distributed integer vector addition

use super::{run_workload, CommandStatus, RunArgs};
use crate::{config::CliConfig, output::OutputFormat};
use clap::Args;
use fanout_engine::VectorAdd;
use fanout_types::Result;

#[derive(Args)]
pub struct VecaddCommand {
    /// Number of elements (defaults to `run.problem_size`)
    pub problem_size: Option<usize>,

    /// Number of root devices to use, in enumeration order
    pub device_count: Option<usize>,

    #[command(flatten)]
    pub run: RunArgs,
}

pub async fn execute(
    cmd: VecaddCommand,
    config: CliConfig,
    format: OutputFormat,
) -> Result<CommandStatus> {
    let mut run = config.run.clone();
    cmd.run.apply(&mut run);
    if let Some(size) = cmd.problem_size {
        run.problem_size = size;
    }
    if cmd.device_count.is_some() {
        run.device_count = cmd.device_count;
    }

    let workload = VectorAdd::new(run.problem_size);
    run_workload(workload, &config, run, format).await
}
