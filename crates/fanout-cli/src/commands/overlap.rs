//! Overlap command - concurrent busy kernels with execution timing

use super::{run_workload, CommandStatus, RunArgs};
use crate::{config::CliConfig, output::OutputFormat};
use clap::Args;
use fanout_engine::Accumulate;
use fanout_types::{Result, SubmissionMode};

#[derive(Args)]
pub struct OverlapCommand {
    /// Number of elements
    #[arg(default_value_t = 1 << 16)]
    pub problem_size: usize,

    /// Accumulation passes per launch; more passes mean longer kernels
    #[arg(long, default_value_t = 256)]
    pub passes: usize,

    /// Number of root devices to use, in enumeration order
    #[arg(long)]
    pub device_count: Option<usize>,

    #[command(flatten)]
    pub run: RunArgs,
}

pub async fn execute(
    cmd: OverlapCommand,
    config: CliConfig,
    format: OutputFormat,
) -> Result<CommandStatus> {
    let mut run = config.run.clone();
    run.iterations = 10;
    cmd.run.apply(&mut run);
    run.profiling = true;
    run.submission = SubmissionMode::ThreadPerContext;
    if cmd.device_count.is_some() {
        run.device_count = cmd.device_count;
    }

    let workload = Accumulate::new(cmd.problem_size, cmd.passes);
    run_workload(workload, &config, run, format).await
}
