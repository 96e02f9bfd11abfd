//! Matmul command - row-partitioned matrix multiply

use super::{run_workload, CommandStatus, RunArgs};
use crate::{config::CliConfig, output::OutputFormat};
use clap::Args;
use fanout_engine::MatMul;
use fanout_types::Result;

/// Default base size: C is 64 x 256, A is 64 x 128
pub const DEFAULT_MATMUL_SIZE: usize = 512;

#[derive(Args)]
pub struct MatmulCommand {
    /// Base size: M = size/8, N = size/4, P = size/2
    #[arg(default_value_t = DEFAULT_MATMUL_SIZE)]
    pub size: usize,

    /// Number of root devices to use, in enumeration order
    pub device_count: Option<usize>,

    #[command(flatten)]
    pub run: RunArgs,
}

pub async fn execute(
    cmd: MatmulCommand,
    config: CliConfig,
    format: OutputFormat,
) -> Result<CommandStatus> {
    let mut run = config.run.clone();
    cmd.run.apply(&mut run);
    if cmd.device_count.is_some() {
        run.device_count = cmd.device_count;
    }

    let workload = MatMul::from_size(cmd.size);
    let (m, n, p) = workload.dims();
    tracing::info!(m, n, p, "matrix multiply");
    run_workload(workload, &config, run, format).await
}
