//! CLI command implementations
//!
//! Workload commands share [`RunArgs`] and [`run_workload`]: flags are
//! layered over the `[run]` table of the configuration file and the run
//! itself happens on a blocking task.

pub mod config_cmd;
pub mod devices;
pub mod matmul;
pub mod overlap;
pub mod vecadd;

// Re-exports
pub use config_cmd::ConfigCommand;
pub use devices::DevicesCommand;
pub use matmul::MatmulCommand;
pub use overlap::OverlapCommand;
pub use vecadd::VecaddCommand;

use crate::config::CliConfig;
use crate::output::{print_report, print_warning, OutputFormat};
use clap::{Args, ValueEnum};
use fanout_engine::{RunContext, Runner, Workload};
use fanout_types::{
    AsyncErrorPolicy, BackendKind, ContextFailurePolicy, FanoutError, PartitionStrategy, Result,
    RunConfig, RunReport, SubmissionMode, VerificationPolicy,
};

/// How a command finished when it did not fail outright
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    /// The run completed but its output did not verify
    VerificationFailed,
}

/// Backend kinds accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    LevelZero,
    Opencl,
    Cuda,
    Host,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::LevelZero => BackendKind::LevelZero,
            BackendArg::Opencl => BackendKind::OpenCl,
            BackendArg::Cuda => BackendKind::Cuda,
            BackendArg::Host => BackendKind::Host,
        }
    }
}

/// Flags shared by the workload commands
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Check every output element instead of a random sample
    #[arg(long)]
    pub full_verify: bool,

    /// Number of sampled elements to check
    #[arg(long)]
    pub samples: Option<usize>,

    /// Seed for sampled verification
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of dispatch rounds
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Split across root devices first, then across their sub-devices
    #[arg(long)]
    pub hierarchical: bool,

    /// Submit each context's kernels from its own thread
    #[arg(long)]
    pub thread_per_context: bool,

    /// Record kernel timings
    #[arg(long)]
    pub profile: bool,

    /// Continue without devices whose context cannot be created
    #[arg(long)]
    pub skip_failed_devices: bool,

    /// Use root devices whole instead of splitting them into sub-devices
    #[arg(long)]
    pub no_split: bool,

    /// Only use platforms of this backend
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    /// Log launch errors nobody waited for instead of aborting
    #[arg(long)]
    pub log_async_errors: bool,
}

impl RunArgs {
    /// Layer the flags over a file configuration
    pub fn apply(&self, config: &mut RunConfig) {
        if self.full_verify {
            config.verification.policy = VerificationPolicy::Full;
        }
        if let Some(samples) = self.samples {
            config.verification.samples = samples;
        }
        if self.seed.is_some() {
            config.verification.seed = self.seed;
        }
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        if self.hierarchical {
            config.partition_strategy = PartitionStrategy::Hierarchical;
        }
        if self.thread_per_context {
            config.submission = SubmissionMode::ThreadPerContext;
        }
        if self.profile {
            config.profiling = true;
        }
        if self.skip_failed_devices {
            config.context_failure = ContextFailurePolicy::SkipDevice;
        }
        if self.no_split {
            config.split_devices = false;
        }
        if let Some(backend) = self.backend {
            config.required_backend = Some(backend.into());
        }
        if self.log_async_errors {
            config.async_errors = AsyncErrorPolicy::LogAndContinue;
        }
    }
}

/// Build the backend, run `workload` off the async runtime and print the
/// report
pub async fn run_workload<W>(
    workload: W,
    config: &CliConfig,
    run: RunConfig,
    format: OutputFormat,
) -> Result<CommandStatus>
where
    W: Workload + 'static,
{
    run.validate()?;
    let backend = config.backend.build()?;

    let report = tokio::task::spawn_blocking(move || -> Result<RunReport> {
        let context = RunContext::new(backend, run)?;
        for (device, err) in context.pool().skipped() {
            print_warning(&format!("skipped {}: {}", device, err));
        }
        Ok(Runner::new(&context).run(&workload)?.report)
    })
    .await
    .map_err(|e| FanoutError::internal(format!("Run task failed: {}", e)))??;

    print_report(&report, format)?;
    Ok(if report.passed() {
        CommandStatus::Success
    } else {
        CommandStatus::VerificationFailed
    })
}
