//! End-to-end execution of a workload over a run context

use crate::collector::{gather, LogicalArray};
use crate::dispatcher::Dispatcher;
use crate::profiling::Profile;
use crate::run_context::RunContext;
use crate::synchronizer;
use crate::verifier::Verifier;
use crate::workloads::{PartitionWork, Workload};
use chrono::Utc;
use fanout_types::{
    PartitionAssignment, Result, RunId, RunReport, VerificationResult, VerificationSummary,
};
use std::time::Instant;
use tracing::{debug, info};

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct RunOutput<T> {
    pub report: RunReport,
    pub output: LogicalArray<T>,
    pub verification: VerificationResult<T>,
}

/// Drives prepare, dispatch, synchronize, gather and verify
pub struct Runner<'a> {
    context: &'a RunContext,
    dispatcher: Dispatcher,
    verifier: Verifier,
}

impl<'a> Runner<'a> {
    pub fn new(context: &'a RunContext) -> Self {
        let config = context.config();
        Self {
            context,
            dispatcher: Dispatcher::new(config.submission),
            verifier: Verifier::from_config(&config.verification),
        }
    }

    pub fn with_verifier(mut self, verifier: Verifier) -> Self {
        self.verifier = verifier;
        self
    }

    /// Execute `workload` for the configured number of rounds.
    ///
    /// Any allocation, dispatch or launch failure aborts the run; buffers
    /// already allocated are released before the error is returned.
    pub fn run<W: Workload>(&self, workload: &W) -> Result<RunOutput<W::Element>> {
        workload.validate()?;
        let config = self.context.config();
        let pool = self.context.pool();
        let run_id = RunId::new();
        let started_at = Utc::now();

        let table = self.context.partition_table(workload.domain_size())?;
        info!(
            run = %run_id,
            workload = workload.name(),
            size = table.total(),
            contexts = pool.len(),
            imbalance = table.imbalance(),
            "starting run"
        );

        let work = table
            .iter()
            .zip(pool.iter())
            .map(|(partition, ctx)| workload.prepare(ctx, partition))
            .collect::<Result<Vec<PartitionWork<W::Element>>>>()?;
        debug!(
            bytes = work.iter().map(PartitionWork::size_bytes).sum::<usize>(),
            "buffers prepared"
        );

        let mut profile = Profile::new();
        let compute_start = Instant::now();
        for iteration in 0..config.iterations {
            let launches = self.dispatcher.dispatch_round(workload, &work, pool)?;
            let outcomes = synchronizer::await_all(&launches)?;
            if config.profiling {
                profile.record(iteration, &launches, &outcomes);
            }
            pool.synchronize();
            debug!(iteration, launches = launches.len(), "round complete");
        }
        let compute_ms = compute_start.elapsed().as_secs_f64() * 1e3;

        let output = gather(&work, &table, workload.output_stride())?;
        drop(work);

        let verify_start = Instant::now();
        let verification = self.verifier.verify(output.as_slice(), |index| {
            workload.expected(index, config.iterations, &table)
        });
        let verification_ms = verify_start.elapsed().as_secs_f64() * 1e3;

        let assignments = table
            .iter()
            .zip(pool.iter())
            .map(|(partition, ctx)| PartitionAssignment {
                context: ctx.id(),
                device: ctx.device_id(),
                device_name: ctx.device().name.clone(),
                partition: *partition,
            })
            .collect();

        let report = RunReport {
            run_id,
            workload: workload.name().to_string(),
            started_at,
            problem_size: table.total(),
            iterations: config.iterations,
            devices: self.context.devices(),
            assignments,
            partition_imbalance: table.imbalance(),
            compute_ms,
            verification_ms,
            verification: VerificationSummary::from(&verification),
            kernel_stats: profile.kernel_stats(),
            overlaps: profile.overlaps(),
            memory: self.context.backend().memory_stats(),
        };

        info!(
            run = %report.run_id,
            passed = report.passed(),
            compute_ms,
            "run complete"
        );
        Ok(RunOutput {
            report,
            output,
            verification,
        })
    }
}
