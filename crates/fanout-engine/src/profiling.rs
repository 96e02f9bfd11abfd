//! Launch timing analysis
//!
//! Works on the device timestamps recorded by profiling-enabled contexts:
//! per-kernel duration statistics and pairwise detection of launches whose
//! execution windows intersect.

use crate::dispatcher::DispatchedLaunch;
use fanout_types::{ContextId, KernelStats, LaunchId, LaunchOutcome, LaunchOverlap};
use std::collections::HashMap;

/// Execution window of one profiled launch
#[derive(Debug, Clone, PartialEq)]
pub struct KernelExecution {
    pub launch: LaunchId,
    pub kernel: String,
    pub context: ContextId,
    pub iteration: usize,
    pub start_ns: u64,
    pub end_ns: u64,
}

impl KernelExecution {
    /// `None` when the launch carries no timing
    pub fn from_outcome(
        dispatched: &DispatchedLaunch,
        outcome: &LaunchOutcome,
        iteration: usize,
    ) -> Option<Self> {
        let timing = outcome.timing?;
        Some(Self {
            launch: outcome.launch,
            kernel: outcome.kernel.clone(),
            context: dispatched.context,
            iteration,
            start_ns: timing.started_ns,
            end_ns: timing.ended_ns,
        })
    }

    pub fn duration_ns(&self) -> u64 {
        self.end_ns.saturating_sub(self.start_ns)
    }

    pub fn duration_us(&self) -> f64 {
        self.duration_ns() as f64 / 1e3
    }
}

/// Executions gathered over the rounds of a run
#[derive(Debug, Clone, Default)]
pub struct Profile {
    executions: Vec<KernelExecution>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the timed launches of one round
    pub fn record(
        &mut self,
        iteration: usize,
        batch: &[DispatchedLaunch],
        outcomes: &[LaunchOutcome],
    ) {
        self.executions.extend(
            batch
                .iter()
                .zip(outcomes)
                .filter_map(|(d, o)| KernelExecution::from_outcome(d, o, iteration)),
        );
    }

    pub fn executions(&self) -> &[KernelExecution] {
        &self.executions
    }

    pub fn is_empty(&self) -> bool {
        self.executions.is_empty()
    }

    pub fn kernel_stats(&self) -> Vec<KernelStats> {
        kernel_stats(&self.executions)
    }

    pub fn overlaps(&self) -> Vec<LaunchOverlap> {
        find_overlaps(&self.executions)
    }
}

/// Count, average, min and max duration per kernel name, in order of
/// first appearance
pub fn kernel_stats(executions: &[KernelExecution]) -> Vec<KernelStats> {
    let mut order: Vec<&str> = Vec::new();
    let mut acc: HashMap<&str, (usize, f64, f64, f64)> = HashMap::new();

    for exec in executions {
        let d = exec.duration_us();
        let entry = acc.entry(exec.kernel.as_str()).or_insert_with(|| {
            order.push(exec.kernel.as_str());
            (0, 0.0, f64::INFINITY, 0.0)
        });
        entry.0 += 1;
        entry.1 += d;
        entry.2 = entry.2.min(d);
        entry.3 = entry.3.max(d);
    }

    order
        .into_iter()
        .filter_map(|kernel| {
            let (count, total, min, max) = *acc.get(kernel)?;
            Some(KernelStats {
                kernel: kernel.to_string(),
                count,
                avg_us: total / count as f64,
                min_us: min,
                max_us: max,
            })
        })
        .collect()
}

/// Every pair of executions whose windows intersect for a non-zero time.
///
/// Pairs are reported once, first element earlier in `executions`.
pub fn find_overlaps(executions: &[KernelExecution]) -> Vec<LaunchOverlap> {
    let mut overlaps = Vec::new();
    for (i, a) in executions.iter().enumerate() {
        for b in &executions[i + 1..] {
            let start = a.start_ns.max(b.start_ns);
            let end = a.end_ns.min(b.end_ns);
            if end <= start {
                continue;
            }
            let overlap_ns = (end - start) as f64;
            overlaps.push(LaunchOverlap {
                first: a.launch,
                first_kernel: a.kernel.clone(),
                first_context: a.context,
                second: b.launch,
                second_kernel: b.kernel.clone(),
                second_context: b.context,
                overlap_us: overlap_ns / 1e3,
                first_percent: overlap_ns / a.duration_ns() as f64 * 100.0,
                second_percent: overlap_ns / b.duration_ns() as f64 * 100.0,
            });
        }
    }
    overlaps
}
