use fanout_engine::*;
use fanout_interfaces::{BufferBinding, KernelJob};
use fanout_runtime::{
    ComputeBackend, DeviceSpec, FaultPlan, HostBackend, HostTopology, PlatformSpec,
};
use fanout_types::{
    AsyncErrorPolicy, BackendKind, ContextId, DeviceKind, Partition, PartitionStrategy,
    SamplingPolicy, SubmissionMode, VerificationPolicy,
};
use std::sync::Arc;

fn dual() -> Arc<HostBackend> {
    Arc::new(HostBackend::new(HostTopology::dual_max_1550()))
}

/// One undivided device with 4 KiB of memory
fn tiny() -> Arc<HostBackend> {
    let topology = HostTopology {
        platforms: vec![PlatformSpec {
            name: "tiny".to_string(),
            kind: BackendKind::LevelZero,
            submittable: true,
            devices: vec![DeviceSpec {
                name: "tiny gpu".to_string(),
                vendor: "test".to_string(),
                kind: DeviceKind::Gpu,
                compute_units: 8,
                max_work_group_size: 256,
                memory_bytes: 4096,
                tiles: 0,
            }],
        }],
    };
    Arc::new(HostBackend::new(topology))
}

/// Vector add whose reference value is off by one at every tenth index
struct SkewedVectorAdd(VectorAdd);

impl Workload for SkewedVectorAdd {
    type Element = i32;

    fn name(&self) -> &str {
        "skewed_vector_add"
    }

    fn domain_size(&self) -> usize {
        self.0.domain_size()
    }

    fn prepare(
        &self,
        context: &ExecutionContext,
        partition: &Partition,
    ) -> Result<PartitionWork<i32>> {
        self.0.prepare(context, partition)
    }

    fn kernel(
        &self,
        partition: &Partition,
        context: ContextId,
        inputs: Vec<BufferBinding<i32>>,
        output: BufferBinding<i32>,
    ) -> Result<KernelJob> {
        self.0.kernel(partition, context, inputs, output)
    }

    fn expected(&self, index: usize, rounds: usize, table: &PartitionTable) -> i32 {
        let value = self.0.expected(index, rounds, table);
        if index % 10 == 0 {
            value + 1
        } else {
            value
        }
    }
}

fn full_verification(mut config: RunConfig) -> RunConfig {
    config.verification.policy = VerificationPolicy::Full;
    config
}

#[test]
fn vector_add_million_elements_on_four_tiles() {
    let ctx = RunContext::new(dual(), full_verification(RunConfig::default())).unwrap();
    assert_eq!(ctx.pool().len(), 4);

    let out = Runner::new(&ctx).run(&VectorAdd::new(1_000_000)).unwrap();

    assert_eq!(out.verification.policy, SamplingPolicy::Full);
    assert_eq!(out.verification.checked, 1_000_000);
    assert_eq!(out.verification.mismatch_count, 0);
    assert!(out.report.passed());
    assert_eq!(out.output.get(999_999), Some(1_999_998));
    assert_eq!(out.report.assignments.len(), 4);
    assert_eq!(out.report.partition_imbalance, 0);
}

#[test]
fn fill_partitions_do_not_write_across_boundaries() {
    let ctx = RunContext::new(dual(), full_verification(RunConfig::default())).unwrap();
    let out = Runner::new(&ctx).run(&Fill::new(17)).unwrap();

    // 17 over 4 contexts: [0,4) [4,8) [8,12) [12,17)
    let expected: Vec<i32> = vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 3];
    assert_eq!(out.output.as_slice(), expected.as_slice());
    assert_eq!(out.report.partition_imbalance, 1);

    let last = out.output.slice(3).unwrap();
    assert_eq!(last.partition.start, 12);
    assert_eq!(last.data.len(), 5);
    assert_eq!(out.output.owner_of(16), Some(3));
}

#[test]
fn more_contexts_than_elements_skips_empty_partitions() {
    let config = RunConfig {
        profiling: true,
        ..full_verification(RunConfig::default())
    };
    let ctx = RunContext::new(dual(), config).unwrap();
    let out = Runner::new(&ctx).run(&VectorAdd::new(2)).unwrap();

    assert_eq!(out.output.as_slice(), &[0, 2]);
    assert!(out.report.passed());
    // only the two non-empty partitions launched
    assert_eq!(out.report.kernel_stats[0].count, 2);
}

#[test]
fn failing_launch_reports_partial_execution() {
    let faults = FaultPlan {
        failing_launches: vec![2],
        ..Default::default()
    };
    let backend = Arc::new(HostBackend::with_faults(
        HostTopology::dual_max_1550(),
        faults,
    ));
    let config = RunConfig {
        async_errors: AsyncErrorPolicy::LogAndContinue,
        ..Default::default()
    };
    let ctx = RunContext::new(backend.clone(), config).unwrap();

    let err = Runner::new(&ctx).run(&VectorAdd::new(1024)).unwrap_err();
    match &err {
        FanoutError::PartialExecution { failures, total } => {
            assert_eq!(*total, 4);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].partition.index, 2);
            assert_eq!(failures[0].partition.start, 512);
        }
        other => panic!("unexpected error: {other}"),
    }

    // every buffer of the failed run is released
    assert!(backend.memory_stats().iter().all(|m| m.used_bytes == 0));
}

#[test]
fn allocation_failure_releases_earlier_buffers() {
    let backend = tiny();
    let ctx = RunContext::new(backend.clone(), RunConfig::default()).unwrap();

    // three 4 KiB buffers on a 4 KiB device
    let err = Runner::new(&ctx).run(&VectorAdd::new(1024)).unwrap_err();
    assert!(matches!(err, FanoutError::Allocation { .. }));

    let stats = backend.memory_stats();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].used_bytes, 0);
    assert_eq!(stats[0].failed_allocations, 1);
    assert_eq!(stats[0].peak_bytes, 4096);
}

#[test]
fn oversized_request_fails_before_touching_host_memory() {
    let backend = tiny();
    let ctx = RunContext::new(backend.clone(), RunConfig::default()).unwrap();

    // 4 TiB of output on a 4 KiB device
    let err = Runner::new(&ctx).run(&Fill::new(1 << 40)).unwrap_err();
    match &err {
        FanoutError::Allocation {
            requested_bytes, ..
        } => assert_eq!(*requested_bytes, 4 << 40),
        other => panic!("unexpected error: {other}"),
    }

    let stats = backend.memory_stats();
    assert_eq!(stats[0].used_bytes, 0);
    assert_eq!(stats[0].failed_allocations, 1);
    assert_eq!(stats[0].total_allocations, 0);
}

#[test]
fn wrong_results_are_reported_not_raised() {
    let backend = dual();
    let ctx = RunContext::new(backend.clone(), full_verification(RunConfig::default())).unwrap();
    let out = Runner::new(&ctx)
        .run(&SkewedVectorAdd(VectorAdd::new(1000)))
        .unwrap();

    assert!(!out.report.passed());
    assert_eq!(out.verification.checked, 1000);
    assert_eq!(out.verification.mismatch_count, 100);
    assert!((out.verification.mismatch_rate() - 10.0).abs() < 1e-9);

    let reported = &out.report.verification.first_mismatches;
    assert_eq!(reported.len(), 5);
    let indices: Vec<_> = reported.iter().map(|m| m.index).collect();
    assert_eq!(indices, vec![0, 10, 20, 30, 40]);
    assert_eq!(reported[1].expected, "21");
    assert_eq!(reported[1].actual, "20");

    // the output itself is intact and every buffer is released
    assert_eq!(out.output.get(10), Some(20));
    assert!(backend.memory_stats().iter().all(|m| m.used_bytes == 0));
}

#[test]
fn hierarchical_split_follows_root_devices() {
    let config = RunConfig {
        partition_strategy: PartitionStrategy::Hierarchical,
        ..full_verification(RunConfig::default())
    };
    let ctx = RunContext::new(dual(), config).unwrap();
    let out = Runner::new(&ctx).run(&Fill::new(10)).unwrap();

    let ranges: Vec<_> = out
        .report
        .assignments
        .iter()
        .map(|a| (a.partition.start, a.partition.end))
        .collect();
    assert_eq!(ranges, vec![(0, 2), (2, 5), (5, 7), (7, 10)]);
    assert!(out.report.passed());
}

#[test]
fn thread_per_context_submission_matches_single_thread() {
    let config = RunConfig {
        submission: SubmissionMode::ThreadPerContext,
        ..full_verification(RunConfig::default())
    };
    let ctx = RunContext::new(dual(), config).unwrap();
    let out = Runner::new(&ctx).run(&VectorAdd::new(4099)).unwrap();

    assert!(out.report.passed());
    assert_eq!(out.output.len(), 4099);
}

#[test]
fn matmul_rows_are_split_across_contexts() {
    let ctx = RunContext::new(dual(), full_verification(RunConfig::default())).unwrap();
    let workload = MatMul::from_size(64);
    assert_eq!(workload.dims(), (8, 16, 32));

    let out = Runner::new(&ctx).run(&workload).unwrap();
    assert_eq!(out.output.len(), 8 * 32);
    assert_eq!(out.output.stride(), 32);
    assert!(out.output.as_slice().iter().all(|&v| v == 136.0));
    assert_eq!(out.output.owner_of(8 * 32 - 1), Some(3));
    assert!(out.report.passed());
}

#[test]
fn accumulate_carries_over_rounds_and_profiles() {
    let config = RunConfig {
        iterations: 3,
        profiling: true,
        submission: SubmissionMode::ThreadPerContext,
        ..full_verification(RunConfig::default())
    };
    let ctx = RunContext::new(dual(), config).unwrap();
    let out = Runner::new(&ctx).run(&Accumulate::new(4096, 2)).unwrap();

    assert_eq!(out.output.get(100), Some(3 * 2 * 100));
    assert!(out.report.passed());

    let stats = &out.report.kernel_stats;
    assert_eq!(stats.len(), 4);
    assert_eq!(stats[0].kernel, "accumulate1");
    assert!(stats.iter().all(|s| s.count == 3));
    assert!(stats.iter().all(|s| s.min_us <= s.max_us));
}

#[test]
fn memory_is_released_after_a_run() {
    let backend = dual();
    let ctx = RunContext::new(backend.clone(), RunConfig::default()).unwrap();
    let out = Runner::new(&ctx).run(&VectorAdd::new(4096)).unwrap();

    assert_eq!(out.report.memory.len(), 4);
    for stats in &out.report.memory {
        assert_eq!(stats.used_bytes, 0);
        assert_eq!(stats.peak_bytes, 3 * 1024 * 4);
        assert_eq!(stats.total_allocations, 3);
    }
}

#[test]
fn invalid_workload_is_rejected_before_allocation() {
    let backend = dual();
    let ctx = RunContext::new(backend.clone(), RunConfig::default()).unwrap();
    let err = Runner::new(&ctx).run(&MatMul::new(0, 4, 4)).unwrap_err();
    assert!(matches!(err, FanoutError::InvalidParameter { .. }));
    assert!(backend
        .memory_stats()
        .iter()
        .all(|m| m.total_allocations == 0));
}
