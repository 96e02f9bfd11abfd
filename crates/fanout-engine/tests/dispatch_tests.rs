use fanout_engine::*;
use fanout_interfaces::KernelJob;
use fanout_runtime::{FaultPlan, HostBackend, HostTopology};
use fanout_types::{AccessMode, ContextFailurePolicy, Partition, SubmissionMode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn dual() -> Arc<HostBackend> {
    Arc::new(HostBackend::new(HostTopology::dual_max_1550()))
}

fn pool_with(backend: &Arc<HostBackend>, handler: AsyncErrorHandler) -> ContextPool {
    let devices = DeviceEnumerator::new(backend.clone(), EnumeratorOptions::default())
        .enumerate()
        .unwrap();
    let options = ContextOptions {
        profiling: false,
        failure_policy: ContextFailurePolicy::Abort,
        async_errors: handler,
    };
    ContextPool::create(backend.as_ref(), &devices, &options).unwrap()
}

fn counting_handler() -> (AsyncErrorHandler, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = count.clone();
    let handler: AsyncErrorHandler = Arc::new(move |_err: &FanoutError| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    (handler, count)
}

fn prepare_all<W: Workload>(workload: &W, pool: &ContextPool) -> Vec<PartitionWork<W::Element>> {
    let table = PartitionTable::flat(workload.domain_size(), pool.len()).unwrap();
    table
        .iter()
        .zip(pool.iter())
        .map(|(p, ctx)| workload.prepare(ctx, p).unwrap())
        .collect()
}

#[test]
fn batch_with_one_failure_reports_every_outcome() {
    let faults = FaultPlan {
        failing_launches: vec![2],
        ..Default::default()
    };
    let backend = Arc::new(HostBackend::with_faults(
        HostTopology::dual_max_1550(),
        faults,
    ));
    let (handler, reported) = counting_handler();
    let pool = pool_with(&backend, handler);

    let workload = VectorAdd::new(400);
    let work = prepare_all(&workload, &pool);
    let launches = Dispatcher::default()
        .dispatch_round(&workload, &work, &pool)
        .unwrap();
    assert_eq!(launches.len(), 4);

    let batch = collect(&launches);
    assert_eq!(batch.len(), 4);
    assert!(!batch.is_success());
    assert_eq!(batch.failures().len(), 1);
    assert_eq!(batch.failures()[0].partition, Partition::new(2, 200, 300));
    assert!(batch.outcomes[0].is_success());
    assert!(batch.outcomes[3].is_success());

    let err = batch.into_result().unwrap_err();
    assert_eq!(err.launch_failures().len(), 1);
    assert!(err.to_string().starts_with("1 of 4 launches failed"));

    // the failure was observed through the batch, not the async channel
    assert_eq!(pool.synchronize(), 0);
    assert_eq!(reported.load(Ordering::SeqCst), 0);
}

#[test]
fn unobserved_failure_goes_to_async_handler() {
    let backend = dual();
    let (handler, reported) = counting_handler();
    let pool = pool_with(&backend, handler);
    let ctx = pool.get(0).unwrap();

    ctx.submit(KernelJob::new("boom", 1, || Err("bad access".to_string())))
        .unwrap();
    assert_eq!(ctx.in_flight(), 1);
    assert_eq!(ctx.wait_and_throw(), 1);
    assert_eq!(reported.load(Ordering::SeqCst), 1);
    assert_eq!(ctx.in_flight(), 0);

    let launch = ctx
        .submit(KernelJob::new("boom", 1, || Err("bad access".to_string())))
        .unwrap();
    assert!(launch.wait().error_message().is_some());
    assert_eq!(ctx.wait_and_throw(), 0);
    assert_eq!(reported.load(Ordering::SeqCst), 1);
}

#[test]
fn dropping_the_pool_reports_pending_failures() {
    let backend = dual();
    let (handler, reported) = counting_handler();
    let pool = pool_with(&backend, handler);

    pool.get(3)
        .unwrap()
        .submit(KernelJob::new("late", 1, || Err("late failure".to_string())))
        .unwrap();
    drop(pool);
    assert_eq!(reported.load(Ordering::SeqCst), 1);
}

#[test]
fn read_only_output_is_rejected() {
    let backend = dual();
    let (handler, _) = counting_handler();
    let pool = pool_with(&backend, handler);
    let ctx = pool.get(0).unwrap();

    let partition = Partition::new(0, 0, 8);
    let work = PartitionWork {
        partition,
        context: ctx.id(),
        inputs: Vec::new(),
        output: ctx.upload(vec![0i32; 8], AccessMode::ReadOnly).unwrap(),
    };
    let err = Dispatcher::default()
        .dispatch(&Fill::new(8), &work, ctx)
        .unwrap_err();
    assert!(matches!(err, FanoutError::InvalidParameter { .. }));
    assert_eq!(ctx.in_flight(), 0);
}

#[test]
fn buffer_from_another_device_is_rejected() {
    let backend = dual();
    let (handler, _) = counting_handler();
    let pool = pool_with(&backend, handler);
    let (ctx0, ctx1) = (pool.get(0).unwrap(), pool.get(1).unwrap());

    let work = PartitionWork {
        partition: Partition::new(0, 0, 8),
        context: ctx0.id(),
        inputs: Vec::new(),
        output: ctx1.allocate::<i32>(8, AccessMode::WriteOnly).unwrap(),
    };
    let err = Dispatcher::default()
        .dispatch(&Fill::new(8), &work, ctx0)
        .unwrap_err();
    assert!(err.to_string().contains("dev0.1"));
}

#[test]
fn wrongly_sized_output_is_rejected() {
    let backend = dual();
    let (handler, _) = counting_handler();
    let pool = pool_with(&backend, handler);
    let ctx = pool.get(0).unwrap();

    let work = PartitionWork {
        partition: Partition::new(0, 0, 8),
        context: ctx.id(),
        inputs: Vec::new(),
        output: ctx.allocate::<i32>(4, AccessMode::WriteOnly).unwrap(),
    };
    assert!(Dispatcher::default()
        .dispatch(&Fill::new(8), &work, ctx)
        .is_err());
}

#[test]
fn thread_per_context_round_keeps_partition_order() {
    let backend = dual();
    let (handler, _) = counting_handler();
    let pool = pool_with(&backend, handler);

    let workload = Fill::new(1000);
    let work = prepare_all(&workload, &pool);
    let launches = Dispatcher::new(SubmissionMode::ThreadPerContext)
        .dispatch_round(&workload, &work, &pool)
        .unwrap();

    let indices: Vec<_> = launches.iter().map(|l| l.partition.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
    await_all(&launches).unwrap();

    let table = PartitionTable::flat(1000, 4).unwrap();
    let output = gather(&work, &table, 1).unwrap();
    assert_eq!(output.get(999), Some(3));
    assert_eq!(output.get(250), Some(1));
}

#[test]
fn gather_rejects_mismatched_table() {
    let backend = dual();
    let (handler, _) = counting_handler();
    let pool = pool_with(&backend, handler);

    let work = prepare_all(&Fill::new(100), &pool);
    let other = PartitionTable::flat(100, 3).unwrap();
    assert!(gather(&work, &other, 1).is_err());
}
