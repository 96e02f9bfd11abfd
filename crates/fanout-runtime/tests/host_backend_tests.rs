use fanout_interfaces::*;
use fanout_runtime::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn level_zero_devices(backend: &HostBackend) -> Vec<DeviceInfo> {
    let platform = backend.platforms().into_iter().next().unwrap();
    backend.devices(&platform).unwrap()
}

#[test]
fn dual_preset_enumerates_and_partitions() {
    let backend = HostBackend::default();
    let platforms = backend.platforms();
    assert_eq!(platforms.len(), 2);
    assert!(!platforms[1].submittable);

    let roots = level_zero_devices(&backend);
    assert_eq!(roots.len(), 2);
    assert_eq!(roots[1].id, DeviceId::root(1));

    let tiles = backend.partition_device(&roots[1]).unwrap();
    assert_eq!(tiles.len(), 2);
    assert_eq!(tiles[0].id, DeviceId::sub_device(1, 0));
    assert_eq!(tiles[0].compute_units, roots[1].compute_units / 2);

    let err = backend.partition_device(&tiles[0]).unwrap_err();
    assert!(err.is_recoverable());
}

#[test]
fn partition_fault_is_reported_as_unsupported() {
    let faults = FaultPlan {
        unpartitionable: vec![0],
        ..Default::default()
    };
    let backend = HostBackend::with_faults(HostTopology::dual_max_1550(), faults);
    let roots = level_zero_devices(&backend);
    assert!(matches!(
        backend.partition_device(&roots[0]),
        Err(FanoutError::PartitionUnsupported { .. })
    ));
    assert!(backend.partition_device(&roots[1]).is_ok());
}

#[test]
fn non_submittable_platform_refuses_queues() {
    let backend = HostBackend::default();
    let mirror = backend.platforms().into_iter().nth(1).unwrap();
    let device = backend.devices(&mirror).unwrap().remove(0);
    let err = backend
        .create_queue(&device, QueueProperties::default())
        .err()
        .unwrap();
    assert!(matches!(err, FanoutError::ContextCreation { .. }));
}

#[test]
fn launches_on_one_queue_run_in_submission_order() {
    let backend = HostBackend::new(HostTopology::single_gpu());
    let device = level_zero_devices(&backend).remove(0);
    let queue = backend
        .create_queue(&device, QueueProperties::default())
        .unwrap();

    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let launches: Vec<Launch> = (0..16)
        .map(|i| {
            let order = order.clone();
            queue
                .submit(KernelJob::new("record", 1, move || {
                    if i == 0 {
                        std::thread::sleep(Duration::from_millis(5));
                    }
                    order.lock().push(i);
                    Ok(())
                }))
                .unwrap()
        })
        .collect();

    for launch in &launches {
        assert!(launch.wait().is_success());
    }
    assert_eq!(*order.lock(), (0..16).collect::<Vec<_>>());
}

#[test]
fn profiling_queues_record_timing() {
    let backend = HostBackend::new(HostTopology::single_gpu());
    let device = level_zero_devices(&backend).remove(0);
    let profiled = backend
        .create_queue(&device, QueueProperties { enable_profiling: true })
        .unwrap();
    let plain = backend
        .create_queue(&device, QueueProperties::default())
        .unwrap();

    let body = || -> std::result::Result<(), String> {
        std::thread::sleep(Duration::from_millis(2));
        Ok(())
    };
    let a = profiled.submit(KernelJob::new("sleep", 1, body)).unwrap().wait();
    let b = plain.submit(KernelJob::new("sleep", 1, body)).unwrap().wait();

    let timing = a.timing.unwrap();
    assert!(timing.started_ns >= timing.queued_ns);
    assert!(timing.duration_ns() >= 2_000_000);
    assert!(b.timing.is_none());
}

#[test]
fn failing_kernels_become_failed_launches() {
    let faults = FaultPlan {
        failing_launches: vec![1],
        ..Default::default()
    };
    let backend = HostBackend::with_faults(HostTopology::single_gpu(), faults);
    let device = level_zero_devices(&backend).remove(0);
    let queue = backend
        .create_queue(&device, QueueProperties::default())
        .unwrap();

    let ok = queue.submit(KernelJob::new("ok", 1, || Ok(()))).unwrap();
    let injected = queue.submit(KernelJob::new("ok", 1, || Ok(()))).unwrap();
    let returned = queue
        .submit(KernelJob::new("bad", 1, || Err("out of range".to_string())))
        .unwrap();
    let panicked = queue
        .submit(KernelJob::new("panics", 1, || panic!("boom")))
        .unwrap();

    assert!(ok.wait().is_success());
    assert!(injected.wait().error_message().unwrap().contains("injected"));
    assert_eq!(returned.wait().error_message(), Some("out of range"));
    assert!(panicked.wait().error_message().unwrap().contains("boom"));
}

#[test]
fn skipped_kernels_complete_without_running() {
    let faults = FaultPlan {
        skipped_launches: vec![0],
        ..Default::default()
    };
    let backend = HostBackend::with_faults(HostTopology::single_gpu(), faults);
    let device = level_zero_devices(&backend).remove(0);
    let queue = backend
        .create_queue(&device, QueueProperties::default())
        .unwrap();

    let ran = Arc::new(AtomicUsize::new(0));
    let launches: Vec<_> = (0..2)
        .map(|_| {
            let ran = ran.clone();
            queue
                .submit(KernelJob::new("count", 1, move || {
                    ran.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }))
                .unwrap()
        })
        .collect();

    assert!(launches.iter().all(|l| l.wait().is_success()));
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}

#[test]
fn pending_launches_finish_when_queue_is_dropped() {
    let backend = HostBackend::new(HostTopology::single_gpu());
    let device = level_zero_devices(&backend).remove(0);
    let queue = backend
        .create_queue(&device, QueueProperties::default())
        .unwrap();
    let launch = queue
        .submit(KernelJob::new("slow", 1, || {
            std::thread::sleep(Duration::from_millis(10));
            Ok(())
        }))
        .unwrap();
    drop(queue);
    assert!(launch.is_terminal());
    assert!(launch.wait().is_success());
}

#[test]
fn queues_on_one_device_share_memory() {
    let backend = HostBackend::new(HostTopology::single_gpu());
    let device = level_zero_devices(&backend).remove(0);
    let q1 = backend.create_queue(&device, QueueProperties::default()).unwrap();
    let q2 = backend.create_queue(&device, QueueProperties::default()).unwrap();

    let a = Buffer::<f32>::allocate(&*q1, 1024, AccessMode::ReadOnly).unwrap();
    let b = Buffer::<f32>::allocate(&*q2, 1024, AccessMode::WriteOnly).unwrap();
    let stats = backend.memory_stats();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].used_bytes, 8192);

    drop(a);
    drop(b);
    let stats = backend.memory_stats();
    assert_eq!(stats[0].used_bytes, 0);
    assert_eq!(stats[0].peak_bytes, 8192);
}

#[test]
fn topology_parses_from_toml() {
    let text = r#"
        [[platforms]]
        name = "Level-Zero"
        kind = "level-zero"

        [[platforms.devices]]
        name = "small"
        compute_units = 8
        memory_bytes = 65536
        tiles = 2
    "#;
    let topology: HostTopology = toml::from_str(text).unwrap();
    assert!(topology.platforms[0].submittable);
    assert_eq!(topology.platforms[0].devices[0].tiles, 2);
    assert_eq!(topology.platforms[0].devices[0].max_work_group_size, 1024);
}
