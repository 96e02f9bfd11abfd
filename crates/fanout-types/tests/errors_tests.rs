use fanout_types::*;

fn failure(launch: u64, ctx: usize, start: usize, end: usize) -> LaunchFailure {
    LaunchFailure {
        launch: LaunchId(launch),
        context: ContextId::new(ctx),
        device: DeviceId::sub_device(0, ctx),
        partition: Partition::new(ctx, start, end),
        kernel: "vector_add".to_string(),
        message: "injected".to_string(),
    }
}

#[test]
fn error_constructors_and_classes() {
    let e = FanoutError::no_device("nothing");
    assert!(e.is_fatal());
    assert!(!e.is_recoverable());

    let e = FanoutError::partition_unsupported(DeviceId::root(1), "no affinity domain");
    assert!(e.is_recoverable());
    assert!(!e.is_fatal());
    assert!(e.to_string().contains("dev1"));

    let e = FanoutError::allocation(DeviceId::sub_device(0, 1), 4096, "exhausted");
    assert!(e.is_fatal());
    assert!(e.to_string().contains("4096"));
}

#[test]
fn partial_execution_lists_every_failure() {
    let e = FanoutError::partial_execution(vec![failure(2, 2, 8, 12), failure(3, 3, 12, 17)], 4);
    assert_eq!(e.launch_failures().len(), 2);
    let text = e.to_string();
    assert!(text.starts_with("2 of 4 launches failed"));
    assert!(text.contains("ctx2"));
    assert!(text.contains("[8, 12)"));
    assert!(!e.is_fatal());
}

#[test]
fn insufficient_devices_message() {
    let e = FanoutError::insufficient_devices(4, 2);
    assert_eq!(e.to_string(), "Insufficient devices: 4 required, 2 found");
}

#[test]
fn error_conversions() {
    let io_err: FanoutError = std::io::Error::new(std::io::ErrorKind::Other, "io").into();
    match io_err {
        FanoutError::IO { .. } => {}
        _ => panic!("wrong kind"),
    }

    let ser_err: FanoutError = serde_json::from_str::<serde_json::Value>("{")
        .unwrap_err()
        .into();
    match ser_err {
        FanoutError::Serialization { .. } => {}
        _ => panic!("wrong kind"),
    }
}
