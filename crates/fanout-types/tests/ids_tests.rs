use fanout_types::*;
use serde_json as json;

#[test]
fn device_ids_display_and_root() {
    let root = DeviceId::root(1);
    let tile = DeviceId::sub_device(1, 0);
    assert_eq!(root.to_string(), "dev1");
    assert_eq!(tile.to_string(), "dev1.0");
    assert!(tile.is_sub_device());
    assert_eq!(tile.root_id(), root);
    assert!(root < tile);
}

#[test]
fn run_ids_are_unique() {
    let a = RunId::new();
    let b = RunId::new();
    assert_ne!(a, b);
    assert!(!a.to_string().is_empty());
}

#[test]
fn ids_serde_roundtrip() {
    let id = DeviceId::sub_device(3, 1);
    let s = json::to_string(&id).unwrap();
    let back: DeviceId = json::from_str(&s).unwrap();
    assert_eq!(id, back);

    assert_eq!(ContextId::new(2).to_string(), "ctx2");
    assert_eq!(LaunchId(7).to_string(), "launch#7");
}
