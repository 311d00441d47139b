use configkv::kv::KvBackend;
use configkv::{ConfigId, Fetched, StoreError, Storer, Version};

use crate::support::{kv_facade, mem_facade, record};

#[test]
fn create_only_put_fails_once_record_exists() {
    let (_, store) = mem_facade();
    store.put_config(&record("svc", 1), None).unwrap();

    let err = store.put_config(&record("svc", 2), None).unwrap_err();
    assert!(err.is_conflict());
    assert!(err.is_retriable());

    let (found, _) = store.fetch_config(&"svc".into()).unwrap().found().unwrap();
    assert_eq!(found, record("svc", 1));
}

#[test]
fn put_succeeds_only_at_current_version() {
    let (_, store) = mem_facade();
    store.put_config(&record("svc", 1), None).unwrap();
    let current = store.fetch_config(&"svc".into()).unwrap().version().unwrap();

    for stale in [Version::new(0), Version::new(current.get() + 1), Version::new(99)] {
        let err = store.put_config(&record("svc", 2), Some(stale)).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { op: "put", .. }));
    }

    store.put_config(&record("svc", 2), Some(current)).unwrap();
    let after = store.fetch_config(&"svc".into()).unwrap();
    assert_ne!(after.version().unwrap(), current);

    let err = store.put_config(&record("svc", 3), Some(current)).unwrap_err();
    assert!(err.is_conflict());
}

#[test]
fn conflict_message_names_key_and_expected_version() {
    let (_, store) = mem_facade();
    store.put_config(&record("svc", 1), None).unwrap();
    let err = store.put_config(&record("svc", 2), None).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("config/svc"), "{}", message);
    assert!(message.contains("none (create)"), "{}", message);
}

#[test]
fn fetch_of_missing_record_is_not_found() {
    let (_, store) = mem_facade();
    assert!(store.fetch_config(&"nope".into()).unwrap().is_not_found());
}

#[test]
fn delete_requires_current_version() {
    let (_, store) = mem_facade();
    store.put_config(&record("svc", 1), None).unwrap();
    let v1 = store.fetch_config(&"svc".into()).unwrap().version().unwrap();
    store.put_config(&record("svc", 2), Some(v1)).unwrap();

    assert!(store.delete_config(&"svc".into(), v1).unwrap_err().is_conflict());

    let v2 = store.fetch_config(&"svc".into()).unwrap().version().unwrap();
    store.delete_config(&"svc".into(), v2).unwrap();
    assert!(store.fetch_config(&"svc".into()).unwrap().is_not_found());
}

#[test]
fn recreated_record_never_reuses_an_old_version() {
    let (_, store) = mem_facade();
    let id = ConfigId::from("svc");

    store.put_config(&record("svc", 1), None).unwrap();
    let old = store.fetch_config(&id).unwrap().version().unwrap();
    store.delete_config(&id, old).unwrap();
    store.put_config(&record("svc", 2), None).unwrap();

    let recreated = store.fetch_config(&id).unwrap().version().unwrap();
    assert_ne!(recreated, old);
    assert!(store.put_config(&record("svc", 3), Some(old)).unwrap_err().is_conflict());
}

#[test]
fn unreadable_envelope_is_reported_as_malformed() {
    let (kv, store) = kv_facade();
    kv.put("config/broken", b"not json".to_vec()).unwrap();

    match store.fetch_config(&"broken".into()).unwrap() {
        Fetched::Malformed { raw } => assert_eq!(raw, b"not json"),
        other => panic!("expected malformed, got {:?}", other),
    }
}

#[test]
fn bad_yaml_inside_envelope_is_an_error() {
    let (kv, store) = kv_facade();
    kv.put("config/broken", br#"{"config":"a: [unclosed"}"#.to_vec())
        .unwrap();

    let err = store.fetch_config(&"broken".into()).unwrap_err();
    assert!(matches!(err, StoreError::MalformedPayload { .. }));
}

#[test]
fn empty_id_is_invalid_argument() {
    let (_, store) = mem_facade();
    let err = store.put_config(&record("", 1), None).unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)));
    assert!(!err.is_retriable());
}
