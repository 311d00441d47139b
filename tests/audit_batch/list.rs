use crate::support::{seeded_service, stored_count};

#[test]
fn list_caps_a_large_backlog_at_one_past_the_consumer_batch() {
    let (kv, service, ids) = seeded_service(200);

    let listed = service.list().unwrap();
    assert_eq!(listed.len(), 65);
    assert_eq!(stored_count(&kv), 200, "listing must not remove anything");

    let listed_ids: Vec<String> = listed.keys().map(|id| id.to_string()).collect();
    assert_eq!(listed_ids, ids[..65].to_vec());
}

#[test]
fn list_is_stable_between_calls() {
    let (_, service, _) = seeded_service(100);
    let first: Vec<_> = service.list().unwrap().into_keys().collect();
    let second: Vec<_> = service.list().unwrap().into_keys().collect();
    assert_eq!(first, second);
}

#[test]
fn list_of_empty_store_is_empty() {
    let (_, service, _) = seeded_service(0);
    assert!(service.list().unwrap().is_empty());
}

#[test]
fn consumer_drains_backlog_in_bounded_rounds() {
    let (kv, service, _) = seeded_service(150);

    let mut rounds = 0;
    loop {
        let listed = service.list().unwrap();
        if listed.is_empty() {
            break;
        }
        let batch: Vec<String> = listed.into_keys().take(64).map(|id| id.to_string()).collect();
        service.delete(&batch).unwrap();
        rounds += 1;
    }

    assert_eq!(rounds, 3);
    assert_eq!(stored_count(&kv), 0);
}
