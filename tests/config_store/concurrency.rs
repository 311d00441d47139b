//! Put storms: many writers racing on one record.

use std::sync::{Arc, Barrier};
use std::thread;

use configkv::{ConfigId, StoreError, Storer, Version};

use crate::support::{kv_facade, mem_facade, record};

const WRITERS: usize = 16;

#[test]
fn exactly_one_writer_wins_a_race_on_the_same_version() {
    let (_, store) = mem_facade();
    store.put_config(&record("svc", 0), None).unwrap();
    let seen = store.fetch_config(&"svc".into()).unwrap().version().unwrap();

    let store = Arc::new(store);
    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.put_config(&record("svc", i as i64 + 1), Some(seen))
            })
        })
        .collect();

    let results: Vec<Result<(), StoreError>> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(StoreError::is_conflict));
}

#[test]
fn exactly_one_creator_wins() {
    let (_, store) = kv_facade();
    let store = Arc::new(store);
    let barrier = Arc::new(Barrier::new(WRITERS));

    let wins: usize = (0..WRITERS)
        .map(|i| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.put_config(&record("fresh", i as i64), None).is_ok()
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|h| h.join().unwrap() as usize)
        .sum();
    assert_eq!(wins, 1);
}

#[test]
fn retrying_writers_all_land_exactly_once() {
    let (_, store) = mem_facade();
    store.put_config(&record("svc", 0), None).unwrap();
    let first = store.fetch_config(&"svc".into()).unwrap().version().unwrap();

    let store = Arc::new(store);
    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles: Vec<_> = (0..WRITERS)
        .map(|_| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let id = ConfigId::from("svc");
                barrier.wait();
                loop {
                    let (mut current, version) =
                        store.fetch_config(&id).unwrap().found().unwrap();
                    let replicas = current.config["replicas"].as_i64().unwrap();
                    current
                        .config
                        .insert("replicas".into(), serde_yaml::Value::from(replicas + 1));
                    match store.put_config(&current, Some(version)) {
                        Ok(()) => return,
                        Err(err) if err.is_conflict() => continue,
                        Err(err) => panic!("unexpected error: {}", err),
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let (last, version) = store
        .fetch_config(&"svc".into())
        .unwrap()
        .found()
        .unwrap();
    assert_eq!(last.config["replicas"].as_i64(), Some(WRITERS as i64));
    assert_eq!(version, Version::new(first.get() + WRITERS as u64));
}

#[test]
fn puts_and_deletes_racing_on_one_version_have_one_winner() {
    let (_, store) = kv_facade();
    store.put_config(&record("svc", 0), None).unwrap();
    let seen = store.fetch_config(&"svc".into()).unwrap().version().unwrap();

    let store = Arc::new(store);
    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let id = ConfigId::from("svc");
                barrier.wait();
                let outcome = if i % 2 == 0 {
                    store.put_config(&record("svc", i as i64), Some(seen))
                } else {
                    store.delete_config(&id, seen)
                };
                (i % 2 == 0, outcome)
            })
        })
        .collect();

    let results: Vec<(bool, Result<(), StoreError>)> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners: Vec<bool> = results
        .iter()
        .filter(|(_, r)| r.is_ok())
        .map(|(was_put, _)| *was_put)
        .collect();
    assert_eq!(winners.len(), 1);
    assert!(results
        .iter()
        .filter_map(|(_, r)| r.as_ref().err())
        .all(StoreError::is_conflict));

    let after = store.fetch_config(&"svc".into()).unwrap();
    if winners[0] {
        assert_ne!(after.version(), Some(seen));
        assert!(after.version().is_some());
    } else {
        assert!(after.is_not_found());
    }
}
