//! Shared fixtures: seeding, fault injection.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use configkv::kv::{KvPair, TxnOp};
use configkv::{
    AuditBatchService, AuditLog, AuditLogId, AuditLogStore, EventType, InMemoryKv,
    KvAuditLogStore, KvBackend, KvError, SchemaVersion, StoreError, Transaction, Txner, Version,
};
use serde_json::value::RawValue;

/// InMemoryKv with switchable commit failures.
#[derive(Clone, Default)]
pub struct FaultyKv {
    pub inner: InMemoryKv,
    fail_commits: Arc<AtomicBool>,
}

impl FaultyKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }
}

impl KvBackend for FaultyKv {
    fn get(&self, key: &str) -> Result<Vec<KvPair>, KvError> {
        self.inner.get(key)
    }

    fn list(&self, prefix: &str) -> Result<Vec<KvPair>, KvError> {
        self.inner.list(prefix)
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<Version, KvError> {
        self.inner.put(key, value)
    }

    fn cas(&self, key: &str, value: Vec<u8>, expected: Option<Version>) -> Result<bool, KvError> {
        self.inner.cas(key, value, expected)
    }

    fn delete(&self, key: &str) -> Result<bool, KvError> {
        self.inner.delete(key)
    }

    fn delete_cas(&self, key: &str, expected: Version) -> Result<bool, KvError> {
        self.inner.delete_cas(key, expected)
    }
}

impl Txner for FaultyKv {
    fn commit_ops(&self, ops: &[TxnOp]) -> Result<(), KvError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(KvError::Unavailable {
                op: "transaction",
                key: ops.first().map(|op| op.key().to_string()).unwrap_or_default(),
                message: "connection reset".into(),
            });
        }
        self.inner.commit_ops(ops)
    }
}

/// Audit store that refuses to stage deletes for chosen IDs.
pub struct PoisonedStore<S> {
    pub inner: S,
    poisoned: Mutex<HashSet<String>>,
}

impl<S> PoisonedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            poisoned: Mutex::new(HashSet::new()),
        }
    }

    pub fn poison(&self, id: &str) {
        self.poisoned.lock().unwrap().insert(id.to_string());
    }
}

impl<S: AuditLogStore> AuditLogStore for PoisonedStore<S> {
    fn list(&self) -> Result<BTreeMap<AuditLogId, AuditLog>, StoreError> {
        self.inner.list()
    }

    fn stage_delete(&self, txn: &mut Transaction, id: &AuditLogId) -> Result<(), StoreError> {
        if self.poisoned.lock().unwrap().contains(id.as_str()) {
            return Err(StoreError::Backend {
                op: "stage audit log delete",
                key: id.to_string(),
                source: KvError::Unavailable {
                    op: "stage",
                    key: id.to_string(),
                    message: "session expired".into(),
                },
            });
        }
        self.inner.stage_delete(txn, id)
    }

    fn stage_create(
        &self,
        txn: &mut Transaction,
        record: &AuditLog,
    ) -> Result<AuditLogId, StoreError> {
        self.inner.stage_create(txn, record)
    }
}

pub fn audit_log(n: usize) -> AuditLog {
    AuditLog::new(
        EventType::new("CONFIG_CHANGED"),
        RawValue::from_string(format!(r#"{{"config_id":"cfg-{}"}}"#, n)).unwrap(),
        SchemaVersion::new(1),
    )
}

/// Write `n` audit logs through the store, committing in full transactions.
pub fn seed<K, T>(store: &KvAuditLogStore<K>, txner: &T, n: usize) -> Vec<String>
where
    K: KvBackend,
    T: Txner,
{
    let mut ids = Vec::with_capacity(n);
    let mut txn = Transaction::new();
    for i in 0..n {
        if txn.len() == txn.limit() {
            std::mem::take(&mut txn).commit(txner).unwrap();
        }
        ids.push(store.stage_create(&mut txn, &audit_log(i)).unwrap().to_string());
    }
    txn.commit(txner).unwrap();
    ids.sort();
    ids
}

pub type Service = AuditBatchService<KvAuditLogStore<FaultyKv>, FaultyKv>;

/// Service over a fresh backend seeded with `n` records.
pub fn seeded_service(n: usize) -> (FaultyKv, Service, Vec<String>) {
    let kv = FaultyKv::new();
    let store = KvAuditLogStore::new(kv.clone());
    let ids = seed(&store, &kv, n);
    (kv.clone(), AuditBatchService::new(store, kv), ids)
}

pub fn stored_count(kv: &FaultyKv) -> usize {
    kv.list("audit_logs/").unwrap().len()
}

