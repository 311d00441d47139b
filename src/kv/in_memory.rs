//! InMemoryKv - BTreeMap-backed KV backend for testing and development.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use super::{KvBackend, KvError, KvPair, TxnOp, Txner, Version, MAX_TXN_OPS};

#[derive(Clone)]
struct StoredValue {
    value: Vec<u8>,
    version: Version,
}

#[derive(Default, Clone)]
struct State {
    entries: BTreeMap<String, StoredValue>,
    /// Last version handed out per key. Survives deletes so a recreated key
    /// never repeats a version an old reader may still hold.
    last_versions: HashMap<String, u64>,
}

impl State {
    fn next_version(&mut self, key: &str) -> Version {
        let last = self.last_versions.entry(key.to_string()).or_insert(0);
        *last += 1;
        Version::new(*last)
    }

    fn current(&self, key: &str) -> Option<Version> {
        self.entries.get(key).map(|stored| stored.version)
    }

    fn write(&mut self, key: &str, value: Vec<u8>) -> Version {
        let version = self.next_version(key);
        self.entries
            .insert(key.to_string(), StoredValue { value, version });
        version
    }

    /// Apply one transaction op, or explain why it cannot be applied.
    fn apply(&mut self, op: &TxnOp) -> Result<(), String> {
        match op {
            TxnOp::Set { key, value } => {
                self.write(key, value.clone());
                Ok(())
            }
            TxnOp::Cas {
                key,
                value,
                expected,
            } => {
                let actual = self.current(key);
                if actual != *expected {
                    return Err(format!(
                        "cas on {} expected version {:?}, found {:?}",
                        key, expected, actual
                    ));
                }
                self.write(key, value.clone());
                Ok(())
            }
            TxnOp::Delete { key } => {
                self.entries.remove(key);
                Ok(())
            }
            TxnOp::DeleteCas { key, expected } => match self.current(key) {
                Some(actual) if actual == *expected => {
                    self.entries.remove(key);
                    Ok(())
                }
                actual => Err(format!(
                    "delete-cas on {} expected version {}, found {:?}",
                    key, expected, actual
                )),
            },
        }
    }
}

/// In-memory KV backend with per-key versions and atomic transactions.
///
/// Clone-friendly (cloning shares the same underlying storage).
#[derive(Clone, Default)]
pub struct InMemoryKv {
    state: Arc<RwLock<State>>,
}

impl InMemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub fn len(&self) -> Result<usize, KvError> {
        let state = self
            .state
            .read()
            .map_err(|_| KvError::LockPoisoned("len"))?;
        Ok(state.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, KvError> {
        Ok(self.len()? == 0)
    }
}

fn check_key(key: &str) -> Result<(), KvError> {
    if key.is_empty() {
        return Err(KvError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn pair(key: &str, stored: &StoredValue) -> KvPair {
    KvPair {
        key: key.to_string(),
        value: stored.value.clone(),
        version: stored.version,
    }
}

impl KvBackend for InMemoryKv {
    fn get(&self, key: &str) -> Result<Vec<KvPair>, KvError> {
        let state = self
            .state
            .read()
            .map_err(|_| KvError::LockPoisoned("get"))?;
        Ok(state
            .entries
            .get(key)
            .map(|stored| pair(key, stored))
            .into_iter()
            .collect())
    }

    fn list(&self, prefix: &str) -> Result<Vec<KvPair>, KvError> {
        let state = self
            .state
            .read()
            .map_err(|_| KvError::LockPoisoned("list"))?;
        Ok(state
            .entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, stored)| pair(key, stored))
            .collect())
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<Version, KvError> {
        check_key(key)?;
        let mut state = self
            .state
            .write()
            .map_err(|_| KvError::LockPoisoned("put"))?;
        Ok(state.write(key, value))
    }

    fn cas(&self, key: &str, value: Vec<u8>, expected: Option<Version>) -> Result<bool, KvError> {
        check_key(key)?;
        let mut state = self
            .state
            .write()
            .map_err(|_| KvError::LockPoisoned("cas"))?;
        if state.current(key) != expected {
            return Ok(false);
        }
        state.write(key, value);
        Ok(true)
    }

    fn delete(&self, key: &str) -> Result<bool, KvError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| KvError::LockPoisoned("delete"))?;
        Ok(state.entries.remove(key).is_some())
    }

    fn delete_cas(&self, key: &str, expected: Version) -> Result<bool, KvError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| KvError::LockPoisoned("delete-cas"))?;
        if state.current(key) != Some(expected) {
            return Ok(false);
        }
        state.entries.remove(key);
        Ok(true)
    }
}

impl Txner for InMemoryKv {
    /// Two-phase commit against a scratch copy: every op is validated and
    /// applied to the copy first, and the copy replaces the live state only
    /// if all of them succeeded.
    fn commit_ops(&self, ops: &[TxnOp]) -> Result<(), KvError> {
        if ops.len() > MAX_TXN_OPS {
            return Err(KvError::TooManyOperations { limit: MAX_TXN_OPS });
        }
        for op in ops {
            check_key(op.key())?;
        }

        let mut state = self
            .state
            .write()
            .map_err(|_| KvError::LockPoisoned("transaction"))?;

        let mut scratch = state.clone();
        let reasons: Vec<String> = ops
            .iter()
            .filter_map(|op| scratch.apply(op).err())
            .collect();
        if !reasons.is_empty() {
            return Err(KvError::RolledBack { reasons });
        }

        *state = scratch;
        Ok(())
    }
}
