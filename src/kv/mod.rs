//! KV primitive - the capability every store in this crate is layered on.
//!
//! The backend is injected, never global. A backend offers:
//!
//! - `get` / `list` returning values with their last-modified [`Version`]
//! - conditional writes and deletes keyed on that version (`cas`, `delete_cas`)
//! - atomic multi-key transactions through [`Txner`], bounded to
//!   [`MAX_TXN_OPS`] staged operations
//!
//! [`InMemoryKv`] implements the whole contract for tests and development.
//!
//! ## Required backend property
//!
//! A transaction that is never committed must leave no trace. [`Transaction`]
//! only ships its staged operations inside [`Transaction::commit`], so dropping
//! it (or calling [`Transaction::abort`]) before that point applies nothing.

mod error;
mod in_memory;
mod txn;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use error::KvError;
pub use in_memory::InMemoryKv;
pub use txn::{Transaction, TxnOp, MAX_TXN_OPS};

/// Last-modified counter the backend assigns to a key on every successful write.
///
/// Comparable for equality only; callers never do arithmetic on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version(u64);

impl Version {
    pub fn new(index: u64) -> Self {
        Version(index)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored value together with the version it was last written at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvPair {
    pub key: String,
    pub value: Vec<u8>,
    pub version: Version,
}

/// Single-key operations of the replicated KV store.
pub trait KvBackend: Send + Sync {
    /// Read the value stored at exactly `key`.
    ///
    /// A healthy backend answers with zero or one pair. More than one pair is a
    /// corruption signal that callers must surface rather than pick from.
    fn get(&self, key: &str) -> Result<Vec<KvPair>, KvError>;

    /// All pairs whose key starts with `prefix`, in key order.
    fn list(&self, prefix: &str) -> Result<Vec<KvPair>, KvError>;

    /// Unconditional write. Returns the version assigned to the write.
    fn put(&self, key: &str, value: Vec<u8>) -> Result<Version, KvError>;

    /// Conditional write.
    ///
    /// `expected = None` succeeds only if the key does not exist;
    /// `expected = Some(v)` succeeds only if the key's current version is `v`.
    /// Returns `Ok(false)` when the precondition does not hold.
    fn cas(&self, key: &str, value: Vec<u8>, expected: Option<Version>) -> Result<bool, KvError>;

    /// Unconditional delete. Returns whether the key existed.
    fn delete(&self, key: &str) -> Result<bool, KvError>;

    /// Conditional delete, applied only if the key's current version is `expected`.
    fn delete_cas(&self, key: &str, expected: Version) -> Result<bool, KvError>;
}

/// Commits a batch of operations atomically: all apply or none do.
pub trait Txner: Send + Sync {
    fn commit_ops(&self, ops: &[TxnOp]) -> Result<(), KvError>;
}

impl<K: KvBackend + ?Sized> KvBackend for Arc<K> {
    fn get(&self, key: &str) -> Result<Vec<KvPair>, KvError> {
        (**self).get(key)
    }

    fn list(&self, prefix: &str) -> Result<Vec<KvPair>, KvError> {
        (**self).list(prefix)
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<Version, KvError> {
        (**self).put(key, value)
    }

    fn cas(&self, key: &str, value: Vec<u8>, expected: Option<Version>) -> Result<bool, KvError> {
        (**self).cas(key, value, expected)
    }

    fn delete(&self, key: &str) -> Result<bool, KvError> {
        (**self).delete(key)
    }

    fn delete_cas(&self, key: &str, expected: Version) -> Result<bool, KvError> {
        (**self).delete_cas(key, expected)
    }
}

impl<T: Txner + ?Sized> Txner for Arc<T> {
    fn commit_ops(&self, ops: &[TxnOp]) -> Result<(), KvError> {
        (**self).commit_ops(ops)
    }
}
