//! Transaction - explicit builder for atomic multi-key commits.
//!
//! ## Example
//!
//! ```ignore
//! let mut txn = Transaction::new();
//! txn.stage(TxnOp::delete("audit_logs/a"))?;
//! txn.stage(TxnOp::delete("audit_logs/b"))?;
//! txn.commit(&kv)?; // both keys removed, or neither
//! ```

use tracing::debug;

use super::{KvError, Txner, Version};

/// Operation cap of the backend's atomic multi-key transaction primitive.
pub const MAX_TXN_OPS: usize = 64;

/// One staged operation inside a [`Transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxnOp {
    Set {
        key: String,
        value: Vec<u8>,
    },
    Cas {
        key: String,
        value: Vec<u8>,
        expected: Option<Version>,
    },
    Delete {
        key: String,
    },
    DeleteCas {
        key: String,
        expected: Version,
    },
}

impl TxnOp {
    pub fn set(key: impl Into<String>, value: Vec<u8>) -> Self {
        TxnOp::Set {
            key: key.into(),
            value,
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        TxnOp::Delete { key: key.into() }
    }

    pub fn key(&self) -> &str {
        match self {
            TxnOp::Set { key, .. }
            | TxnOp::Cas { key, .. }
            | TxnOp::Delete { key }
            | TxnOp::DeleteCas { key, .. } => key,
        }
    }
}

/// Staged operations waiting for an all-or-nothing commit.
///
/// Nothing reaches the backend until [`commit`](Self::commit). Dropping an
/// uncommitted transaction is an abort.
#[must_use = "a transaction does nothing unless committed"]
#[derive(Debug)]
pub struct Transaction {
    ops: Vec<TxnOp>,
    limit: usize,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction {
    /// Create an empty transaction bounded by [`MAX_TXN_OPS`].
    pub fn new() -> Self {
        Self::with_limit(MAX_TXN_OPS)
    }

    /// Create an empty transaction with a tighter operation cap.
    ///
    /// The cap never exceeds [`MAX_TXN_OPS`].
    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.min(MAX_TXN_OPS);
        Self {
            ops: Vec::with_capacity(limit),
            limit,
        }
    }

    /// Stage one operation. Fails once the cap is reached; the transaction
    /// keeps whatever was staged before.
    pub fn stage(&mut self, op: TxnOp) -> Result<(), KvError> {
        if self.ops.len() >= self.limit {
            return Err(KvError::TooManyOperations { limit: self.limit });
        }
        self.ops.push(op);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn ops(&self) -> &[TxnOp] {
        &self.ops
    }

    /// Ship every staged operation to the backend in one atomic commit.
    pub fn commit<T: Txner + ?Sized>(self, txner: &T) -> Result<(), KvError> {
        if self.ops.is_empty() {
            return Ok(());
        }
        debug!(ops = self.ops.len(), "committing transaction");
        txner.commit_ops(&self.ops)
    }

    /// Discard the staged operations without touching the backend.
    /// Returns how many were discarded.
    pub fn abort(self) -> usize {
        debug!(ops = self.ops.len(), "aborting transaction");
        self.ops.len()
    }
}
