use thiserror::Error;

/// Errors raised by a KV backend or by transaction staging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KvError {
    /// Transport or I/O failure talking to the backend.
    #[error("backend unavailable during {op} on {key}: {message}")]
    Unavailable {
        op: &'static str,
        key: String,
        message: String,
    },
    #[error("backend lock poisoned during {0}")]
    LockPoisoned(&'static str),
    /// A transaction was asked to carry more operations than the backend supports.
    #[error("transaction exceeds the limit of {limit} operations")]
    TooManyOperations { limit: usize },
    /// The backend rejected the transaction as a whole; nothing was applied.
    #[error("transaction rolled back: {}", .reasons.join("; "))]
    RolledBack { reasons: Vec<String> },
    #[error("invalid key {0:?}")]
    InvalidKey(String),
    /// The value could not be serialized for the write.
    #[error("value for {key} could not be encoded: {reason}")]
    Encoding { key: String, reason: String },
}
