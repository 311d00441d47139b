use thiserror::Error;

use crate::kv::{KvError, Version};
use crate::labels::LabelError;

/// Errors from the config record store and its label queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Zero or several values where exactly one was required.
    #[error("unexpected number of records stored at {key}: got {count}")]
    NotFoundOrAmbiguous { key: String, count: usize },
    /// The stored document failed to parse.
    #[error("malformed payload at {key}: {reason}")]
    MalformedPayload { key: String, reason: String },
    /// The CAS precondition did not hold. Re-fetch and retry.
    #[error("CAS {op} failed for {key} at expected version {}; consider retry", display_version(.expected))]
    Conflict {
        op: &'static str,
        key: String,
        expected: Option<Version>,
    },
    /// Transport or serialization failure. Retry after backoff, not immediately.
    #[error("{op} failed for {key}: {source}")]
    Backend {
        op: &'static str,
        key: String,
        #[source]
        source: KvError,
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The label index failed; `context` names the query or update.
    #[error("label {context} failed: {source}")]
    Label {
        context: String,
        #[source]
        source: LabelError,
    },
}

impl StoreError {
    /// Whether the caller may retry: immediately after re-fetching on
    /// `Conflict`, after a backoff on `Backend`.
    pub fn is_retriable(&self) -> bool {
        matches!(self, StoreError::Conflict { .. } | StoreError::Backend { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    pub(crate) fn backend(op: &'static str, key: &str, source: KvError) -> Self {
        StoreError::Backend {
            op,
            key: key.to_string(),
            source,
        }
    }
}

fn display_version(version: &Option<Version>) -> String {
    match version {
        Some(v) => v.to_string(),
        None => "none (create)".to_string(),
    }
}
