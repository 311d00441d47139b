//! AuditBatchService - bounded List and all-or-nothing Delete over audit logs.
//!
//! Transport independent; the `grpc` module exposes it over tonic.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::{AuditLog, AuditLogId, AuditLogStore};
use crate::error::StoreError;
use crate::kv::{Transaction, Txner};
use crate::settings::{Limits, SettingsError};

/// Errors surfaced to RPC callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The request broke a documented precondition. Do not retry.
    #[error("{0}")]
    InvalidArgument(String),
    /// The backend failed. Retry with backoff.
    #[error("{0}")]
    Unavailable(String),
}

impl ServiceError {
    pub fn is_retriable(&self) -> bool {
        matches!(self, ServiceError::Unavailable(_))
    }
}

pub struct AuditBatchService<S, T> {
    store: S,
    txner: T,
    limits: Limits,
}

impl<S: AuditLogStore, T: Txner> AuditBatchService<S, T> {
    pub fn new(store: S, txner: T) -> Self {
        Self {
            store,
            txner,
            limits: Limits::default(),
        }
    }

    pub fn with_limits(store: S, txner: T, limits: Limits) -> Result<Self, SettingsError> {
        limits.validate()?;
        Ok(Self {
            store,
            txner,
            limits,
        })
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Up to `list_limit` records, lowest IDs first.
    pub fn list(&self) -> Result<BTreeMap<AuditLogId, AuditLog>, ServiceError> {
        let records = self.store.list().map_err(|e| {
            ServiceError::Unavailable(format!("error listing audit log records: {}", e))
        })?;

        let total = records.len();
        if total > self.limits.list_limit {
            warn!(
                total,
                limit = self.limits.list_limit,
                "audit log backlog exceeds list limit"
            );
        }

        let listed: BTreeMap<_, _> = records.into_iter().take(self.limits.list_limit).collect();
        debug!(count = listed.len(), total, "listed audit logs");
        Ok(listed)
    }

    /// Remove every listed ID in one transaction, or none of them.
    ///
    /// Batch size is checked before the backend is touched.
    pub fn delete(&self, ids: &[String]) -> Result<(), ServiceError> {
        if ids.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "no audit log IDs were specified for deletion".into(),
            ));
        }
        if ids.len() > self.limits.delete_batch_limit {
            return Err(ServiceError::InvalidArgument(format!(
                "no more than {} audit log records may be deleted at a time, but request was made for {}",
                self.limits.delete_batch_limit,
                ids.len()
            )));
        }

        let mut txn = Transaction::with_limit(self.limits.delete_batch_limit);
        for id in ids {
            if let Err(err) = self.store.stage_delete(&mut txn, &AuditLogId::new(id.as_str())) {
                txn.abort();
                return Err(staging_error(id, err));
            }
        }

        txn.commit(&self.txner).map_err(|e| {
            ServiceError::Unavailable(format!(
                "error committing audit log deletion transaction: {}",
                e
            ))
        })?;

        info!(count = ids.len(), "deleted audit log batch");
        Ok(())
    }
}

fn staging_error(id: &str, err: StoreError) -> ServiceError {
    match err {
        StoreError::InvalidArgument(reason) => ServiceError::InvalidArgument(reason),
        other => ServiceError::Unavailable(format!(
            "error queueing up deletion of audit log {} in a transaction: {}",
            id, other
        )),
    }
}
