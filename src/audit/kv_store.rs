//! KvAuditLogStore - audit records as JSON documents under one KV prefix.

use std::collections::BTreeMap;

use super::{AuditLog, AuditLogId, AuditLogStore};
use crate::error::StoreError;
use crate::kv::{KvBackend, Transaction, TxnOp};

pub const DEFAULT_AUDIT_LOG_PREFIX: &str = "audit_logs";

pub struct KvAuditLogStore<K> {
    kv: K,
    prefix: String,
}

impl<K: KvBackend> KvAuditLogStore<K> {
    pub fn new(kv: K) -> Self {
        Self::with_prefix(kv, DEFAULT_AUDIT_LOG_PREFIX)
    }

    pub fn with_prefix(kv: K, prefix: impl Into<String>) -> Self {
        Self {
            kv,
            prefix: prefix.into(),
        }
    }

    fn list_prefix(&self) -> String {
        format!("{}/", self.prefix)
    }

    pub fn key(&self, id: &AuditLogId) -> String {
        format!("{}/{}", self.prefix, id)
    }
}

fn check_id(id: &AuditLogId) -> Result<(), StoreError> {
    let raw = id.as_str();
    if raw.is_empty() || raw.contains('/') {
        return Err(StoreError::InvalidArgument(format!(
            "invalid audit log id {:?}",
            raw
        )));
    }
    Ok(())
}

impl<K: KvBackend> AuditLogStore for KvAuditLogStore<K> {
    fn list(&self) -> Result<BTreeMap<AuditLogId, AuditLog>, StoreError> {
        let prefix = self.list_prefix();
        let pairs = self
            .kv
            .list(&prefix)
            .map_err(|e| StoreError::backend("list audit logs", &prefix, e))?;

        let mut records = BTreeMap::new();
        for pair in pairs {
            let record: AuditLog = serde_json::from_slice(&pair.value).map_err(|e| {
                StoreError::MalformedPayload {
                    key: pair.key.clone(),
                    reason: e.to_string(),
                }
            })?;
            let id = AuditLogId::new(&pair.key[prefix.len()..]);
            records.insert(id, record);
        }
        Ok(records)
    }

    fn stage_delete(&self, txn: &mut Transaction, id: &AuditLogId) -> Result<(), StoreError> {
        check_id(id)?;
        let key = self.key(id);
        txn.stage(TxnOp::delete(key.clone()))
            .map_err(|e| StoreError::backend("stage audit log delete", &key, e))
    }

    fn stage_create(
        &self,
        txn: &mut Transaction,
        record: &AuditLog,
    ) -> Result<AuditLogId, StoreError> {
        let id = AuditLogId::generate();
        let key = self.key(&id);
        let bytes = serde_json::to_vec(record).map_err(|e| StoreError::MalformedPayload {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        txn.stage(TxnOp::set(key.clone(), bytes))
            .map_err(|e| StoreError::backend("stage audit log create", &key, e))?;
        Ok(id)
    }
}
