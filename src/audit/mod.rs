//! Audit logs - append-only records drained by an external consumer.
//!
//! Records are written by an upstream writer and removed only through
//! [`AuditBatchService::delete`], one bounded transaction per batch.

mod kv_store;
mod service;
mod wire;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::StoreError;
use crate::kv::Transaction;

pub use kv_store::{KvAuditLogStore, DEFAULT_AUDIT_LOG_PREFIX};
pub use service::{AuditBatchService, ServiceError};
pub use wire::{AuditLogProto, WireError};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AuditLogId(String);

impl AuditLogId {
    pub fn new(id: impl Into<String>) -> Self {
        AuditLogId(id.into())
    }

    /// A fresh random ID for a new record.
    pub fn generate() -> Self {
        AuditLogId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuditLogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AuditLogId {
    fn from(id: &str) -> Self {
        AuditLogId::new(id)
    }
}

/// Tag naming what happened. Carried on the wire as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(String);

impl EventType {
    pub fn new(tag: impl Into<String>) -> Self {
        EventType(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shape of `event_details`, bumped whenever the payload changes incompatibly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaVersion(i64);

impl SchemaVersion {
    pub fn new(version: i64) -> Self {
        SchemaVersion(version)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

/// One audit record. `event_details` is passed through without parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub event_type: EventType,
    pub event_details: Box<RawValue>,
    pub timestamp: DateTime<Utc>,
    pub schema_version: SchemaVersion,
}

impl AuditLog {
    /// Record an event happening now.
    pub fn new(
        event_type: EventType,
        event_details: Box<RawValue>,
        schema_version: SchemaVersion,
    ) -> Self {
        Self::at(event_type, event_details, Utc::now(), schema_version)
    }

    /// Record an event at `timestamp`, truncated to whole seconds.
    pub fn at(
        event_type: EventType,
        event_details: Box<RawValue>,
        timestamp: DateTime<Utc>,
        schema_version: SchemaVersion,
    ) -> Self {
        Self {
            event_type,
            event_details,
            timestamp: timestamp.trunc_subsecs(0),
            schema_version,
        }
    }
}

impl PartialEq for AuditLog {
    fn eq(&self, other: &Self) -> bool {
        self.event_type == other.event_type
            && self.event_details.get() == other.event_details.get()
            && self.timestamp == other.timestamp
            && self.schema_version == other.schema_version
    }
}

/// Backing store for audit records.
pub trait AuditLogStore: Send + Sync {
    /// Every stored record, ordered by ID.
    fn list(&self) -> Result<BTreeMap<AuditLogId, AuditLog>, StoreError>;

    /// Queue removal of `id` in `txn`. Nothing is removed until the
    /// transaction commits.
    fn stage_delete(&self, txn: &mut Transaction, id: &AuditLogId) -> Result<(), StoreError>;

    /// Queue a new record in `txn` and return the ID it will be stored under.
    fn stage_create(&self, txn: &mut Transaction, record: &AuditLog)
        -> Result<AuditLogId, StoreError>;
}

impl<S: AuditLogStore + ?Sized> AuditLogStore for std::sync::Arc<S> {
    fn list(&self) -> Result<BTreeMap<AuditLogId, AuditLog>, StoreError> {
        (**self).list()
    }

    fn stage_delete(&self, txn: &mut Transaction, id: &AuditLogId) -> Result<(), StoreError> {
        (**self).stage_delete(txn, id)
    }

    fn stage_create(
        &self,
        txn: &mut Transaction,
        record: &AuditLog,
    ) -> Result<AuditLogId, StoreError> {
        (**self).stage_create(txn, record)
    }
}
