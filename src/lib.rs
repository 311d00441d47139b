//! configkv - consistency and indexing layer for a config and audit-log store
//! built on a replicated KV backend.
//!
//! - [`config`]: CAS-protected config records and label-based discovery
//! - [`labels`]: label sets, selectors, and the label index
//! - [`audit`]: bounded List and atomic batch Delete over audit records
//! - [`kv`]: the backend capability, transactions, and an in-memory fake
//! - [`grpc`] (feature `grpc`): tonic transport for the audit service

pub mod audit;
pub mod config;
mod error;
pub mod kv;
pub mod labels;
pub mod logging;
pub mod settings;

#[cfg(feature = "grpc")]
pub mod grpc;

pub use audit::{
    AuditBatchService, AuditLog, AuditLogId, AuditLogStore, EventType, KvAuditLogStore,
    SchemaVersion, ServiceError,
};
pub use config::{ConfigFacade, ConfigId, ConfigRecord, Fetched, Storer, VersionedRecordStore};
pub use error::StoreError;
pub use kv::{InMemoryKv, KvBackend, KvError, Transaction, Txner, Version};
pub use labels::{InMemoryLabelIndex, KvLabelIndex, LabelIndex, Labels, Selector};
pub use settings::Limits;
