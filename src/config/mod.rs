//! Config records - versioned configuration documents guarded by CAS.
//!
//! [`VersionedRecordStore`] speaks the CAS protocol against the KV backend;
//! [`ConfigFacade`] adds label-based discovery and implements [`Storer`].
//!
//! ## Example
//!
//! ```ignore
//! let facade = ConfigFacade::new(InMemoryKv::new(), InMemoryLabelIndex::new());
//!
//! let record = ConfigRecord::new("cfg-1", config);
//! facade.put_config(&record, None)?; // create, must not exist
//!
//! let (mut record, version) = facade.fetch_config(&"cfg-1".into())?.found().unwrap();
//! record.config.insert("replicas".into(), 3.into());
//! facade.put_config(&record, Some(version))?; // conflicts if someone else wrote first
//! ```

mod facade;
mod store;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::kv::Version;
use crate::labels::{Labels, Selector};

pub use facade::ConfigFacade;
pub use store::{VersionedRecordStore, DEFAULT_CONFIG_PREFIX};

/// Opaque identity of a config record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConfigId(String);

impl ConfigId {
    pub fn new(id: impl Into<String>) -> Self {
        ConfigId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConfigId {
    fn from(id: &str) -> Self {
        ConfigId::new(id)
    }
}

impl From<String> for ConfigId {
    fn from(id: String) -> Self {
        ConfigId(id)
    }
}

/// Parsed configuration document.
pub type Config = BTreeMap<String, serde_yaml::Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigRecord {
    pub id: ConfigId,
    pub config: Config,
}

impl ConfigRecord {
    pub fn new(id: impl Into<ConfigId>, config: Config) -> Self {
        Self {
            id: id.into(),
            config,
        }
    }
}

/// Outcome of reading one config record.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    /// Parsed record and the version to pass back on the next write.
    Found { record: ConfigRecord, version: Version },
    /// A value exists but its envelope could not be read. No version is
    /// usable, so the record cannot be updated through CAS until repaired.
    Malformed { raw: Vec<u8> },
    NotFound,
}

impl Fetched {
    pub fn found(self) -> Option<(ConfigRecord, Version)> {
        match self {
            Fetched::Found { record, version } => Some((record, version)),
            _ => None,
        }
    }

    pub fn version(&self) -> Option<Version> {
        match self {
            Fetched::Found { version, .. } => Some(*version),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Fetched::NotFound)
    }
}

/// Storage contract for config records.
pub trait Storer {
    fn fetch_config(&self, id: &ConfigId) -> Result<Fetched, StoreError>;

    /// CAS write. `expected = None` creates and fails if the record exists.
    fn put_config(&self, record: &ConfigRecord, expected: Option<Version>)
        -> Result<(), StoreError>;

    fn delete_config(&self, id: &ConfigId, expected: Version) -> Result<(), StoreError>;

    /// Replace the record's label set.
    fn label_config(&self, id: &ConfigId, labels: Labels) -> Result<(), StoreError>;

    /// Records whose labels satisfy `selector`. Fails as a whole if any
    /// matching record cannot be read.
    fn find_where_labeled(&self, selector: &Selector) -> Result<Vec<ConfigRecord>, StoreError>;
}
