//! VersionedRecordStore - CAS protocol for config records.
//!
//! Stored value layout: a JSON envelope `{"config": "<yaml text>"}`. The
//! envelope stays fixed while the inner document format can evolve.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Config, ConfigId, ConfigRecord, Fetched};
use crate::error::StoreError;
use crate::kv::{KvBackend, KvError, Version};

pub const DEFAULT_CONFIG_PREFIX: &str = "config";

#[derive(Serialize, Deserialize)]
struct Envelope {
    #[serde(default)]
    config: String,
}

/// Stateless CAS wrapper over a KV backend. The backend is the system of
/// record; no lock is held between a fetch and the write that follows it.
pub struct VersionedRecordStore<K> {
    kv: K,
    prefix: String,
}

impl<K: KvBackend> VersionedRecordStore<K> {
    pub fn new(kv: K) -> Self {
        Self::with_prefix(kv, DEFAULT_CONFIG_PREFIX)
    }

    pub fn with_prefix(kv: K, prefix: impl Into<String>) -> Self {
        Self {
            kv,
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, id: &ConfigId) -> String {
        format!("{}/{}", self.prefix, id)
    }

    pub fn fetch(&self, id: &ConfigId) -> Result<Fetched, StoreError> {
        let key = self.key(id);
        let pairs = self
            .kv
            .get(&key)
            .map_err(|e| StoreError::backend("fetch", &key, e))?;

        let pair = match pairs.as_slice() {
            [] => return Ok(Fetched::NotFound),
            [pair] => pair,
            _ => {
                return Err(StoreError::NotFoundOrAmbiguous {
                    key,
                    count: pairs.len(),
                })
            }
        };

        let envelope: Envelope = match serde_json::from_slice(&pair.value) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(%id, error = %err, "config envelope unreadable");
                return Ok(Fetched::Malformed {
                    raw: pair.value.clone(),
                });
            }
        };

        let config = decode_document(&envelope.config).map_err(|reason| {
            StoreError::MalformedPayload {
                key: key.clone(),
                reason,
            }
        })?;

        debug!(%id, version = %pair.version, "fetched config");
        Ok(Fetched::Found {
            record: ConfigRecord {
                id: id.clone(),
                config,
            },
            version: pair.version,
        })
    }

    pub fn put(&self, record: &ConfigRecord, expected: Option<Version>) -> Result<(), StoreError> {
        check_id(&record.id)?;
        let key = self.key(&record.id);
        let bytes = encode(&record.config).map_err(|reason| encode_failed(&key, reason))?;

        let applied = self
            .kv
            .cas(&key, bytes, expected)
            .map_err(|e| StoreError::backend("put", &key, e))?;
        if !applied {
            warn!(id = %record.id, ?expected, "config put lost CAS race");
            return Err(StoreError::Conflict {
                op: "put",
                key,
                expected,
            });
        }

        debug!(id = %record.id, ?expected, "put config");
        Ok(())
    }

    pub fn delete(&self, id: &ConfigId, expected: Version) -> Result<(), StoreError> {
        check_id(id)?;
        let key = self.key(id);
        let applied = self
            .kv
            .delete_cas(&key, expected)
            .map_err(|e| StoreError::backend("delete", &key, e))?;
        if !applied {
            warn!(%id, %expected, "config delete lost CAS race");
            return Err(StoreError::Conflict {
                op: "delete",
                key,
                expected: Some(expected),
            });
        }

        debug!(%id, %expected, "deleted config");
        Ok(())
    }
}

pub(super) fn check_id(id: &ConfigId) -> Result<(), StoreError> {
    if id.as_str().is_empty() {
        return Err(StoreError::InvalidArgument("config id must not be empty".into()));
    }
    Ok(())
}

fn encode_failed(key: &str, reason: String) -> StoreError {
    StoreError::backend(
        "put",
        key,
        KvError::Encoding {
            key: key.to_string(),
            reason,
        },
    )
}

fn encode(config: &Config) -> Result<Vec<u8>, String> {
    let document = serde_yaml::to_string(config).map_err(|e| e.to_string())?;
    serde_json::to_vec(&Envelope { config: document }).map_err(|e| e.to_string())
}

fn decode_document(document: &str) -> Result<Config, String> {
    if document.trim().is_empty() {
        return Ok(Config::new());
    }
    serde_yaml::from_str(document).map_err(|e| format!("config did not parse as YAML: {}", e))
}
