//! KvLabelIndex - label sets stored as JSON documents in the KV backend.
//!
//! Layout: `{prefix}/{label_type}/{id}` holds the JSON-encoded label set.
//! Label types may not contain `/`, so everything under a type's prefix is
//! one ID of that type, whatever the ID contains. Queries scan the prefix and
//! filter client-side.

use super::{validate_label_type, validate_labels, LabelError, LabelIndex, Labeled, Labels, Selector};
use crate::kv::KvBackend;

pub const DEFAULT_LABEL_PREFIX: &str = "labels";

pub struct KvLabelIndex<K> {
    kv: K,
    prefix: String,
}

impl<K: KvBackend> KvLabelIndex<K> {
    pub fn new(kv: K) -> Self {
        Self::with_prefix(kv, DEFAULT_LABEL_PREFIX)
    }

    pub fn with_prefix(kv: K, prefix: impl Into<String>) -> Self {
        Self {
            kv,
            prefix: prefix.into(),
        }
    }

    fn type_prefix(&self, label_type: &str) -> Result<String, LabelError> {
        validate_label_type(label_type)?;
        Ok(format!("{}/{}/", self.prefix, label_type))
    }

    fn key(&self, label_type: &str, id: &str) -> Result<String, LabelError> {
        Ok(format!("{}{}", self.type_prefix(label_type)?, id))
    }
}

fn decode(id: &str, bytes: &[u8]) -> Result<Labels, LabelError> {
    serde_json::from_slice(bytes).map_err(|e| LabelError::Malformed {
        id: id.to_string(),
        reason: e.to_string(),
    })
}

impl<K: KvBackend> LabelIndex for KvLabelIndex<K> {
    fn set_labels(&self, label_type: &str, id: &str, labels: Labels) -> Result<(), LabelError> {
        validate_labels(&labels)?;
        let key = self.key(label_type, id)?;
        if labels.is_empty() {
            self.kv.delete(&key)?;
            return Ok(());
        }
        let bytes = serde_json::to_vec(&labels).map_err(|e| LabelError::Malformed {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
        self.kv.put(&key, bytes)?;
        Ok(())
    }

    fn get_labels(&self, label_type: &str, id: &str) -> Result<Labels, LabelError> {
        match self.kv.get(&self.key(label_type, id)?)?.as_slice() {
            [] => Ok(Labels::new()),
            [pair] => decode(id, &pair.value),
            pairs => Err(LabelError::Malformed {
                id: id.to_string(),
                reason: format!("{} label sets stored", pairs.len()),
            }),
        }
    }

    fn get_matches(
        &self,
        selector: &Selector,
        label_type: &str,
    ) -> Result<Vec<Labeled>, LabelError> {
        let prefix = self.type_prefix(label_type)?;
        let mut matches = Vec::new();
        for pair in self.kv.list(&prefix)? {
            let id = &pair.key[prefix.len()..];
            // A set we cannot read might have matched; fail the query.
            let labels = decode(id, &pair.value)?;
            if selector.matches(&labels) {
                matches.push(Labeled {
                    id: id.to_string(),
                    labels,
                });
            }
        }
        Ok(matches)
    }
}
