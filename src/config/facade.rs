use tracing::{debug, warn};

use super::store::check_id;
use super::{ConfigId, ConfigRecord, Fetched, Storer, VersionedRecordStore};
use crate::error::StoreError;
use crate::kv::{KvBackend, Version};
use crate::labels::{LabelIndex, Labels, Selector, CONFIG_LABEL_TYPE};

/// Config records plus their labels, behind the [`Storer`] contract.
pub struct ConfigFacade<K, L> {
    records: VersionedRecordStore<K>,
    labels: L,
}

impl<K: KvBackend, L: LabelIndex> ConfigFacade<K, L> {
    pub fn new(kv: K, labels: L) -> Self {
        Self::from_parts(VersionedRecordStore::new(kv), labels)
    }

    pub fn from_parts(records: VersionedRecordStore<K>, labels: L) -> Self {
        Self { records, labels }
    }

    pub fn records(&self) -> &VersionedRecordStore<K> {
        &self.records
    }

    pub fn label_index(&self) -> &L {
        &self.labels
    }
}

impl<K: KvBackend, L: LabelIndex> Storer for ConfigFacade<K, L> {
    fn fetch_config(&self, id: &ConfigId) -> Result<Fetched, StoreError> {
        self.records.fetch(id)
    }

    fn put_config(
        &self,
        record: &ConfigRecord,
        expected: Option<Version>,
    ) -> Result<(), StoreError> {
        self.records.put(record, expected)
    }

    /// CAS delete, then drop the record's labels so label queries stop
    /// returning an ID that no longer exists. A label failure is reported
    /// even though the record itself is already gone.
    fn delete_config(&self, id: &ConfigId, expected: Version) -> Result<(), StoreError> {
        self.records.delete(id, expected)?;
        self.labels
            .set_labels(CONFIG_LABEL_TYPE, id.as_str(), Labels::new())
            .map_err(|source| StoreError::Label {
                context: format!("cleanup for deleted {}", id),
                source,
            })
    }

    fn label_config(&self, id: &ConfigId, labels: Labels) -> Result<(), StoreError> {
        check_id(id)?;
        debug!(%id, count = labels.len(), "labeling config");
        self.labels
            .set_labels(CONFIG_LABEL_TYPE, id.as_str(), labels)
            .map_err(|source| StoreError::Label {
                context: format!("update for {}", id),
                source,
            })
    }

    fn find_where_labeled(&self, selector: &Selector) -> Result<Vec<ConfigRecord>, StoreError> {
        let labeled = self
            .labels
            .get_matches(selector, CONFIG_LABEL_TYPE)
            .map_err(|source| StoreError::Label {
                context: format!("query {:?}", selector.to_string()),
                source,
            })?;

        let mut records = Vec::with_capacity(labeled.len());
        for entry in labeled {
            let id = ConfigId::new(entry.id);
            match self.records.fetch(&id)? {
                Fetched::Found { record, .. } => records.push(record),
                Fetched::Malformed { .. } => {
                    warn!(%id, %selector, "skipping unreadable config in label query");
                }
                Fetched::NotFound => {
                    return Err(StoreError::NotFoundOrAmbiguous {
                        key: self.records.key(&id),
                        count: 0,
                    });
                }
            }
        }

        debug!(%selector, count = records.len(), "label query");
        Ok(records)
    }
}
