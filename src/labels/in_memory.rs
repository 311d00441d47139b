//! InMemoryLabelIndex - HashMap-backed label index for testing and development.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use super::{validate_label_type, validate_labels, LabelError, LabelIndex, Labeled, Labels, Selector};

/// In-memory label index keyed by label type, then ID.
///
/// Clone-friendly via Arc.
#[derive(Clone, Default)]
pub struct InMemoryLabelIndex {
    storage: Arc<RwLock<HashMap<String, BTreeMap<String, Labels>>>>,
}

impl InMemoryLabelIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LabelIndex for InMemoryLabelIndex {
    fn set_labels(&self, label_type: &str, id: &str, labels: Labels) -> Result<(), LabelError> {
        validate_label_type(label_type)?;
        validate_labels(&labels)?;
        let mut storage = self
            .storage
            .write()
            .map_err(|_| LabelError::LockPoisoned("set labels"))?;
        let by_id = storage.entry(label_type.to_string()).or_default();
        if labels.is_empty() {
            by_id.remove(id);
        } else {
            by_id.insert(id.to_string(), labels);
        }
        Ok(())
    }

    fn get_labels(&self, label_type: &str, id: &str) -> Result<Labels, LabelError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| LabelError::LockPoisoned("get labels"))?;
        Ok(storage
            .get(label_type)
            .and_then(|by_id| by_id.get(id))
            .cloned()
            .unwrap_or_default())
    }

    fn get_matches(
        &self,
        selector: &Selector,
        label_type: &str,
    ) -> Result<Vec<Labeled>, LabelError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| LabelError::LockPoisoned("get matches"))?;
        let Some(by_id) = storage.get(label_type) else {
            return Ok(Vec::new());
        };
        Ok(by_id
            .iter()
            .filter(|(_, labels)| selector.matches(labels))
            .map(|(id, labels)| Labeled {
                id: id.clone(),
                labels: labels.clone(),
            })
            .collect())
    }
}
