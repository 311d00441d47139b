//! Labels - secondary index from label selectors to record IDs.
//!
//! A label set is attached to an ID within a label type (a namespace such as
//! [`CONFIG_LABEL_TYPE`]). [`LabelIndex::set_labels`] replaces the whole set;
//! callers that want a partial update read, modify, and write it back.
//!
//! The index is eventually consistent with concurrent `set_labels` calls.
//! Consumers treat matches as hints and re-validate through the primary store.
//!
//! ## Example
//!
//! ```ignore
//! let index = InMemoryLabelIndex::new();
//! index.set_labels(CONFIG_LABEL_TYPE, "cfg-1", labels! { "env" => "prod" })?;
//!
//! let selector: Selector = "env=prod,tier!=batch".parse()?;
//! let matches = index.get_matches(&selector, CONFIG_LABEL_TYPE)?;
//! ```

mod in_memory;
mod kv_index;
mod selector;

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::kv::KvError;

pub use in_memory::InMemoryLabelIndex;
pub use kv_index::KvLabelIndex;
pub use selector::{Operator, Requirement, Selector};

/// Label type under which configuration records are labeled.
pub const CONFIG_LABEL_TYPE: &str = "config";

/// A full label set: label key to label value.
pub type Labels = BTreeMap<String, String>;

/// One index entry returned by a selector query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labeled {
    pub id: String,
    pub labels: Labels,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("invalid label {0}")]
    InvalidLabel(String),
    #[error("stored labels for {id} are malformed: {reason}")]
    Malformed { id: String, reason: String },
    #[error("label storage error: {0}")]
    Backend(#[from] KvError),
    #[error("label index lock poisoned during {0}")]
    LockPoisoned(&'static str),
}

/// Label storage and selector queries.
pub trait LabelIndex: Send + Sync {
    /// Replace the label set of `id`. An empty set removes `id` from the index.
    fn set_labels(&self, label_type: &str, id: &str, labels: Labels) -> Result<(), LabelError>;

    /// Current label set of `id`; empty when unlabeled.
    fn get_labels(&self, label_type: &str, id: &str) -> Result<Labels, LabelError>;

    /// Every labeled ID whose set satisfies `selector`, ordered by ID.
    fn get_matches(
        &self,
        selector: &Selector,
        label_type: &str,
    ) -> Result<Vec<Labeled>, LabelError>;
}

impl<L: LabelIndex + ?Sized> LabelIndex for Arc<L> {
    fn set_labels(&self, label_type: &str, id: &str, labels: Labels) -> Result<(), LabelError> {
        (**self).set_labels(label_type, id, labels)
    }

    fn get_labels(&self, label_type: &str, id: &str) -> Result<Labels, LabelError> {
        (**self).get_labels(label_type, id)
    }

    fn get_matches(
        &self,
        selector: &Selector,
        label_type: &str,
    ) -> Result<Vec<Labeled>, LabelError> {
        (**self).get_matches(selector, label_type)
    }
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/')
}

pub(crate) fn validate_key(key: &str) -> Result<(), LabelError> {
    if key.is_empty() || !key.chars().all(is_label_char) {
        return Err(LabelError::InvalidLabel(format!("key {:?}", key)));
    }
    Ok(())
}

pub(crate) fn validate_value(value: &str) -> Result<(), LabelError> {
    if !value.chars().all(is_label_char) {
        return Err(LabelError::InvalidLabel(format!("value {:?}", value)));
    }
    Ok(())
}

/// Label types name a keyspace segment, so they may not contain `/`.
/// IDs are opaque and may.
pub(crate) fn validate_label_type(label_type: &str) -> Result<(), LabelError> {
    if label_type.is_empty() || label_type.contains('/') {
        return Err(LabelError::InvalidLabel(format!("label type {:?}", label_type)));
    }
    Ok(())
}

pub(crate) fn validate_labels(labels: &Labels) -> Result<(), LabelError> {
    for (key, value) in labels {
        validate_key(key)?;
        validate_value(value)?;
    }
    Ok(())
}

/// Build a [`Labels`] set from `key => value` pairs.
#[macro_export]
macro_rules! labels {
    () => {
        $crate::labels::Labels::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut labels = $crate::labels::Labels::new();
        $(
            labels.insert(::std::string::String::from($key), ::std::string::String::from($value));
        )+
        labels
    }};
}
