//! Capacity limits shared with the downstream audit-log consumer and the
//! backend's transaction primitive.

use serde::Deserialize;
use thiserror::Error;

use crate::kv::MAX_TXN_OPS;

/// Records the downstream consumer processes per cycle. It warns when handed
/// more than this, so [`LIST_LIMIT`] is one past it.
pub const CONSUMER_BATCH_SIZE: usize = 64;

/// Records returned by one `List`: a full consumer batch plus one record that
/// tells the consumer it is falling behind. Also keeps a response well under
/// the RPC message size ceiling.
pub const LIST_LIMIT: usize = CONSUMER_BATCH_SIZE + 1;

/// IDs accepted by one `Delete`: the backend's transaction operation cap.
pub const DELETE_BATCH_LIMIT: usize = MAX_TXN_OPS;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("invalid limits: {0}")]
    Invalid(String),
    #[error("could not parse limits: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Limits {
    pub list_limit: usize,
    pub delete_batch_limit: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            list_limit: LIST_LIMIT,
            delete_batch_limit: DELETE_BATCH_LIMIT,
        }
    }
}

impl Limits {
    /// Parse and validate limits from YAML. Omitted fields keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SettingsError> {
        let limits: Limits =
            serde_yaml::from_str(yaml).map_err(|e| SettingsError::Parse(e.to_string()))?;
        limits.validate()?;
        Ok(limits)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.list_limit == 0 {
            return Err(SettingsError::Invalid("list_limit must be positive".into()));
        }
        if self.delete_batch_limit == 0 {
            return Err(SettingsError::Invalid(
                "delete_batch_limit must be positive".into(),
            ));
        }
        if self.delete_batch_limit > MAX_TXN_OPS {
            return Err(SettingsError::Invalid(format!(
                "delete_batch_limit {} exceeds the backend transaction cap of {}",
                self.delete_batch_limit, MAX_TXN_OPS
            )));
        }
        Ok(())
    }
}
