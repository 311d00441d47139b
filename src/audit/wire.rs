//! Wire form of an audit record.
//!
//! `event_details` travels as JSON text, `timestamp` as RFC 3339 with whole
//! seconds in UTC (`2023-06-01T12:00:00Z`).

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde_json::value::RawValue;
use thiserror::Error;

use super::{AuditLog, EventType, SchemaVersion};

#[derive(Clone, PartialEq, prost::Message)]
pub struct AuditLogProto {
    #[prost(string, tag = "1")]
    pub event_type: String,
    #[prost(string, tag = "2")]
    pub event_details: String, // JSON document
    #[prost(string, tag = "3")]
    pub timestamp: String, // RFC 3339
    #[prost(int64, tag = "4")]
    pub schema_version: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("could not parse timestamp {value:?} as RFC 3339: {reason}")]
    InvalidTimestamp { value: String, reason: String },
    #[error("event details are not a JSON document: {0}")]
    InvalidDetails(String),
}

impl AuditLog {
    pub fn to_wire(&self) -> AuditLogProto {
        AuditLogProto {
            event_type: self.event_type.as_str().to_string(),
            event_details: self.event_details.get().to_string(),
            timestamp: self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            schema_version: self.schema_version.get(),
        }
    }

    /// Decode a wire record. A timestamp that is not RFC 3339 is an error,
    /// never defaulted.
    pub fn from_wire(proto: AuditLogProto) -> Result<AuditLog, WireError> {
        let timestamp = DateTime::parse_from_rfc3339(&proto.timestamp)
            .map_err(|e| WireError::InvalidTimestamp {
                value: proto.timestamp.clone(),
                reason: e.to_string(),
            })?
            .with_timezone(&Utc)
            .trunc_subsecs(0);
        let event_details = RawValue::from_string(proto.event_details)
            .map_err(|e| WireError::InvalidDetails(e.to_string()))?;

        Ok(AuditLog {
            event_type: EventType::new(proto.event_type),
            event_details,
            timestamp,
            schema_version: SchemaVersion::new(proto.schema_version),
        })
    }
}
