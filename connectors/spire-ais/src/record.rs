//! Output records.
//!
//! Records follow the OpenCDC layout: a position, an operation, string
//! metadata, a raw key and a raw payload. Raw byte fields serialize as
//! standard base64.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AisError, AisResult},
    types::Vessel,
};

/// Metadata key holding the creation time as Unix nanoseconds.
pub const METADATA_CREATED_AT: &str = "opencdc.createdAt";

/// Opaque resume point; for this source, the end cursor of a page.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(#[serde(with = "base64_bytes")] Vec<u8>);

impl Position {
    /// Create a position from raw bytes.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Position for a page cursor.
    #[must_use]
    pub fn from_cursor(cursor: &str) -> Self {
        Self(cursor.as_bytes().to_vec())
    }

    /// Raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether the position carries no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Interpret the position as a page cursor.
    pub fn to_cursor(&self) -> AisResult<Option<String>> {
        if self.0.is_empty() {
            return Ok(None);
        }
        String::from_utf8(self.0.clone())
            .map(Some)
            .map_err(|e| AisError::InvalidPosition(format!("cursor is not UTF-8: {e}")))
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({:?})", String::from_utf8_lossy(&self.0))
    }
}

/// Record operation. This source only ever creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Newly observed data.
    Create,
}

/// Record payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// State before the change (always empty for creates).
    #[serde(default, with = "base64_opt")]
    pub before: Option<Vec<u8>>,
    /// State after the change.
    #[serde(default, with = "base64_opt")]
    pub after: Option<Vec<u8>>,
}

/// A record handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Resume point for this record.
    pub position: Position,
    /// Operation.
    pub operation: Operation,
    /// String metadata.
    pub metadata: BTreeMap<String, String>,
    /// Raw key.
    #[serde(with = "base64_bytes")]
    pub key: Vec<u8>,
    /// Raw payload.
    pub payload: Payload,
}

impl Record {
    /// Creation time from metadata.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let nanos: i64 = self.metadata.get(METADATA_CREATED_AT)?.parse().ok()?;
        Some(DateTime::from_timestamp_nanos(nanos))
    }
}

/// Parse `YYYY-MM-DDTHH:MM:SS[.frac](Z|±HH:MM)`.
///
/// chrono's RFC 3339 parser also takes a space or lowercase `t` separator and
/// a lowercase `z`; those are rejected here.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if raw.as_bytes().get(10) != Some(&b'T') {
        return Err("expected 'T' between date and time".into());
    }
    if raw.ends_with('z') {
        return Err("expected 'Z' for UTC".into());
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}

/// Wrap a vessel as a create record at `position`.
///
/// The creation time is the vessel's `updateTimestamp`; a timestamp that is
/// not RFC 3339 is an error rather than a skipped record.
pub fn wrap_vessel(vessel: &Vessel, position: Position) -> AisResult<Record> {
    let transform_err = |message: String| AisError::Transform {
        id: vessel.id.clone(),
        message,
    };

    let updated = parse_timestamp(&vessel.update_timestamp).map_err(|e| {
        transform_err(format!(
            "updateTimestamp {:?} is not RFC 3339: {e}",
            vessel.update_timestamp
        ))
    })?;
    let nanos = updated
        .timestamp_nanos_opt()
        .ok_or_else(|| transform_err(format!("updateTimestamp {updated} is out of range")))?;

    let payload = serde_json::to_vec(vessel)
        .map_err(|e| transform_err(format!("error marshalling JSON: {e}")))?;

    let mut metadata = BTreeMap::new();
    metadata.insert(METADATA_CREATED_AT.to_string(), nanos.to_string());

    Ok(Record {
        position,
        operation: Operation::Create,
        metadata,
        key: vessel.id.as_bytes().to_vec(),
        payload: Payload {
            before: None,
            after: Some(payload),
        },
    })
}

mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

mod base64_opt {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match bytes {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|encoded| STANDARD.decode(encoded.as_bytes()))
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}
