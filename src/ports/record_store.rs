//! Record Store Port - key-value persistence for profiles, favorites and sessions.
//!
//! Callers never know which backend they talk to. The store works on plain
//! JSON objects; typed decoding happens one layer up in the application.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::domain::foundation::{StoreKey, Timestamp};

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// The three persisted record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Profile,
    Favorites,
    Session,
}

impl RecordKind {
    pub const ALL: [RecordKind; 3] = [RecordKind::Profile, RecordKind::Favorites, RecordKind::Session];

    /// Table file used by the JSON file backend.
    pub fn file_name(&self) -> &'static str {
        match self {
            RecordKind::Profile => "profiles.json",
            RecordKind::Favorites => "favorites.json",
            RecordKind::Session => "sessions.json",
        }
    }

    /// Collection used by the document database backend.
    pub fn collection(&self) -> &'static str {
        match self {
            RecordKind::Profile => "profiles",
            RecordKind::Favorites => "favorites",
            RecordKind::Session => "sessions",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

/// Errors that can occur during store operations.
///
/// A missing record is not an error; `get` returns `Ok(None)`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Backend could not be reached or answered with a server error.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A stored record exists but cannot be decoded.
    #[error("Corrupt {kind} record at {key}: {reason}")]
    Corrupt {
        kind: RecordKind,
        key: String,
        reason: String,
    },

    #[error("Failed to serialize record: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    /// Concurrent writers kept racing past the retry budget.
    #[error("Write conflict on {0}")]
    Conflict(String),
}

impl StoreError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    pub fn corrupt(kind: RecordKind, key: &StoreKey, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            kind,
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// True for conditions that mean "could not find out", as opposed to
    /// "found out and it was bad".
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Io(_) | StoreError::Conflict(_))
    }
}

/// Port for backend-agnostic record persistence.
///
/// # Contract
///
/// - `get` returns `Ok(None)` for a missing key and never fails for that reason
/// - `set` stamps timestamps via [`stamp_record`] and is atomic per key: a
///   concurrent reader sees either the old or the new record
/// - `delete` of a missing key succeeds
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, kind: RecordKind, key: &StoreKey) -> Result<Option<Value>, StoreError>;

    /// Stores `record` and returns it as persisted (with timestamps).
    async fn set(&self, kind: RecordKind, key: &StoreKey, record: Value) -> Result<Value, StoreError>;

    async fn delete(&self, kind: RecordKind, key: &StoreKey) -> Result<(), StoreError>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}

/// Merges timestamps into `incoming` before it is written.
///
/// - `created_at`: the stored value if present, else the incoming one, else `now`
/// - `updated_at`: `now`, or one second past the stored value when the clock
///   has not moved on since the last write
///
/// # Errors
///
/// `Serialization` if `incoming` is not a JSON object.
pub fn stamp_record(
    existing: Option<&Value>,
    incoming: Value,
    now: Timestamp,
) -> Result<Value, StoreError> {
    let Value::Object(mut fields) = incoming else {
        return Err(StoreError::Serialization(
            "record must be a JSON object".to_string(),
        ));
    };

    let stored_created = existing.and_then(|e| read_timestamp(e, CREATED_AT));
    let incoming_created = fields
        .get(CREATED_AT)
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<Timestamp>().ok());
    let created_at = stored_created.or(incoming_created).unwrap_or(now);

    let updated_at = match existing.and_then(|e| read_timestamp(e, UPDATED_AT)) {
        Some(previous) if !now.is_after(&previous) => previous.plus_secs(1),
        _ => now,
    };

    fields.insert(CREATED_AT.to_string(), Value::String(created_at.to_iso_string()));
    fields.insert(UPDATED_AT.to_string(), Value::String(updated_at.to_iso_string()));
    Ok(Value::Object(fields))
}

fn read_timestamp(record: &Value, field: &str) -> Option<Timestamp> {
    record.get(field)?.as_str()?.parse().ok()
}
