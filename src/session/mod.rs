//! Live session records and their lifecycle.
//!
//! A session is created `live` with an empty transcript, grows through
//! incremental transcript appends, and is completed exactly once. Session
//! records live in the vector store keyed by a UUID, with the title embedding
//! as the point vector so the record itself is searchable.

mod service;

pub use service::SessionService;

use crate::error::{FinnaError, Result};
use crate::vector_store::Payload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Session is in progress; transcript still growing.
    Live,
    /// Session has ended; transcript is final and indexed.
    Completed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Live => write!(f, "live"),
            SessionStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Input for creating a new session.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSession {
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub host_id: String,
}

/// A session record as stored in the vector store payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub host_id: String,
    /// Full transcript so far. Grown by appends, stored whole.
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub upvotes: u64,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Display path for the session page.
    #[serde(default)]
    pub link: String,
}

/// Denormalized payload stored with each indexed chunk.
///
/// Title, upvotes, link, and category are snapshots taken at indexing time;
/// they are not kept in sync with later edits to the parent record. The
/// category copy is what the search-time equality filter runs against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub video_id: String,
    pub chunk_text: String,
    pub title: String,
    pub upvotes: u64,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub category: String,
}

/// Serialize a record into a vector store payload map.
pub fn to_payload<T: Serialize>(record: &T) -> Result<Payload> {
    match serde_json::to_value(record)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(FinnaError::InvalidInput(format!(
            "Expected object payload, got {}",
            other
        ))),
    }
}

/// Deserialize a vector store payload map back into a record.
pub fn from_payload<T: for<'de> Deserialize<'de>>(payload: Payload) -> Result<T> {
    Ok(serde_json::from_value(serde_json::Value::Object(payload))?)
}
