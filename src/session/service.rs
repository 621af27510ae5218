//! Session CRUD over the vector store.

use super::{from_payload, to_payload, NewSession, SessionRecord, SessionStatus};
use crate::embedding::Embedder;
use crate::error::{FinnaError, Result};
use crate::vector_store::{Payload, Point, VectorStore};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Maximum number of session records returned by a single listing.
const LIST_LIMIT: usize = 10_000;

/// Manages session records in the sessions collection.
pub struct SessionService {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    collection: String,
}

impl SessionService {
    /// Create a new session service.
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>, collection: &str) -> Self {
        Self {
            store,
            embedder,
            collection: collection.to_string(),
        }
    }

    /// Create a session record with an embedded title and return its id.
    #[instrument(skip(self, new), fields(title = %new.title))]
    pub async fn create(&self, new: NewSession) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let vector = self.embedder.embed(&new.title).await?;

        let record = SessionRecord {
            title: new.title,
            category: new.category,
            host_id: new.host_id,
            transcript: String::new(),
            upvotes: 0,
            status: SessionStatus::Live,
            created_at: Utc::now(),
            completed_at: None,
            link: format!("/videos/live/{}", id),
        };

        self.store
            .upsert(
                &self.collection,
                vec![Point {
                    id: id.clone(),
                    vector,
                    payload: to_payload(&record)?,
                }],
            )
            .await?;

        info!("Created session {}", id);
        Ok(id)
    }

    /// Fetch a session record by id.
    pub async fn get(&self, session_id: &str) -> Result<SessionRecord> {
        let points = self
            .store
            .retrieve(&self.collection, &[session_id.to_string()])
            .await?;

        let point = points
            .into_iter()
            .next()
            .ok_or_else(|| FinnaError::SessionNotFound(session_id.to_string()))?;

        from_payload(point.payload)
    }

    /// Append new transcript text to a session.
    ///
    /// The transcript only ever grows; each call merges `current + "\n" + text`
    /// back into the record.
    pub async fn append_transcript(&self, session_id: &str, text: &str) -> Result<()> {
        let record = self.get(session_id).await?;

        let combined = if record.transcript.is_empty() {
            text.to_string()
        } else {
            format!("{}\n{}", record.transcript, text)
        };

        let mut patch = Payload::new();
        patch.insert("transcript".to_string(), json!(combined));
        self.store
            .set_payload(&self.collection, &[session_id.to_string()], patch)
            .await
    }

    /// Mark a session completed. Idempotent: a second call leaves the
    /// original completion timestamp in place.
    #[instrument(skip(self))]
    pub async fn complete(&self, session_id: &str) -> Result<()> {
        let record = self.get(session_id).await?;
        if record.status == SessionStatus::Completed {
            return Ok(());
        }

        let mut patch = Payload::new();
        patch.insert("status".to_string(), json!(SessionStatus::Completed));
        patch.insert("completed_at".to_string(), json!(Utc::now()));
        self.store
            .set_payload(&self.collection, &[session_id.to_string()], patch)
            .await?;

        info!("Completed session {}", session_id);
        Ok(())
    }

    /// Increment a session's upvote count and return the new total.
    pub async fn upvote(&self, session_id: &str) -> Result<u64> {
        let record = self.get(session_id).await?;
        let upvotes = record.upvotes + 1;

        let mut patch = Payload::new();
        patch.insert("upvotes".to_string(), json!(upvotes));
        self.store
            .set_payload(&self.collection, &[session_id.to_string()], patch)
            .await?;

        Ok(upvotes)
    }

    /// List all sessions with their ids. Records with payloads that no longer
    /// parse are skipped rather than failing the listing.
    pub async fn list(&self) -> Result<Vec<(String, SessionRecord)>> {
        let points = self.store.scroll(&self.collection, None, LIST_LIMIT).await?;

        Ok(points
            .into_iter()
            .filter_map(|point| {
                let record = from_payload(point.payload).ok()?;
                Some((point.id, record))
            })
            .collect())
    }
}
