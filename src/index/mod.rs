//! Chunk indexing pipeline.
//!
//! Takes a session's full transcript, chunks it, embeds every chunk, and
//! upserts the chunk points into the vector store. Chunk ids are
//! `{session_id}_{index}`, so re-indexing the same session overwrites the
//! previous points in place; any higher-index points left over from a longer
//! earlier transcript are deleted afterwards.

use crate::chunking::WindowChunker;
use crate::embedding::Embedder;
use crate::error::{FinnaError, Result};
use crate::session::{from_payload, to_payload, ChunkPayload, SessionRecord};
use crate::vector_store::{Point, PointFilter, VectorStore};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Maximum points per upsert call, to bound request size.
const MAX_UPSERT_BATCH: usize = 100;

/// Upper bound when enumerating a session's existing chunk points.
const CHUNK_SCAN_LIMIT: usize = 10_000;

/// Indexes completed transcripts into the chunk collection.
pub struct ChunkIndexer {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    chunker: WindowChunker,
    sessions_collection: String,
    chunks_collection: String,
}

impl ChunkIndexer {
    /// Create a new chunk indexer.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        chunker: WindowChunker,
        sessions_collection: &str,
        chunks_collection: &str,
    ) -> Self {
        Self {
            store,
            embedder,
            chunker,
            sessions_collection: sessions_collection.to_string(),
            chunks_collection: chunks_collection.to_string(),
        }
    }

    /// Index a session's transcript, swallowing all errors.
    ///
    /// Indexing is fire-and-forget: failures are logged, never surfaced to
    /// the caller that triggered them. Callers must not assume indexing
    /// succeeded; chunks that never made it in simply don't surface in search.
    #[instrument(skip(self))]
    pub async fn index(&self, session_id: &str) {
        match self.index_session(session_id).await {
            Ok(count) => info!("Indexed {} chunks for session {}", count, session_id),
            Err(e) => error!("Indexing failed for session {}: {}", session_id, e),
        }
    }

    /// Index a session's transcript, returning the number of chunks stored.
    ///
    /// Batches have no atomicity guarantee between them; a mid-batch failure
    /// leaves earlier batches in place.
    pub async fn index_session(&self, session_id: &str) -> Result<usize> {
        let points = self
            .store
            .retrieve(&self.sessions_collection, &[session_id.to_string()])
            .await?;
        let record: SessionRecord = points
            .into_iter()
            .next()
            .ok_or_else(|| FinnaError::SessionNotFound(session_id.to_string()))
            .and_then(|p| from_payload(p.payload))?;

        let chunks = self.chunker.chunk(&record.transcript);
        if chunks.is_empty() {
            self.prune_stale_chunks(session_id, 0).await?;
            return Ok(0);
        }

        let embeddings = self.embedder.embed_batch(&chunks).await?;

        let mut chunk_points = Vec::with_capacity(chunks.len());
        for (i, (chunk, vector)) in chunks.into_iter().zip(embeddings).enumerate() {
            let payload = to_payload(&ChunkPayload {
                video_id: session_id.to_string(),
                chunk_text: chunk,
                title: record.title.clone(),
                upvotes: record.upvotes,
                link: record.link.clone(),
                category: record.category.clone(),
            })?;

            chunk_points.push(Point {
                id: format!("{}_{}", session_id, i),
                vector,
                payload,
            });
        }

        let total = chunk_points.len();
        for batch in chunk_points.chunks(MAX_UPSERT_BATCH) {
            self.store
                .upsert(&self.chunks_collection, batch.to_vec())
                .await?;
        }

        self.prune_stale_chunks(session_id, total).await?;
        Ok(total)
    }

    /// Delete chunk points whose index is beyond the current chunk count.
    ///
    /// A transcript that shrank between indexings would otherwise leave its
    /// trailing chunks serving stale text forever.
    async fn prune_stale_chunks(&self, session_id: &str, live_count: usize) -> Result<()> {
        let filter = PointFilter::must_match("video_id", json!(session_id));
        let existing = self
            .store
            .scroll(&self.chunks_collection, Some(&filter), CHUNK_SCAN_LIMIT)
            .await?;

        let stale: Vec<String> = existing
            .into_iter()
            .filter_map(|point| {
                let index: usize = point.id.rsplit('_').next()?.parse().ok()?;
                (index >= live_count).then_some(point.id)
            })
            .collect();

        if !stale.is_empty() {
            info!(
                "Pruning {} stale chunks for session {}",
                stale.len(),
                session_id
            );
            self.store.delete(&self.chunks_collection, &stale).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{NewSession, SessionService};
    use crate::vector_store::MemoryVectorStore;
    use async_trait::async_trait;

    /// Deterministic embedder: one dimension per known word.
    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let words = ["alpha", "beta", "gamma", "delta"];
            Ok(words
                .iter()
                .map(|w| if text.to_lowercase().contains(w) { 1.0 } else { 0.0 })
                .collect())
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::new();
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            4
        }
    }

    fn fixtures() -> (Arc<MemoryVectorStore>, SessionService, ChunkIndexer) {
        let store = Arc::new(MemoryVectorStore::new());
        let embedder = Arc::new(StubEmbedder);
        let sessions = SessionService::new(store.clone(), embedder.clone(), "videos");
        let indexer = ChunkIndexer::new(
            store.clone(),
            embedder,
            WindowChunker::default(),
            "videos",
            "video_chunks",
        );
        (store, sessions, indexer)
    }

    async fn create_session(sessions: &SessionService, transcript: &str) -> String {
        let id = sessions
            .create(NewSession {
                title: "Test".to_string(),
                category: "Math".to_string(),
                host_id: String::new(),
            })
            .await
            .unwrap();
        sessions.append_transcript(&id, transcript).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_index_stores_one_chunk_per_sentence() {
        let (store, sessions, indexer) = fixtures();
        let transcript = (1..=12)
            .map(|i| format!("Sentence number {}.", i))
            .collect::<Vec<_>>()
            .join(" ");
        let id = create_session(&sessions, &transcript).await;

        let count = indexer.index_session(&id).await.unwrap();
        assert_eq!(count, 12);
        assert_eq!(store.count("video_chunks").await.unwrap(), 12);

        // Ids are {session_id}_{index} with the denormalized snapshot.
        let first = store
            .retrieve("video_chunks", &[format!("{}_0", id)])
            .await
            .unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].payload.get("video_id").unwrap(), &json!(id));
        assert_eq!(first[0].payload.get("title").unwrap(), &json!("Test"));
        assert_eq!(first[0].payload.get("category").unwrap(), &json!("Math"));
    }

    #[tokio::test]
    async fn test_index_missing_session_is_not_found() {
        let (_, _, indexer) = fixtures();
        let err = indexer.index_session("ghost").await.unwrap_err();
        assert!(matches!(err, FinnaError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_fire_and_forget_swallows_errors() {
        let (_, _, indexer) = fixtures();
        // Must not panic or propagate.
        indexer.index("ghost").await;
    }

    #[tokio::test]
    async fn test_reindex_prunes_stale_trailing_chunks() {
        let (store, sessions, indexer) = fixtures();
        let id = create_session(&sessions, "One. Two. Three. Four. Five.").await;

        assert_eq!(indexer.index_session(&id).await.unwrap(), 5);
        assert_eq!(store.count("video_chunks").await.unwrap(), 5);

        // Shrink the transcript by replacing the record wholesale.
        let mut patch = crate::vector_store::Payload::new();
        patch.insert("transcript".to_string(), json!("One. Two."));
        store
            .set_payload("videos", &[id.clone()], patch)
            .await
            .unwrap();

        assert_eq!(indexer.index_session(&id).await.unwrap(), 2);
        assert_eq!(store.count("video_chunks").await.unwrap(), 2);

        let stale = store
            .retrieve("video_chunks", &[format!("{}_4", id)])
            .await
            .unwrap();
        assert!(stale.is_empty());
    }
}
