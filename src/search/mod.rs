//! Multi-query search with per-session ranking.
//!
//! A raw query is expanded into paraphrased variations, every variation is
//! searched against the chunk index, and the pooled hits are reduced to one
//! entry per session (best coarse score wins). Each surviving session's
//! current transcript is then re-chunked and re-ranked against the original
//! query embedding to pick the excerpt shown to the user. The stored chunk
//! text can be stale relative to a transcript that kept growing, so the
//! display excerpt is always re-derived from the live record; the stored text
//! only serves as a fallback.

use crate::chunking::WindowChunker;
use crate::config::Settings;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::expansion::QueryExpander;
use crate::session::{from_payload, SessionRecord};
use crate::vector_store::{dot, PointFilter, ScoredPoint, VectorStore};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Category value meaning "do not filter".
const CATEGORY_ALL: &str = "All";

/// One ranked search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub title: String,
    /// Best-matching excerpt, with the query wrapped in `<mark>` when it
    /// occurs verbatim.
    pub excerpt: String,
    pub upvotes: u64,
    pub link: String,
    pub category: String,
}

/// The search orchestrator.
pub struct SearchRanker {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    expander: Arc<dyn QueryExpander>,
    chunker: WindowChunker,
    sessions_collection: String,
    chunks_collection: String,
    expansion_enabled: bool,
    variations: usize,
    per_query_limit: usize,
    max_results: usize,
    cold_start_threshold: usize,
    excerpt_chars: usize,
}

impl SearchRanker {
    /// Create a search ranker from settings and injected collaborators.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        expander: Arc<dyn QueryExpander>,
        settings: &Settings,
    ) -> Self {
        Self {
            store,
            embedder,
            expander,
            chunker: WindowChunker::new(settings.chunking.window_size),
            sessions_collection: settings.vector_store.sessions_collection.clone(),
            chunks_collection: settings.vector_store.chunks_collection.clone(),
            expansion_enabled: settings.expansion.enabled,
            variations: settings.expansion.variations,
            per_query_limit: settings.search.per_query_limit,
            max_results: settings.search.max_results,
            cold_start_threshold: settings.search.cold_start_threshold,
            excerpt_chars: settings.search.excerpt_chars,
        }
    }

    /// Run a search, returning at most `max_results` ranked entries.
    ///
    /// With fewer tracked sessions than the cold-start threshold the corpus is
    /// too small for similarity ranking to mean anything, so every session is
    /// returned instead (that list is not capped).
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search(&self, query: &str, category: Option<&str>) -> Result<Vec<SearchHit>> {
        let tracked = self.store.count(&self.sessions_collection).await?;
        if tracked < self.cold_start_threshold {
            debug!("Cold start: {} tracked sessions", tracked);
            return self.cold_start_results().await;
        }

        // The original query always goes last in the set; its embedding
        // doubles as the re-ranking vector below.
        let queries = self.query_set(query).await;
        let embeddings = self.embedder.embed_batch(&queries).await?;
        let query_vector = embeddings
            .last()
            .cloned()
            .unwrap_or_default();

        let filter = category
            .filter(|c| *c != CATEGORY_ALL && !c.is_empty())
            .map(|c| PointFilter::must_match("category", json!(c)));

        let mut pool: Vec<ScoredPoint> = Vec::new();
        for vector in &embeddings {
            let hits = self
                .store
                .search(
                    &self.chunks_collection,
                    vector,
                    filter.as_ref(),
                    self.per_query_limit,
                )
                .await?;
            pool.extend(hits);
        }

        let best = dedup_by_session(pool);

        let mut results = Vec::with_capacity(best.len());
        for (session_id, hit) in best {
            let Some(record) = self.fetch_session(&session_id).await else {
                continue;
            };

            let excerpt_source = self.best_excerpt(&record, &hit, &query_vector).await;
            results.push(SearchHit {
                title: record.title,
                excerpt: highlight(&excerpt_source, query),
                upvotes: record.upvotes,
                link: record.link,
                category: record.category,
            });
        }

        results.sort_by(|a, b| b.upvotes.cmp(&a.upvotes));
        results.truncate(self.max_results);
        Ok(results)
    }

    /// Build the query set: paraphrases plus the original, or just the
    /// original when expansion is disabled, fails, or returns nothing.
    async fn query_set(&self, query: &str) -> Vec<String> {
        if !self.expansion_enabled {
            return vec![query.to_string()];
        }

        match self.expander.expand(query, self.variations).await {
            Ok(variations) if !variations.is_empty() => {
                let mut queries = variations;
                queries.push(query.to_string());
                queries
            }
            Ok(_) => vec![query.to_string()],
            Err(e) => {
                warn!("Query expansion failed, using raw query: {}", e);
                vec![query.to_string()]
            }
        }
    }

    /// Every tracked session, excerpted from the head of its transcript and
    /// ordered by upvotes. No ranking or highlighting is applied.
    async fn cold_start_results(&self) -> Result<Vec<SearchHit>> {
        let points = self
            .store
            .scroll(&self.sessions_collection, None, self.cold_start_threshold.max(1))
            .await?;

        let mut results: Vec<SearchHit> = points
            .into_iter()
            .filter_map(|point| {
                let record: SessionRecord = from_payload(point.payload).ok()?;
                Some(SearchHit {
                    excerpt: excerpt(&record.transcript, self.excerpt_chars),
                    title: record.title,
                    upvotes: record.upvotes,
                    link: record.link,
                    category: record.category,
                })
            })
            .collect();

        results.sort_by(|a, b| b.upvotes.cmp(&a.upvotes));
        Ok(results)
    }

    /// Fetch a session record, treating any miss as a dropped candidate.
    async fn fetch_session(&self, session_id: &str) -> Option<SessionRecord> {
        let points = match self
            .store
            .retrieve(&self.sessions_collection, &[session_id.to_string()])
            .await
        {
            Ok(points) => points,
            Err(e) => {
                warn!("Record fetch failed for {}, dropping: {}", session_id, e);
                return None;
            }
        };

        let point = points.into_iter().next().or_else(|| {
            debug!("Chunk references missing session {}, dropping", session_id);
            None
        })?;

        match from_payload(point.payload) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Unreadable session payload for {}, dropping: {}", session_id, e);
                None
            }
        }
    }

    /// Re-chunk the live transcript and pick the chunk closest to the
    /// original query. Falls back to the stored chunk text when the
    /// transcript is empty or re-rank embedding fails.
    async fn best_excerpt(
        &self,
        record: &SessionRecord,
        hit: &ScoredPoint,
        query_vector: &[f32],
    ) -> String {
        let stored = || {
            hit.payload
                .get("chunk_text")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };

        let chunks = self.chunker.chunk(&record.transcript);
        if chunks.is_empty() {
            return stored();
        }

        match self.embedder.embed_batch(&chunks).await {
            Ok(vectors) => {
                let mut best_index = 0;
                let mut best_score = f32::NEG_INFINITY;
                for (i, vector) in vectors.iter().enumerate() {
                    let score = dot(vector, query_vector);
                    // Strict comparison keeps the earliest chunk on ties.
                    if score > best_score {
                        best_score = score;
                        best_index = i;
                    }
                }
                chunks.into_iter().nth(best_index).unwrap_or_else(stored)
            }
            Err(e) => {
                warn!("Re-rank embedding failed, using stored chunk: {}", e);
                stored()
            }
        }
    }
}

/// Reduce pooled hits to the best-scoring hit per owning session.
///
/// Comparison is strictly greater-than, so the first-seen hit wins ties.
fn dedup_by_session(pool: Vec<ScoredPoint>) -> HashMap<String, ScoredPoint> {
    let mut best: HashMap<String, ScoredPoint> = HashMap::new();
    for hit in pool {
        let Some(session_id) = hit.payload.get("video_id").and_then(|v| v.as_str()) else {
            continue;
        };
        match best.get(session_id) {
            Some(existing) if hit.score <= existing.score => {}
            _ => {
                best.insert(session_id.to_string(), hit);
            }
        }
    }
    best
}

/// Wrap the first case-insensitive occurrence of `query` in a highlight
/// marker, preserving the original casing. A chunk without the literal query
/// (ranking may have gone through a paraphrase) is returned unmodified.
pub fn highlight(chunk: &str, query: &str) -> String {
    if query.is_empty() {
        return chunk.to_string();
    }

    let pattern = match regex::RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    {
        Ok(pattern) => pattern,
        Err(_) => return chunk.to_string(),
    };

    pattern.replace(chunk, "<mark>${0}</mark>").into_owned()
}

/// Head of the transcript for cold-start display, ellipsis-terminated when
/// truncated.
fn excerpt(transcript: &str, max_chars: usize) -> String {
    let mut out: String = transcript.chars().take(max_chars).collect();
    if transcript.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FinnaError;
    use crate::index::ChunkIndexer;
    use crate::session::{NewSession, SessionService};
    use crate::vector_store::{MemoryVectorStore, Payload};
    use async_trait::async_trait;

    /// Deterministic bag-of-words embedder over a tiny vocabulary.
    struct StubEmbedder;

    const VOCAB: [&str; 8] = [
        "graphs", "vectors", "matrices", "calculus", "poetry", "painting", "rust", "cooking",
    ];

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> crate::error::Result<Vec<f32>> {
            let lower = text.to_lowercase();
            Ok(VOCAB
                .iter()
                .map(|w| if lower.contains(w) { 1.0 } else { 0.0 })
                .collect())
        }

        async fn embed_batch(&self, texts: &[String]) -> crate::error::Result<Vec<Vec<f32>>> {
            let mut out = Vec::new();
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            VOCAB.len()
        }
    }

    /// Expander that always fails like a model emitting prose instead of JSON.
    struct BrokenExpander;

    #[async_trait]
    impl QueryExpander for BrokenExpander {
        async fn expand(&self, _query: &str, _n: usize) -> crate::error::Result<Vec<String>> {
            Err(FinnaError::MalformedExpansion(
                "Sure! Here are some ideas:".to_string(),
            ))
        }
    }

    struct Fixture {
        store: Arc<MemoryVectorStore>,
        sessions: SessionService,
        indexer: ChunkIndexer,
        ranker: SearchRanker,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryVectorStore::new());
        let embedder = Arc::new(StubEmbedder);
        let mut settings = Settings::default();
        settings.vector_store.provider = "memory".to_string();

        Fixture {
            store: store.clone(),
            sessions: SessionService::new(store.clone(), embedder.clone(), "videos"),
            indexer: ChunkIndexer::new(
                store.clone(),
                embedder.clone(),
                WindowChunker::default(),
                "videos",
                "video_chunks",
            ),
            ranker: SearchRanker::new(store, embedder, Arc::new(BrokenExpander), &settings),
        }
    }

    async fn seed_session(
        fixture: &Fixture,
        title: &str,
        category: &str,
        transcript: &str,
        upvotes: u64,
    ) -> String {
        let id = fixture
            .sessions
            .create(NewSession {
                title: title.to_string(),
                category: category.to_string(),
                host_id: String::new(),
            })
            .await
            .unwrap();
        fixture.sessions.append_transcript(&id, transcript).await.unwrap();
        for _ in 0..upvotes {
            fixture.sessions.upvote(&id).await.unwrap();
        }
        fixture.sessions.complete(&id).await.unwrap();
        fixture.indexer.index_session(&id).await.unwrap();
        id
    }

    fn scored(session_id: &str, score: f32) -> ScoredPoint {
        let mut payload = Payload::new();
        payload.insert("video_id".to_string(), json!(session_id));
        payload.insert("chunk_text".to_string(), json!("text"));
        ScoredPoint {
            id: format!("{}_0", session_id),
            score,
            payload,
        }
    }

    #[test]
    fn test_dedup_keeps_highest_score() {
        let pool = vec![scored("v1", 0.5), scored("v1", 0.9), scored("v1", 0.3)];
        let best = dedup_by_session(pool);
        assert_eq!(best.len(), 1);
        assert!((best["v1"].score - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn test_dedup_first_seen_wins_ties() {
        let mut first = scored("v1", 0.7);
        first.id = "v1_3".to_string();
        let mut second = scored("v1", 0.7);
        second.id = "v1_8".to_string();

        let best = dedup_by_session(vec![first, second]);
        assert_eq!(best["v1"].id, "v1_3");
    }

    #[test]
    fn test_highlight_preserves_original_casing() {
        assert_eq!(highlight("The Cat sat.", "cat"), "The <mark>Cat</mark> sat.");
    }

    #[test]
    fn test_highlight_first_occurrence_only() {
        assert_eq!(
            highlight("cat and Cat", "cat"),
            "<mark>cat</mark> and Cat"
        );
    }

    #[test]
    fn test_highlight_absent_query_leaves_chunk_unmodified() {
        assert_eq!(highlight("The cat sat.", "dog"), "The cat sat.");
    }

    #[test]
    fn test_highlight_escapes_regex_metacharacters() {
        assert_eq!(
            highlight("what is 2+2 anyway", "2+2"),
            "what is <mark>2+2</mark> anyway"
        );
    }

    #[test]
    fn test_excerpt_truncation() {
        assert_eq!(excerpt("short text", 200), "short text");
        let long = "x".repeat(250);
        let cut = excerpt(&long, 200);
        assert_eq!(cut.chars().count(), 203);
        assert!(cut.ends_with("..."));
    }

    #[tokio::test]
    async fn test_cold_start_returns_all_sorted_by_upvotes() {
        let fixture = fixture();
        for (i, upvotes) in [2u64, 5, 1, 4, 3].iter().enumerate() {
            seed_session(
                &fixture,
                &format!("Session {}", i),
                "Math",
                "About vectors. And graphs.",
                *upvotes,
            )
            .await;
        }

        let results = fixture.ranker.search("graphs", None).await.unwrap();
        assert_eq!(results.len(), 5);

        let upvotes: Vec<u64> = results.iter().map(|r| r.upvotes).collect();
        assert_eq!(upvotes, vec![5, 4, 3, 2, 1]);
        // Cold start skips highlighting entirely.
        assert!(results.iter().all(|r| !r.excerpt.contains("<mark>")));
    }

    #[tokio::test]
    async fn test_ranked_search_finds_matching_session() {
        let fixture = fixture();

        // Ten filler sessions push the corpus past the cold-start threshold.
        for i in 0..10 {
            seed_session(
                &fixture,
                &format!("Filler {}", i),
                "Art",
                "All about poetry. And painting.",
                0,
            )
            .await;
        }

        let transcript = "Welcome everyone. Today is about matrices. \
                          Later we cover graphs in detail. Graphs connect nodes. \
                          That wraps it up. Thanks for joining.";
        seed_session(&fixture, "Graph Theory Live", "Math", transcript, 7).await;

        let results = fixture.ranker.search("graphs", None).await.unwrap();
        assert!(!results.is_empty());
        assert!(results.len() <= 10);

        let hit = results.iter().find(|r| r.title == "Graph Theory Live").unwrap();
        assert_eq!(hit.upvotes, 7);
        // Excerpt is re-derived from the live transcript and centered on the
        // matching sentence, with the literal query highlighted.
        assert!(hit.excerpt.to_lowercase().contains("graphs"));
        assert!(hit.excerpt.contains("<mark>"));
    }

    #[tokio::test]
    async fn test_category_filter_restricts_results() {
        let fixture = fixture();
        for i in 0..10 {
            seed_session(
                &fixture,
                &format!("Art {}", i),
                "Art",
                "All about poetry. Painting too.",
                0,
            )
            .await;
        }
        seed_session(
            &fixture,
            "Math Only",
            "Math",
            "All about graphs. Really about graphs.",
            1,
        )
        .await;

        let results = fixture.ranker.search("graphs", Some("Art")).await.unwrap();
        assert!(results.iter().all(|r| r.category == "Art"));

        let results = fixture.ranker.search("graphs", Some("Math")).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Math Only");
    }

    #[tokio::test]
    async fn test_broken_expander_degrades_to_raw_query() {
        let fixture = fixture();
        for i in 0..11 {
            seed_session(
                &fixture,
                &format!("Session {}", i),
                "Math",
                "About graphs. More graphs.",
                i as u64,
            )
            .await;
        }

        // BrokenExpander always errors; the search must still succeed.
        let results = fixture.ranker.search("graphs", None).await.unwrap();
        assert!(!results.is_empty());
        assert!(results.len() <= 10);
    }

    #[tokio::test]
    async fn test_end_to_end_excerpt_centers_on_matching_sentence() {
        let fixture = fixture();
        for i in 0..10 {
            seed_session(
                &fixture,
                &format!("Filler {}", i),
                "Art",
                "All about poetry. And painting.",
                0,
            )
            .await;
        }

        // Twelve sentences; only sentence seven talks about calculus.
        let transcript = (1..=12)
            .map(|i| {
                if i == 7 {
                    "Sentence seven is all about calculus.".to_string()
                } else {
                    format!("Sentence number {} says nothing special.", i)
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        let id = seed_session(&fixture, "Calculus Live", "Math", &transcript, 1).await;

        // One chunk per sentence made it into the index.
        let session_chunks = fixture
            .store
            .scroll(
                "video_chunks",
                Some(&PointFilter::must_match("video_id", json!(id))),
                100,
            )
            .await
            .unwrap();
        assert_eq!(session_chunks.len(), 12);

        let results = fixture.ranker.search("calculus", None).await.unwrap();
        let hit = results.iter().find(|r| r.title == "Calculus Live").unwrap();
        // The chosen excerpt is the window around the matching sentence, with
        // the query highlighted inside it.
        assert!(hit.excerpt.contains("Sentence seven is all about"));
        assert!(hit.excerpt.contains("<mark>calculus</mark>"));
    }

    #[tokio::test]
    async fn test_ranked_results_never_exceed_cap() {
        let fixture = fixture();
        for i in 0..15 {
            seed_session(
                &fixture,
                &format!("Session {}", i),
                "Math",
                "About graphs. Always graphs.",
                i as u64,
            )
            .await;
        }

        let results = fixture.ranker.search("graphs", None).await.unwrap();
        assert!(results.len() <= 10);
        // Sorted by upvotes, descending.
        assert!(results.windows(2).all(|w| w[0].upvotes >= w[1].upvotes));
    }
}
