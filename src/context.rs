//! Application context: construct-once wiring of all components.
//!
//! The embedder, expander, and vector store are built once at process start
//! and injected into every component that needs them. Nothing in the crate
//! reaches for ambient global clients.

use crate::chunking::WindowChunker;
use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::expansion::{OpenAIQueryExpander, QueryExpander};
use crate::index::ChunkIndexer;
use crate::search::SearchRanker;
use crate::session::SessionService;
use crate::vector_store::{MemoryVectorStore, QdrantVectorStore, VectorStore};
use std::sync::Arc;
use tracing::info;

/// Shared application components.
pub struct AppContext {
    pub settings: Settings,
    pub sessions: SessionService,
    pub indexer: Arc<ChunkIndexer>,
    pub ranker: SearchRanker,
}

impl AppContext {
    /// Build the full component graph from settings.
    ///
    /// Connects to the configured vector store and creates the session and
    /// chunk collections if they are missing.
    pub async fn new(settings: Settings) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        let expander: Arc<dyn QueryExpander> =
            Arc::new(OpenAIQueryExpander::new(&settings.expansion.model));

        let store: Arc<dyn VectorStore> = match settings.vector_store.provider.as_str() {
            "memory" => {
                info!("Using in-memory vector store");
                Arc::new(MemoryVectorStore::new())
            }
            _ => {
                info!("Connecting to Qdrant at {}", settings.vector_store.url);
                Arc::new(QdrantVectorStore::connect(
                    &settings.vector_store.url,
                    settings.vector_store.api_key.as_deref(),
                )?)
            }
        };

        let dimensions = settings.embedding.dimensions as usize;
        store
            .ensure_collection(&settings.vector_store.sessions_collection, dimensions)
            .await?;
        store
            .ensure_collection(&settings.vector_store.chunks_collection, dimensions)
            .await?;

        Ok(Self::with_components(settings, embedder, expander, store))
    }

    /// Wire the component graph from pre-built collaborators.
    pub fn with_components(
        settings: Settings,
        embedder: Arc<dyn Embedder>,
        expander: Arc<dyn QueryExpander>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        let chunker = WindowChunker::new(settings.chunking.window_size);

        let sessions = SessionService::new(
            store.clone(),
            embedder.clone(),
            &settings.vector_store.sessions_collection,
        );

        let indexer = Arc::new(ChunkIndexer::new(
            store.clone(),
            embedder.clone(),
            chunker,
            &settings.vector_store.sessions_collection,
            &settings.vector_store.chunks_collection,
        ));

        let ranker = SearchRanker::new(store, embedder, expander, &settings);

        Self {
            settings,
            sessions,
            indexer,
            ranker,
        }
    }
}
