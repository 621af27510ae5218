//! Finna - Live Session Search
//!
//! A service for indexing live session transcripts and searching them
//! semantically.
//!
//! The name "Finna" comes from the Old Norse word for "to find."
//!
//! # Overview
//!
//! Finna allows you to:
//! - Create live session records and grow their transcripts incrementally
//! - Index completed transcripts as overlapping sentence-window chunks
//! - Search sessions with LLM-expanded queries and vector similarity
//! - Serve the whole thing over a small HTTP API
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `session` - Session records and lifecycle
//! - `chunking` - Sentence-window transcript chunking
//! - `embedding` - Embedding generation
//! - `expansion` - LLM query expansion
//! - `vector_store` - Vector database abstraction
//! - `index` - Chunk indexing pipeline
//! - `search` - Multi-query search and ranking
//! - `server` - HTTP API
//! - `context` - Component wiring
//!
//! # Example
//!
//! ```rust,no_run
//! use finna::config::Settings;
//! use finna::context::AppContext;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let context = AppContext::new(settings).await?;
//!
//!     let results = context.ranker.search("graph theory", None).await?;
//!     println!("Found {} sessions", results.len());
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod context;
pub mod embedding;
pub mod error;
pub mod expansion;
pub mod index;
pub mod openai;
pub mod search;
pub mod server;
pub mod session;
pub mod vector_store;

pub use error::{FinnaError, Result};
