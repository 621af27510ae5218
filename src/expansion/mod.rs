//! LLM-backed query expansion.
//!
//! A search query is fanned out into a handful of paraphrased variations to
//! widen recall. Expansion is strictly best-effort: callers fall back to the
//! original query on any failure.

mod openai;

pub use openai::OpenAIQueryExpander;

use crate::error::{FinnaError, Result};
use async_trait::async_trait;

/// Trait for query expansion.
#[async_trait]
pub trait QueryExpander: Send + Sync {
    /// Produce up to `n` paraphrased variations of `query`.
    ///
    /// May return fewer than `n`. Errors with [`FinnaError::MalformedExpansion`]
    /// when the model's output cannot be parsed.
    async fn expand(&self, query: &str, n: usize) -> Result<Vec<String>>;
}

/// Parse a model response expected to be a JSON array of strings.
///
/// Models frequently wrap the array in markdown code fences; those are
/// stripped before parsing. Blank entries are dropped.
pub(crate) fn parse_expansion(raw: &str) -> Result<Vec<String>> {
    let cleaned = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let queries: Vec<String> = serde_json::from_str(cleaned)
        .map_err(|e| FinnaError::MalformedExpansion(format!("{}: {}", e, raw)))?;

    Ok(queries
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect())
}
