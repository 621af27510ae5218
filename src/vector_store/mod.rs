//! Vector store abstraction for Finna.
//!
//! Provides a trait-based interface over named collections of id-keyed points,
//! each carrying an embedding vector and a JSON payload. The production
//! backend is Qdrant; an in-memory backend backs tests and small deployments.

mod memory;
mod qdrant;

pub use memory::MemoryVectorStore;
pub use qdrant::QdrantVectorStore;

use crate::error::Result;
use async_trait::async_trait;

/// Structured attributes attached to a stored point.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// A point to be stored: id, embedding vector, and payload.
#[derive(Debug, Clone)]
pub struct Point {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

/// A point fetched by id or scroll. Vectors are not returned.
#[derive(Debug, Clone)]
pub struct RetrievedPoint {
    pub id: String,
    pub payload: Payload,
}

/// A search hit with its similarity score (higher is better).
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f32,
    pub payload: Payload,
}

/// Equality condition on one payload field.
#[derive(Debug, Clone)]
pub struct FieldMatch {
    pub key: String,
    pub value: serde_json::Value,
}

/// Conjunction of payload equality conditions.
#[derive(Debug, Clone, Default)]
pub struct PointFilter {
    pub must: Vec<FieldMatch>,
}

impl PointFilter {
    /// Filter requiring `key == value`.
    pub fn must_match(key: &str, value: serde_json::Value) -> Self {
        Self {
            must: vec![FieldMatch {
                key: key.to_string(),
                value,
            }],
        }
    }

    /// Check a payload against every condition.
    pub fn matches(&self, payload: &Payload) -> bool {
        self.must
            .iter()
            .all(|cond| payload.get(&cond.key) == Some(&cond.value))
    }
}

/// Trait for vector store implementations.
///
/// `retrieve` and `scroll` always return a collection, possibly empty; an
/// absent id is never an error at this layer. Callers decide whether absence
/// is a 404 or a silently dropped candidate.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a collection if it does not already exist.
    async fn ensure_collection(&self, collection: &str, dimensions: usize) -> Result<()>;

    /// Insert or overwrite points by id.
    async fn upsert(&self, collection: &str, points: Vec<Point>) -> Result<()>;

    /// Fetch points by id. Missing ids are simply absent from the result.
    async fn retrieve(&self, collection: &str, ids: &[String]) -> Result<Vec<RetrievedPoint>>;

    /// Merge fields into the payloads of the given points (no replacement).
    async fn set_payload(&self, collection: &str, ids: &[String], payload: Payload) -> Result<()>;

    /// Nearest-neighbor search, ordered by descending score.
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        filter: Option<&PointFilter>,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>>;

    /// Enumerate points without a query vector.
    async fn scroll(
        &self,
        collection: &str,
        filter: Option<&PointFilter>,
        limit: usize,
    ) -> Result<Vec<RetrievedPoint>>;

    /// Total number of points in a collection.
    async fn count(&self, collection: &str) -> Result<usize>;

    /// Delete points by id.
    async fn delete(&self, collection: &str, ids: &[String]) -> Result<()>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Compute the dot product of two vectors.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_dot_product() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![4.0, 5.0, 6.0];
        assert!((dot(&a, &b) - 32.0).abs() < 0.001);
    }

    #[test]
    fn test_filter_matches() {
        let mut payload = Payload::new();
        payload.insert("category".to_string(), json!("Math"));
        payload.insert("upvotes".to_string(), json!(3));

        assert!(PointFilter::must_match("category", json!("Math")).matches(&payload));
        assert!(!PointFilter::must_match("category", json!("Art")).matches(&payload));
        assert!(!PointFilter::must_match("missing", json!("x")).matches(&payload));
        assert!(PointFilter::default().matches(&payload));
    }
}
