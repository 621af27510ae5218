//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets. Search is a brute-force cosine
//! scan over the collection.

use super::{cosine_similarity, Payload, Point, PointFilter, RetrievedPoint, ScoredPoint, VectorStore};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory vector store.
pub struct MemoryVectorStore {
    collections: RwLock<HashMap<String, HashMap<String, Point>>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn ensure_collection(&self, collection: &str, _dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().unwrap();
        collections.entry(collection.to_string()).or_default();
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<Point>) -> Result<()> {
        let mut collections = self.collections.write().unwrap();
        let store = collections.entry(collection.to_string()).or_default();
        for point in points {
            store.insert(point.id.clone(), point);
        }
        Ok(())
    }

    async fn retrieve(&self, collection: &str, ids: &[String]) -> Result<Vec<RetrievedPoint>> {
        let collections = self.collections.read().unwrap();
        let Some(store) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(ids
            .iter()
            .filter_map(|id| store.get(id))
            .map(|point| RetrievedPoint {
                id: point.id.clone(),
                payload: point.payload.clone(),
            })
            .collect())
    }

    async fn set_payload(&self, collection: &str, ids: &[String], payload: Payload) -> Result<()> {
        let mut collections = self.collections.write().unwrap();
        let Some(store) = collections.get_mut(collection) else {
            return Ok(());
        };

        for id in ids {
            if let Some(point) = store.get_mut(id) {
                for (key, value) in &payload {
                    point.payload.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        filter: Option<&PointFilter>,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>> {
        let collections = self.collections.read().unwrap();
        let Some(store) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut results: Vec<ScoredPoint> = store
            .values()
            .filter(|point| filter.is_none_or(|f| f.matches(&point.payload)))
            .map(|point| ScoredPoint {
                id: point.id.clone(),
                score: cosine_similarity(vector, &point.vector),
                payload: point.payload.clone(),
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }

    async fn scroll(
        &self,
        collection: &str,
        filter: Option<&PointFilter>,
        limit: usize,
    ) -> Result<Vec<RetrievedPoint>> {
        let collections = self.collections.read().unwrap();
        let Some(store) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut results: Vec<RetrievedPoint> = store
            .values()
            .filter(|point| filter.is_none_or(|f| f.matches(&point.payload)))
            .map(|point| RetrievedPoint {
                id: point.id.clone(),
                payload: point.payload.clone(),
            })
            .collect();

        // Stable enumeration order for callers and tests.
        results.sort_by(|a, b| a.id.cmp(&b.id));
        results.truncate(limit);

        Ok(results)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().unwrap();
        Ok(collections.get(collection).map_or(0, HashMap::len))
    }

    async fn delete(&self, collection: &str, ids: &[String]) -> Result<()> {
        let mut collections = self.collections.write().unwrap();
        if let Some(store) = collections.get_mut(collection) {
            for id in ids {
                store.remove(id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload_with(category: &str) -> Payload {
        let mut payload = Payload::new();
        payload.insert("category".to_string(), json!(category));
        payload
    }

    #[tokio::test]
    async fn test_memory_vector_store_roundtrip() {
        let store = MemoryVectorStore::new();

        store
            .upsert(
                "chunks",
                vec![
                    Point {
                        id: "s1_0".to_string(),
                        vector: vec![1.0, 0.0, 0.0],
                        payload: payload_with("Math"),
                    },
                    Point {
                        id: "s1_1".to_string(),
                        vector: vec![0.0, 1.0, 0.0],
                        payload: payload_with("Art"),
                    },
                ],
            )
            .await
            .unwrap();

        assert_eq!(store.count("chunks").await.unwrap(), 2);

        let results = store.search("chunks", &[1.0, 0.0, 0.0], None, 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "s1_0");
        assert!(results[0].score > results[1].score);

        let retrieved = store
            .retrieve("chunks", &["s1_1".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(retrieved.len(), 1);
        assert_eq!(retrieved[0].id, "s1_1");
    }

    #[tokio::test]
    async fn test_search_respects_filter() {
        let store = MemoryVectorStore::new();
        store
            .upsert(
                "chunks",
                vec![
                    Point {
                        id: "a".to_string(),
                        vector: vec![1.0, 0.0],
                        payload: payload_with("Math"),
                    },
                    Point {
                        id: "b".to_string(),
                        vector: vec![1.0, 0.0],
                        payload: payload_with("Art"),
                    },
                ],
            )
            .await
            .unwrap();

        let filter = PointFilter::must_match("category", json!("Art"));
        let results = store
            .search("chunks", &[1.0, 0.0], Some(&filter), 10)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "b");
    }

    #[tokio::test]
    async fn test_set_payload_merges() {
        let store = MemoryVectorStore::new();
        let mut payload = payload_with("Math");
        payload.insert("upvotes".to_string(), json!(1));

        store
            .upsert(
                "videos",
                vec![Point {
                    id: "v1".to_string(),
                    vector: vec![0.5, 0.5],
                    payload,
                }],
            )
            .await
            .unwrap();

        let mut patch = Payload::new();
        patch.insert("upvotes".to_string(), json!(2));
        store
            .set_payload("videos", &["v1".to_string()], patch)
            .await
            .unwrap();

        let retrieved = store.retrieve("videos", &["v1".to_string()]).await.unwrap();
        assert_eq!(retrieved[0].payload.get("upvotes"), Some(&json!(2)));
        // Untouched fields survive the merge.
        assert_eq!(retrieved[0].payload.get("category"), Some(&json!("Math")));
    }

    #[tokio::test]
    async fn test_delete_and_scroll() {
        let store = MemoryVectorStore::new();
        store
            .upsert(
                "chunks",
                vec![
                    Point {
                        id: "s1_0".to_string(),
                        vector: vec![1.0],
                        payload: payload_with("Math"),
                    },
                    Point {
                        id: "s1_1".to_string(),
                        vector: vec![1.0],
                        payload: payload_with("Math"),
                    },
                ],
            )
            .await
            .unwrap();

        store.delete("chunks", &["s1_1".to_string()]).await.unwrap();

        let remaining = store.scroll("chunks", None, 100).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "s1_0");
    }
}
