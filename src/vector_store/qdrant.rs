//! Qdrant vector store implementation.
//!
//! Talks to a hosted or local Qdrant instance over gRPC. Collections are
//! created lazily with cosine distance, matching how the chunk and session
//! collections are queried.

use super::{Payload, Point, PointFilter, RetrievedPoint, ScoredPoint, VectorStore};
use crate::error::{FinnaError, Result};
use async_trait::async_trait;
use qdrant_client::qdrant::{
    condition::ConditionOneOf, point_id::PointIdOptions, r#match::MatchValue, value::Kind,
    Condition, CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance,
    FieldCondition, Filter, GetPointsBuilder, Match, PointId, PointStruct, PointsIdsList,
    ScrollPointsBuilder, SearchPointsBuilder, SetPayloadPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use qdrant_client::{Payload as QdrantPayload, Qdrant};

/// Qdrant-backed vector store.
pub struct QdrantVectorStore {
    client: Qdrant,
}

impl QdrantVectorStore {
    /// Connect to a Qdrant instance.
    ///
    /// `url` should point at the gRPC port (e.g. "http://localhost:6334").
    pub fn connect(url: &str, api_key: Option<&str>) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .api_key(api_key.map(str::to_string))
            .build()
            .map_err(|e| FinnaError::VectorStore(format!("Qdrant connection error: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn ensure_collection(&self, collection: &str, dimensions: usize) -> Result<()> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| FinnaError::VectorStore(format!("Qdrant list collections error: {}", e)))?;

        let exists = collections.collections.iter().any(|c| c.name == collection);
        if exists {
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(collection)
                    .vectors_config(VectorParamsBuilder::new(dimensions as u64, Distance::Cosine)),
            )
            .await
            .map_err(|e| FinnaError::VectorStore(format!("Qdrant create collection error: {}", e)))?;

        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<Point>) -> Result<()> {
        let qdrant_points: Vec<PointStruct> = points
            .into_iter()
            .map(|point| {
                let payload = to_qdrant_payload(point.payload)?;
                Ok(PointStruct::new(point.id, point.vector, payload))
            })
            .collect::<Result<_>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, qdrant_points).wait(true))
            .await
            .map_err(|e| FinnaError::VectorStore(format!("Qdrant upsert error: {}", e)))?;

        Ok(())
    }

    async fn retrieve(&self, collection: &str, ids: &[String]) -> Result<Vec<RetrievedPoint>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let point_ids: Vec<PointId> = ids.iter().map(|id| id.clone().into()).collect();
        let response = self
            .client
            .get_points(
                GetPointsBuilder::new(collection, point_ids)
                    .with_payload(true)
                    .with_vectors(false),
            )
            .await
            .map_err(|e| FinnaError::VectorStore(format!("Qdrant get error: {}", e)))?;

        Ok(response
            .result
            .into_iter()
            .filter_map(|point| {
                Some(RetrievedPoint {
                    id: point_id_string(point.id.as_ref())?,
                    payload: to_json_payload(point.payload),
                })
            })
            .collect())
    }

    async fn set_payload(&self, collection: &str, ids: &[String], payload: Payload) -> Result<()> {
        let point_ids: Vec<PointId> = ids.iter().map(|id| id.clone().into()).collect();

        self.client
            .set_payload(
                SetPayloadPointsBuilder::new(collection, to_qdrant_payload(payload)?)
                    .points_selector(PointsIdsList { ids: point_ids })
                    .wait(true),
            )
            .await
            .map_err(|e| FinnaError::VectorStore(format!("Qdrant set payload error: {}", e)))?;

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        filter: Option<&PointFilter>,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>> {
        let mut request =
            SearchPointsBuilder::new(collection, vector.to_vec(), limit as u64).with_payload(true);
        if let Some(filter) = filter {
            request = request.filter(to_qdrant_filter(filter));
        }

        let response = self
            .client
            .search_points(request)
            .await
            .map_err(|e| FinnaError::VectorStore(format!("Qdrant search error: {}", e)))?;

        Ok(response
            .result
            .into_iter()
            .filter_map(|point| {
                Some(ScoredPoint {
                    id: point_id_string(point.id.as_ref())?,
                    score: point.score,
                    payload: to_json_payload(point.payload),
                })
            })
            .collect())
    }

    async fn scroll(
        &self,
        collection: &str,
        filter: Option<&PointFilter>,
        limit: usize,
    ) -> Result<Vec<RetrievedPoint>> {
        let mut request = ScrollPointsBuilder::new(collection)
            .limit(limit.min(u32::MAX as usize) as u32)
            .with_payload(true)
            .with_vectors(false);
        if let Some(filter) = filter {
            request = request.filter(to_qdrant_filter(filter));
        }

        let response = self
            .client
            .scroll(request)
            .await
            .map_err(|e| FinnaError::VectorStore(format!("Qdrant scroll error: {}", e)))?;

        Ok(response
            .result
            .into_iter()
            .filter_map(|point| {
                Some(RetrievedPoint {
                    id: point_id_string(point.id.as_ref())?,
                    payload: to_json_payload(point.payload),
                })
            })
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let response = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await
            .map_err(|e| FinnaError::VectorStore(format!("Qdrant count error: {}", e)))?;

        Ok(response.result.map_or(0, |r| r.count as usize))
    }

    async fn delete(&self, collection: &str, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let point_ids: Vec<PointId> = ids.iter().map(|id| id.clone().into()).collect();
        self.client
            .delete_points(
                DeletePointsBuilder::new(collection)
                    .points(PointsIdsList { ids: point_ids })
                    .wait(true),
            )
            .await
            .map_err(|e| FinnaError::VectorStore(format!("Qdrant delete error: {}", e)))?;

        Ok(())
    }
}

fn to_qdrant_payload(payload: Payload) -> Result<QdrantPayload> {
    QdrantPayload::try_from(serde_json::Value::Object(payload))
        .map_err(|e| FinnaError::VectorStore(format!("Payload conversion error: {}", e)))
}

fn to_json_payload(
    payload: std::collections::HashMap<String, qdrant_client::qdrant::Value>,
) -> Payload {
    payload
        .into_iter()
        .map(|(key, value)| (key, qdrant_value_to_json(&value)))
        .collect()
}

fn qdrant_value_to_json(value: &qdrant_client::qdrant::Value) -> serde_json::Value {
    match &value.kind {
        Some(Kind::NullValue(_)) | None => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(*b),
        Some(Kind::IntegerValue(i)) => serde_json::Value::Number((*i).into()),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(*d)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Some(Kind::StringValue(s)) => serde_json::Value::String(s.clone()),
        Some(Kind::ListValue(list)) => {
            serde_json::Value::Array(list.values.iter().map(qdrant_value_to_json).collect())
        }
        Some(Kind::StructValue(obj)) => serde_json::Value::Object(
            obj.fields
                .iter()
                .map(|(k, v)| (k.clone(), qdrant_value_to_json(v)))
                .collect(),
        ),
    }
}

fn point_id_string(id: Option<&PointId>) -> Option<String> {
    match id?.point_id_options.as_ref()? {
        PointIdOptions::Uuid(s) => Some(s.clone()),
        PointIdOptions::Num(n) => Some(n.to_string()),
    }
}

fn to_qdrant_filter(filter: &PointFilter) -> Filter {
    let must: Vec<Condition> = filter
        .must
        .iter()
        .filter_map(|cond| {
            let match_value = match &cond.value {
                serde_json::Value::String(s) => MatchValue::Keyword(s.clone()),
                serde_json::Value::Number(n) => MatchValue::Integer(n.as_i64()?),
                serde_json::Value::Bool(b) => MatchValue::Boolean(*b),
                _ => return None,
            };

            Some(Condition {
                condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
                    key: cond.key.clone(),
                    r#match: Some(Match {
                        match_value: Some(match_value),
                    }),
                    ..Default::default()
                })),
            })
        })
        .collect();

    Filter {
        must,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_conversion_keyword() {
        let filter = PointFilter::must_match("category", json!("Math"));
        let qdrant_filter = to_qdrant_filter(&filter);
        assert_eq!(qdrant_filter.must.len(), 1);

        let Some(ConditionOneOf::Field(field)) = &qdrant_filter.must[0].condition_one_of else {
            panic!("expected field condition");
        };
        assert_eq!(field.key, "category");
        assert_eq!(
            field.r#match.as_ref().unwrap().match_value,
            Some(MatchValue::Keyword("Math".to_string()))
        );
    }

    #[test]
    fn test_filter_conversion_skips_unsupported_values() {
        let filter = PointFilter::must_match("tags", json!(["a", "b"]));
        assert!(to_qdrant_filter(&filter).must.is_empty());
    }

    #[test]
    fn test_qdrant_value_roundtrip_shapes() {
        let value = qdrant_client::qdrant::Value {
            kind: Some(Kind::StringValue("hello".to_string())),
        };
        assert_eq!(qdrant_value_to_json(&value), json!("hello"));

        let value = qdrant_client::qdrant::Value {
            kind: Some(Kind::IntegerValue(42)),
        };
        assert_eq!(qdrant_value_to_json(&value), json!(42));

        let value = qdrant_client::qdrant::Value { kind: None };
        assert_eq!(qdrant_value_to_json(&value), serde_json::Value::Null);
    }
}
