//! Qdrant REST backend.
//!
//! Talks to a Qdrant server over its HTTP API: collection management,
//! keyword payload indexes on the filter fields, point upsert, filtered
//! nearest-neighbor query, and filtered scroll.

use super::{
    Collection, PayloadFilter, PointRecord, ScoredPayload, ScrollOffset, VectorBackend,
};
use crate::config::VectorStoreSettings;
use crate::error::{LaerError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

/// Qdrant-backed vector store.
pub struct QdrantBackend {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    chunks_collection: String,
    doubts_collection: String,
}

impl QdrantBackend {
    pub fn new(settings: &VectorStoreSettings) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: settings.qdrant_url.trim_end_matches('/').to_string(),
            api_key: settings.qdrant_api_key.clone(),
            chunks_collection: settings.chunks_collection.clone(),
            doubts_collection: settings.doubts_collection.clone(),
        })
    }

    fn collection_name(&self, collection: Collection) -> &str {
        match collection {
            Collection::Chunks => &self.chunks_collection,
            Collection::Doubts => &self.doubts_collection,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            builder = builder.header("api-key", key);
        }
        builder
    }

    /// Send a request, mapping non-success responses to a store error with
    /// the server's message folded in.
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Value> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(LaerError::VectorStore(format!(
                "Qdrant returned {}: {}",
                status, body
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| LaerError::VectorStore(format!("unexpected Qdrant response: {}", e)))
    }

    /// Create one collection plus keyword indexes, tolerating "already exists".
    async fn ensure_collection(
        &self,
        name: &str,
        dimensions: usize,
        index_fields: &[&str],
    ) -> Result<()> {
        let create = self
            .request(reqwest::Method::PUT, &format!("/collections/{}", name))
            .json(&json!({
                "vectors": { "size": dimensions, "distance": "Cosine" }
            }));

        if let Err(e) = self.send(create).await {
            if !is_already_exists(&e) {
                return Err(e);
            }
            debug!("Collection {} already exists", name);
        }

        for field in index_fields {
            let index = self
                .request(reqwest::Method::PUT, &format!("/collections/{}/index", name))
                .json(&json!({
                    "field_name": field,
                    "field_schema": "keyword"
                }));

            if let Err(e) = self.send(index).await {
                if !is_already_exists(&e) {
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    fn filter_json(filter: &PayloadFilter) -> Option<Value> {
        if filter.conditions().is_empty() {
            return None;
        }
        let must: Vec<Value> = filter
            .conditions()
            .iter()
            .map(|(key, value)| json!({ "key": key, "match": { "value": value } }))
            .collect();
        Some(json!({ "must": must }))
    }
}

/// Creation races surface as conflict/already-exists responses.
fn is_already_exists(error: &LaerError) -> bool {
    let message = error.to_string().to_lowercase();
    message.contains("already exists") || message.contains("409")
}

#[async_trait]
impl VectorBackend for QdrantBackend {
    #[instrument(skip(self))]
    async fn ensure_collections(&self, dimensions: usize) -> Result<()> {
        let chunks = self.chunks_collection.clone();
        let doubts = self.doubts_collection.clone();
        self.ensure_collection(&chunks, dimensions, &["video_id"]).await?;
        self.ensure_collection(&doubts, dimensions, &["session_id", "video_id"])
            .await
    }

    async fn upsert(&self, collection: Collection, points: Vec<PointRecord>) -> Result<()> {
        let name = self.collection_name(collection).to_string();
        let body: Vec<Value> = points
            .into_iter()
            .map(|p| {
                json!({
                    "id": p.id.to_string(),
                    "vector": p.vector,
                    "payload": p.payload
                })
            })
            .collect();

        let request = self
            .request(
                reqwest::Method::PUT,
                &format!("/collections/{}/points?wait=true", name),
            )
            .json(&json!({ "points": body }));

        self.send(request).await?;
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        vector: &[f32],
        filter: &PayloadFilter,
        limit: usize,
    ) -> Result<Vec<ScoredPayload>> {
        let name = self.collection_name(collection).to_string();
        let mut body = json!({
            "query": vector,
            "limit": limit,
            "with_payload": true
        });
        if let Some(filter_json) = Self::filter_json(filter) {
            body["filter"] = filter_json;
        }

        let request = self
            .request(
                reqwest::Method::POST,
                &format!("/collections/{}/points/query", name),
            )
            .json(&body);

        let response = self.send(request).await?;
        let result: QueryResult = serde_json::from_value(response["result"].clone())
            .map_err(|e| LaerError::VectorStore(format!("unexpected query result: {}", e)))?;

        Ok(result
            .points
            .into_iter()
            .map(|p| ScoredPayload {
                payload: p.payload,
                score: p.score.unwrap_or(0.0),
            })
            .collect())
    }

    async fn scroll(
        &self,
        collection: Collection,
        filter: &PayloadFilter,
        limit: usize,
        offset: Option<ScrollOffset>,
    ) -> Result<(Vec<Value>, Option<ScrollOffset>)> {
        let name = self.collection_name(collection).to_string();
        let mut body = json!({
            "limit": limit,
            "with_payload": true
        });
        if let Some(filter_json) = Self::filter_json(filter) {
            body["filter"] = filter_json;
        }
        if let Some(offset) = offset {
            body["offset"] = offset;
        }

        let request = self
            .request(
                reqwest::Method::POST,
                &format!("/collections/{}/points/scroll", name),
            )
            .json(&body);

        let response = self.send(request).await?;
        let result: ScrollResult = serde_json::from_value(response["result"].clone())
            .map_err(|e| LaerError::VectorStore(format!("unexpected scroll result: {}", e)))?;

        let payloads = result.points.into_iter().map(|p| p.payload).collect();
        let next = match result.next_page_offset {
            Some(Value::Null) | None => None,
            Some(offset) => Some(offset),
        };

        Ok((payloads, next))
    }

    #[instrument(skip(self))]
    async fn reset(&self, dimensions: usize) -> Result<()> {
        for name in [self.chunks_collection.clone(), self.doubts_collection.clone()] {
            let request = self.request(reqwest::Method::DELETE, &format!("/collections/{}", name));
            // Deleting a missing collection is fine; recreate either way.
            if let Err(e) = self.send(request).await {
                debug!("Dropping collection {} failed (may not exist): {}", name, e);
            }
        }

        self.ensure_collections(dimensions).await
    }
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    points: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    #[serde(default)]
    payload: Value,
    #[serde(default)]
    score: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ScrollResult {
    #[serde(default)]
    points: Vec<ScrolledPoint>,
    #[serde(default)]
    next_page_offset: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ScrolledPoint {
    #[serde(default)]
    payload: Value,
}
