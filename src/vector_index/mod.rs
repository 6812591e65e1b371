//! Vector index adapter for Laer.
//!
//! Maintains two logical collections: transcript chunks (filtered by
//! `video_id`) and student doubts (filtered by `session_id` and `video_id`).
//! The [`VectorIndex`] owns embedding and payload mapping; the storage itself
//! sits behind the [`VectorBackend`] trait with an in-memory implementation
//! for tests and a Qdrant REST implementation for production.

mod memory;
mod qdrant;

pub use memory::MemoryBackend;
pub use qdrant::QdrantBackend;

use crate::chunking::Chunk;
use crate::embedding::Embedder;
use crate::error::{LaerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Doubts are fetched as a single page of at most this many records.
/// Sessions with more doubts lose the oldest ones from quiz personalization.
pub const DOUBT_PAGE_LIMIT: usize = 100;

/// Page size for exhaustive chunk pagination.
const SCROLL_PAGE_SIZE: usize = 100;

/// The two logical collections of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Transcript chunks, keyed by `video_id`.
    Chunks,
    /// Student doubts, keyed by `session_id` and `video_id`.
    Doubts,
}

/// A recorded student question with its answer and topic label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doubt {
    pub session_id: String,
    pub video_id: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub timestamp_sec: Option<u32>,
    #[serde(default)]
    pub topic: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A chunk returned from similarity search.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub score: f32,
}

/// A point stored in a collection.
#[derive(Debug, Clone)]
pub struct PointRecord {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: Value,
}

/// A payload with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredPayload {
    pub payload: Value,
    pub score: f32,
}

/// Opaque scroll cursor; backends define its shape.
pub type ScrollOffset = Value;

/// Must-match keyword conditions on payload fields.
#[derive(Debug, Clone, Default)]
pub struct PayloadFilter {
    conditions: Vec<(String, String)>,
}

impl PayloadFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `payload[key] == value`.
    pub fn must(mut self, key: &str, value: &str) -> Self {
        self.conditions.push((key.to_string(), value.to_string()));
        self
    }

    pub fn conditions(&self) -> &[(String, String)] {
        &self.conditions
    }

    /// Whether a payload satisfies every condition.
    pub fn matches(&self, payload: &Value) -> bool {
        self.conditions.iter().all(|(key, value)| {
            payload.get(key).and_then(Value::as_str) == Some(value.as_str())
        })
    }
}

/// Trait for vector storage backends.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Create both collections and their payload indexes if missing.
    /// Creation races (the collection already exists) are non-fatal.
    async fn ensure_collections(&self, dimensions: usize) -> Result<()>;

    /// Store points in a collection.
    async fn upsert(&self, collection: Collection, points: Vec<PointRecord>) -> Result<()>;

    /// Filtered nearest-neighbor search, descending cosine similarity.
    async fn query(
        &self,
        collection: Collection,
        vector: &[f32],
        filter: &PayloadFilter,
        limit: usize,
    ) -> Result<Vec<ScoredPayload>>;

    /// Filtered paged scan. Returns payloads plus the next page cursor,
    /// `None` when exhausted.
    async fn scroll(
        &self,
        collection: Collection,
        filter: &PayloadFilter,
        limit: usize,
        offset: Option<ScrollOffset>,
    ) -> Result<(Vec<Value>, Option<ScrollOffset>)>;

    /// Drop and recreate both collections, destroying all data.
    async fn reset(&self, dimensions: usize) -> Result<()>;
}

/// Embedding-aware adapter over a [`VectorBackend`].
pub struct VectorIndex {
    embedder: Arc<dyn Embedder>,
    backend: Arc<dyn VectorBackend>,
}

impl VectorIndex {
    pub fn new(embedder: Arc<dyn Embedder>, backend: Arc<dyn VectorBackend>) -> Self {
        Self { embedder, backend }
    }

    /// Ensure both collections exist with the embedder's dimensionality.
    pub async fn init(&self) -> Result<()> {
        self.backend
            .ensure_collections(self.embedder.dimensions())
            .await
    }

    /// Check if a video's transcript is already indexed (limit-1 probe).
    #[instrument(skip(self))]
    pub async fn chunk_exists(&self, video_id: &str) -> Result<bool> {
        let filter = PayloadFilter::new().must("video_id", video_id);
        let (page, _) = self
            .backend
            .scroll(Collection::Chunks, &filter, 1, None)
            .await?;
        Ok(!page.is_empty())
    }

    /// Embed and store transcript chunks for a video.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn upsert_chunks(&self, video_id: &str, chunks: &[Chunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let points: Vec<PointRecord> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, vector)| {
                let mut payload = serde_json::to_value(chunk)?;
                payload["video_id"] = Value::String(video_id.to_string());
                Ok(PointRecord {
                    id: Uuid::new_v4(),
                    vector,
                    payload,
                })
            })
            .collect::<Result<_>>()?;

        let count = points.len();
        self.backend.upsert(Collection::Chunks, points).await?;
        Ok(count)
    }

    /// Search a video's chunks for a query, top-k by cosine similarity.
    #[instrument(skip(self, query))]
    pub async fn search_chunks(
        &self,
        video_id: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let query_vector = self.embedder.embed(query).await?;
        let filter = PayloadFilter::new().must("video_id", video_id);

        let scored = self
            .backend
            .query(Collection::Chunks, &query_vector, &filter, top_k)
            .await?;

        scored
            .into_iter()
            .map(|s| {
                let chunk: Chunk = serde_json::from_value(s.payload)?;
                Ok(RetrievedChunk {
                    text: chunk.text,
                    start_seconds: chunk.start_seconds,
                    end_seconds: chunk.end_seconds,
                    score: s.score,
                })
            })
            .collect()
    }

    /// Store a doubt, embedded by its question text.
    #[instrument(skip(self, doubt), fields(session_id = %doubt.session_id))]
    pub async fn store_doubt(&self, doubt: &Doubt) -> Result<()> {
        let vector = self.embedder.embed(&doubt.question).await?;
        let point = PointRecord {
            id: Uuid::new_v4(),
            vector,
            payload: serde_json::to_value(doubt)?,
        };
        self.backend.upsert(Collection::Doubts, vec![point]).await
    }

    /// All doubts recorded for a session, capped at [`DOUBT_PAGE_LIMIT`].
    #[instrument(skip(self))]
    pub async fn session_doubts(&self, session_id: &str) -> Result<Vec<Doubt>> {
        let filter = PayloadFilter::new().must("session_id", session_id);
        let (page, _) = self
            .backend
            .scroll(Collection::Doubts, &filter, DOUBT_PAGE_LIMIT, None)
            .await?;

        page.into_iter()
            .map(|payload| serde_json::from_value(payload).map_err(LaerError::from))
            .collect()
    }

    /// All transcript chunks for a video, exhaustively paginated and sorted
    /// by chunk index so the transcript reads continuously.
    #[instrument(skip(self))]
    pub async fn all_chunks(&self, video_id: &str) -> Result<Vec<Chunk>> {
        let filter = PayloadFilter::new().must("video_id", video_id);
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut offset: Option<ScrollOffset> = None;

        loop {
            let (page, next) = self
                .backend
                .scroll(Collection::Chunks, &filter, SCROLL_PAGE_SIZE, offset)
                .await?;

            for payload in page {
                chunks.push(serde_json::from_value(payload)?);
            }

            match next {
                Some(next_offset) => offset = Some(next_offset),
                None => break,
            }
        }

        chunks.sort_by_key(|c| c.chunk_index);
        Ok(chunks)
    }

    /// Drop and recreate both collections. Irreversible; callers must gate
    /// this behind explicit confirmation.
    #[instrument(skip(self))]
    pub async fn reset(&self) -> Result<()> {
        self.backend.reset(self.embedder.dimensions()).await
    }
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

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_payload_filter_matches() {
        let filter = PayloadFilter::new()
            .must("video_id", "abc123")
            .must("session_id", "s1");

        let hit = serde_json::json!({"video_id": "abc123", "session_id": "s1", "x": 1});
        let miss = serde_json::json!({"video_id": "abc123", "session_id": "s2"});
        let missing = serde_json::json!({"video_id": "abc123"});

        assert!(filter.matches(&hit));
        assert!(!filter.matches(&miss));
        assert!(!filter.matches(&missing));
    }
}
