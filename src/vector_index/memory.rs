//! In-memory vector backend.
//!
//! Useful for testing and single-process deployments without Qdrant.

use super::{
    cosine_similarity, Collection, PayloadFilter, PointRecord, ScoredPayload, ScrollOffset,
    VectorBackend,
};
use crate::error::{LaerError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory vector backend with insertion-ordered scroll semantics.
pub struct MemoryBackend {
    chunks: RwLock<Vec<PointRecord>>,
    doubts: RwLock<Vec<PointRecord>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(Vec::new()),
            doubts: RwLock::new(Vec::new()),
        }
    }

    fn collection(&self, collection: Collection) -> &RwLock<Vec<PointRecord>> {
        match collection {
            Collection::Chunks => &self.chunks,
            Collection::Doubts => &self.doubts,
        }
    }

    fn read(&self, collection: Collection) -> Result<RwLockReadGuard<'_, Vec<PointRecord>>> {
        self.collection(collection)
            .read()
            .map_err(|_| LaerError::VectorStore("memory backend lock poisoned".to_string()))
    }

    fn write(&self, collection: Collection) -> Result<RwLockWriteGuard<'_, Vec<PointRecord>>> {
        self.collection(collection)
            .write()
            .map_err(|_| LaerError::VectorStore("memory backend lock poisoned".to_string()))
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorBackend for MemoryBackend {
    async fn ensure_collections(&self, _dimensions: usize) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, collection: Collection, points: Vec<PointRecord>) -> Result<()> {
        let mut store = self.write(collection)?;
        store.extend(points);
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        vector: &[f32],
        filter: &PayloadFilter,
        limit: usize,
    ) -> Result<Vec<ScoredPayload>> {
        let store = self.read(collection)?;

        let mut results: Vec<ScoredPayload> = store
            .iter()
            .filter(|point| filter.matches(&point.payload))
            .map(|point| ScoredPayload {
                payload: point.payload.clone(),
                score: cosine_similarity(vector, &point.vector),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);

        Ok(results)
    }

    async fn scroll(
        &self,
        collection: Collection,
        filter: &PayloadFilter,
        limit: usize,
        offset: Option<ScrollOffset>,
    ) -> Result<(Vec<Value>, Option<ScrollOffset>)> {
        let store = self.read(collection)?;

        let start = offset
            .as_ref()
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize;

        let matching: Vec<&PointRecord> = store
            .iter()
            .filter(|point| filter.matches(&point.payload))
            .collect();

        let page: Vec<Value> = matching
            .iter()
            .skip(start)
            .take(limit)
            .map(|point| point.payload.clone())
            .collect();

        let consumed = start + page.len();
        let next = if consumed < matching.len() {
            Some(Value::from(consumed as u64))
        } else {
            None
        };

        Ok((page, next))
    }

    async fn reset(&self, _dimensions: usize) -> Result<()> {
        self.write(Collection::Chunks)?.clear();
        self.write(Collection::Doubts)?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn point(video_id: &str, index: u64, vector: Vec<f32>) -> PointRecord {
        PointRecord {
            id: Uuid::new_v4(),
            vector,
            payload: json!({"video_id": video_id, "chunk_index": index}),
        }
    }

    #[tokio::test]
    async fn test_query_is_filtered_and_ranked() {
        let backend = MemoryBackend::new();
        backend
            .upsert(
                Collection::Chunks,
                vec![
                    point("v1", 0, vec![1.0, 0.0]),
                    point("v1", 1, vec![0.0, 1.0]),
                    point("v2", 0, vec![1.0, 0.0]),
                ],
            )
            .await
            .unwrap();

        let filter = PayloadFilter::new().must("video_id", "v1");
        let results = backend
            .query(Collection::Chunks, &[1.0, 0.0], &filter, 10)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].score > results[1].score);
        assert_eq!(results[0].payload["chunk_index"], 0);
    }

    #[tokio::test]
    async fn test_scroll_pagination() {
        let backend = MemoryBackend::new();
        let points: Vec<PointRecord> = (0..5).map(|i| point("v1", i, vec![1.0])).collect();
        backend.upsert(Collection::Chunks, points).await.unwrap();

        let filter = PayloadFilter::new().must("video_id", "v1");

        let (page1, next) = backend
            .scroll(Collection::Chunks, &filter, 2, None)
            .await
            .unwrap();
        assert_eq!(page1.len(), 2);
        let next = next.expect("more pages");

        let (page2, next) = backend
            .scroll(Collection::Chunks, &filter, 2, Some(next))
            .await
            .unwrap();
        assert_eq!(page2.len(), 2);
        let next = next.expect("one more page");

        let (page3, next) = backend
            .scroll(Collection::Chunks, &filter, 2, Some(next))
            .await
            .unwrap();
        assert_eq!(page3.len(), 1);
        assert!(next.is_none());
    }

    #[tokio::test]
    async fn test_reset_clears_both_collections() {
        let backend = MemoryBackend::new();
        backend
            .upsert(Collection::Chunks, vec![point("v1", 0, vec![1.0])])
            .await
            .unwrap();
        backend
            .upsert(Collection::Doubts, vec![point("v1", 0, vec![1.0])])
            .await
            .unwrap();

        backend.reset(384).await.unwrap();

        let filter = PayloadFilter::new();
        let (chunks, _) = backend
            .scroll(Collection::Chunks, &filter, 10, None)
            .await
            .unwrap();
        let (doubts, _) = backend
            .scroll(Collection::Doubts, &filter, 10, None)
            .await
            .unwrap();
        assert!(chunks.is_empty());
        assert!(doubts.is_empty());
    }
}
