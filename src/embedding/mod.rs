//! Embedding generation.
//!
//! Transcript chunks and doubt questions are embedded into one vector space
//! so that a question embedded at query time lands near the chunks it should
//! retrieve. The vector width is fixed per deployment and must match the
//! width the index collections were created with; [`Embedder::dimensions`]
//! is the single source of that value.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Text-to-vector capability consumed by the vector index.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one text: a search query or a doubt question.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed chunk texts in bulk for indexing, preserving input order so
    /// vectors line up with their chunks.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Width of the produced vectors; the index creates its collections
    /// with this value.
    fn dimensions(&self) -> usize;
}
