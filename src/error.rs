//! Error types for Laer.

use thiserror::Error;

/// Library-level error type for Laer operations.
#[derive(Error, Debug)]
pub enum LaerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("No quiz found for this session. Generate a quiz first.")]
    QuizNotReady,

    #[error("No relevant content found in video")]
    NoRelevantContext,

    #[error("Could not fetch transcript. Video may not have captions: {0}")]
    Captions(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Laer operations.
pub type Result<T> = std::result::Result<T, LaerError>;
