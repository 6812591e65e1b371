//! Laer - Interactive Study Sessions from YouTube Videos
//!
//! A backend that turns a YouTube video into an interactive study session.
//!
//! The name "Laer" comes from the Norwegian word "lære," meaning "learn."
//!
//! # Overview
//!
//! Laer allows a student to:
//! - Start a session from a YouTube URL (the transcript is fetched,
//!   chunked, and indexed for semantic search)
//! - Ask questions and get grounded, AI-generated answers with timestamps
//! - Get a personalized quiz built from the questions they asked
//! - Generate Markdown study notes for the whole video
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `transcript` - YouTube caption fetching and video ID extraction
//! - `chunking` - Splitting transcripts into time-bounded chunks
//! - `embedding` - Embedding generation
//! - `vector_index` - Vector store adapter (chunks + doubts collections)
//! - `llm` - Text completion capability (provider-agnostic)
//! - `qa` - Grounded question answering and topic extraction
//! - `quiz` - Quiz generation, JSON repair, and grading
//! - `notes` - Study note generation
//! - `session` - In-memory session registry
//! - `orchestrator` - Pipeline coordination
//! - `server` - REST API layer
//!
//! # Example
//!
//! ```rust,no_run
//! use laer::config::Settings;
//! use laer::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings).await?;
//!
//!     let created = orchestrator
//!         .create_session("https://youtu.be/dQw4w9WgXcQ")
//!         .await?;
//!     println!("Session {} for video {}", created.session_id, created.video_id);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod notes;
pub mod orchestrator;
pub mod qa;
pub mod quiz;
pub mod server;
pub mod session;
pub mod transcript;
pub mod vector_index;

pub use error::{LaerError, Result};
