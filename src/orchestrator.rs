//! Study session orchestration.
//!
//! Ties the pipeline together: transcript fetch and indexing on session
//! creation, grounded QA with doubt recording, personalized quiz generation
//! and grading, and study note generation. The HTTP layer calls into this
//! and nothing else.

use crate::chunking::chunk_transcript;
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{LaerError, Result};
use crate::llm::{ChatModel, TextModel};
use crate::notes::NotesEngine;
use crate::qa::QaEngine;
use crate::quiz::{QuizGenerator, QuizGrader, QuizQuestion, QuizResult};
use crate::session::{MemorySessionStore, Session, SessionStore};
use crate::transcript::{
    extract_video_id, video_duration, TranscriptFetcher, YoutubeCaptionClient,
};
use crate::vector_index::{Doubt, MemoryBackend, QdrantBackend, VectorBackend, VectorIndex};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Chunks retrieved as grounding context for one question.
const QA_CONTEXT_CHUNKS: usize = 3;

/// Generic retrieval query used when a session has no doubts to anchor
/// quiz context on.
const GENERAL_QUIZ_QUERY: &str = "Summary of key concepts and main topics";

/// Outcome of creating a session.
#[derive(Debug)]
pub struct CreatedSession {
    pub session_id: Uuid,
    pub video_id: String,
    /// Whole seconds; only known when the transcript was fetched this call.
    pub video_duration_sec: Option<u32>,
    pub transcript_loaded: bool,
}

/// Study notes for a session's video.
pub struct GeneratedNotes {
    pub video_id: String,
    pub content: String,
}

/// A generated quiz tagged with the video it covers.
pub struct SessionQuiz {
    pub video_id: String,
    pub questions: Vec<QuizQuestion>,
    pub weak_topics: Vec<String>,
}

/// Outcome of answering a question.
#[derive(Debug)]
pub struct Answered {
    pub answer: String,
    /// Start of the best-matching chunk, whole seconds.
    pub relevant_timestamp_sec: Option<u32>,
    pub confidence: Option<f32>,
}

/// Application-level orchestrator shared across requests.
pub struct Orchestrator {
    fetcher: Arc<dyn TranscriptFetcher>,
    index: Arc<VectorIndex>,
    sessions: Arc<dyn SessionStore>,
    qa: QaEngine,
    quiz_generator: QuizGenerator,
    quiz_grader: QuizGrader,
    notes: NotesEngine,
    settings: Settings,
}

impl Orchestrator {
    /// Wire the full pipeline from settings and initialize the index.
    pub async fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        let backend: Arc<dyn VectorBackend> = match settings.vector_store.provider.as_str() {
            "memory" => Arc::new(MemoryBackend::new()),
            "qdrant" => Arc::new(QdrantBackend::new(&settings.vector_store)?),
            other => {
                return Err(LaerError::Config(format!(
                    "Unknown vector store provider: {}",
                    other
                )))
            }
        };

        let model: Arc<dyn TextModel> = Arc::new(ChatModel::from_settings(&settings.llm)?);

        let fetcher: Arc<dyn TranscriptFetcher> = Arc::new(YoutubeCaptionClient::new(
            Duration::from_secs(settings.transcript.timeout_seconds),
        )?);

        let orchestrator = Self::with_components(
            fetcher,
            Arc::new(VectorIndex::new(embedder, backend)),
            Arc::new(MemorySessionStore::new()),
            model,
            prompts,
            settings,
        );

        orchestrator.index.init().await?;
        Ok(orchestrator)
    }

    /// Assemble from pre-built components. Does not initialize the index.
    pub fn with_components(
        fetcher: Arc<dyn TranscriptFetcher>,
        index: Arc<VectorIndex>,
        sessions: Arc<dyn SessionStore>,
        model: Arc<dyn TextModel>,
        prompts: Prompts,
        settings: Settings,
    ) -> Self {
        Self {
            fetcher,
            index,
            sessions,
            qa: QaEngine::new(model.clone(), prompts.clone()),
            quiz_generator: QuizGenerator::new(model.clone(), prompts.clone()),
            quiz_grader: QuizGrader::new(model.clone(), prompts.clone()),
            notes: NotesEngine::new(model, prompts),
            settings,
        }
    }

    /// Start a study session for a video, indexing its transcript if this
    /// is the first session for that video.
    #[instrument(skip(self, youtube_url))]
    pub async fn create_session(&self, youtube_url: &str) -> Result<CreatedSession> {
        let video_id = extract_video_id(youtube_url)
            .ok_or_else(|| LaerError::InvalidInput("Invalid YouTube URL".to_string()))?;

        let mut duration = None;
        if self.index.chunk_exists(&video_id).await? {
            info!("Transcript for {} already indexed, skipping fetch", video_id);
        } else {
            let segments = self
                .fetcher
                .fetch(&video_id, &self.settings.transcript.languages)
                .await?;
            duration = Some(video_duration(&segments));

            let chunks = chunk_transcript(
                &segments,
                self.settings.chunking.chunk_size,
                self.settings.chunking.chunk_overlap,
            );
            let stored = self.index.upsert_chunks(&video_id, &chunks).await?;
            info!("Indexed {} chunks for video {}", stored, video_id);
        }

        let session = Session::new(video_id.clone());
        let session_id = session.session_id;
        self.sessions.put(session).await?;

        Ok(CreatedSession {
            session_id,
            video_id,
            video_duration_sec: duration,
            transcript_loaded: true,
        })
    }

    /// Answer a question grounded in the session's video, recording the
    /// exchange as a doubt for later personalization.
    #[instrument(skip(self, question))]
    pub async fn answer_question(
        &self,
        session_id: Uuid,
        question: &str,
        timestamp_sec: Option<u32>,
    ) -> Result<Answered> {
        let session = self.sessions.get(session_id).await?;

        let chunks = self
            .index
            .search_chunks(&session.video_id, question, QA_CONTEXT_CHUNKS)
            .await?;
        if chunks.is_empty() {
            return Err(LaerError::NoRelevantContext);
        }

        let answer = self.qa.answer(question, &chunks).await?;
        let topic = self.qa.extract_topic(question, &answer).await;

        let doubt = Doubt {
            session_id: session_id.to_string(),
            video_id: session.video_id.clone(),
            question: question.to_string(),
            answer: answer.clone(),
            timestamp_sec,
            topic,
            created_at: Utc::now(),
        };
        self.index.store_doubt(&doubt).await?;

        let best = &chunks[0];
        Ok(Answered {
            relevant_timestamp_sec: Some(best.start_seconds as u32),
            confidence: Some(best.score),
            answer,
        })
    }

    /// Generate a quiz for the session and store it for later grading.
    #[instrument(skip(self))]
    pub async fn generate_quiz(
        &self,
        session_id: Uuid,
        num_questions: usize,
    ) -> Result<SessionQuiz> {
        let session = self.sessions.get(session_id).await?;
        let doubts = self.index.session_doubts(&session_id.to_string()).await?;

        // Without doubts, retrieve broadly; with doubts, anchor retrieval
        // on the first recorded question.
        let (query, top_k) = match doubts.first() {
            None => (GENERAL_QUIZ_QUERY.to_string(), num_questions.saturating_mul(2)),
            Some(doubt) => (doubt.question.clone(), self.settings.quiz.context_chunks),
        };
        let chunks = self
            .index
            .search_chunks(&session.video_id, &query, top_k)
            .await?;

        let quiz = self
            .quiz_generator
            .generate(&doubts, &chunks, num_questions)
            .await;

        self.sessions
            .set_quiz(session_id, quiz.questions.clone())
            .await?;

        Ok(SessionQuiz {
            video_id: session.video_id,
            questions: quiz.questions,
            weak_topics: quiz.weak_topics,
        })
    }

    /// Grade a submission against the session's stored quiz.
    #[instrument(skip(self, answers))]
    pub async fn submit_quiz(
        &self,
        session_id: Uuid,
        answers: &[crate::quiz::QuizAnswer],
    ) -> Result<QuizResult> {
        let session = self.sessions.get(session_id).await?;
        let questions = session.quiz_questions.ok_or(LaerError::QuizNotReady)?;

        Ok(self.quiz_grader.evaluate(&questions, answers).await)
    }

    /// Generate study notes from the full transcript and session doubts.
    #[instrument(skip(self))]
    pub async fn generate_notes(&self, session_id: Uuid) -> Result<GeneratedNotes> {
        let session = self.sessions.get(session_id).await?;

        let chunks = self.index.all_chunks(&session.video_id).await?;
        let doubts = self.index.session_doubts(&session_id.to_string()).await?;

        let content = self.notes.generate(&chunks, &doubts).await?;
        Ok(GeneratedNotes {
            video_id: session.video_id,
            content,
        })
    }

    /// Wipe both vector collections and all sessions.
    #[instrument(skip(self))]
    pub async fn reset(&self) -> Result<()> {
        self.index.reset().await?;
        self.sessions.clear().await
    }

    pub fn default_quiz_questions(&self) -> usize {
        self.settings.quiz.default_questions
    }
}
