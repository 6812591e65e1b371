//! HTTP API server.
//!
//! REST endpoints for study sessions: creation, grounded QA, quiz
//! generation and submission, study notes, and a gated index reset. All
//! state lives in the shared [`Orchestrator`].

use crate::cli::Output;
use crate::config::Settings;
use crate::error::LaerError;
use crate::orchestrator::Orchestrator;
use crate::quiz::{QuestionType, QuizAnswer, QuizQuestion};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(settings).await?;

    let state = Arc::new(AppState { orchestrator });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state).layer(cors);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Laer API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Create Session", "POST   /api/v1/sessions");
    Output::kv("Ask Question", "POST   /api/v1/sessions/:id/questions");
    Output::kv("Generate Quiz", "GET    /api/v1/sessions/:id/quiz");
    Output::kv("Submit Quiz", "POST   /api/v1/sessions/:id/quiz/submit");
    Output::kv("Study Notes", "GET    /api/v1/sessions/:id/notes");
    Output::kv("Reset Store", "DELETE /api/v1/admin/reset-vectorstore");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{session_id}/questions", post(ask_question))
        .route("/sessions/{session_id}/quiz", get(generate_quiz))
        .route("/sessions/{session_id}/quiz/submit", post(submit_quiz))
        .route("/sessions/{session_id}/notes", get(get_notes))
        .route("/admin/reset-vectorstore", delete(reset_vectorstore));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct CreateSessionRequest {
    youtube_url: String,
}

#[derive(Serialize)]
struct CreateSessionResponse {
    session_id: String,
    video_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_seconds: Option<u32>,
    transcript_loaded: bool,
}

#[derive(Deserialize)]
struct QuestionRequest {
    question: String,
    #[serde(default)]
    timestamp_sec: Option<u32>,
}

#[derive(Serialize)]
struct QuestionResponse {
    answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    relevant_timestamp: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<f32>,
}

#[derive(Deserialize)]
struct QuizParams {
    num_questions: Option<usize>,
}

#[derive(Serialize)]
struct QuizResponse {
    session_id: String,
    video_id: String,
    questions: Vec<QuestionInfo>,
    total_questions: usize,
    weak_topics: Vec<String>,
}

/// A question as exposed to the client. Correct answers stay server-side
/// until submission.
#[derive(Serialize)]
struct QuestionInfo {
    question_id: String,
    question_text: String,
    question_type: QuestionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic: Option<String>,
}

impl From<QuizQuestion> for QuestionInfo {
    fn from(q: QuizQuestion) -> Self {
        Self {
            question_id: q.question_id,
            question_text: q.question_text,
            question_type: q.question_type,
            options: q.options,
            topic: q.topic,
        }
    }
}

#[derive(Deserialize)]
struct SubmitQuizRequest {
    answers: Vec<QuizAnswer>,
}

#[derive(Serialize)]
struct NotesResponse {
    session_id: String,
    video_id: String,
    note_content: String,
}

#[derive(Deserialize)]
struct ResetParams {
    confirm: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map domain errors onto HTTP statuses: client mistakes are 4xx, upstream
/// dependency failures are 502, the rest is 500.
fn map_error(error: LaerError) -> ApiError {
    let status = match &error {
        LaerError::InvalidInput(_) | LaerError::QuizNotReady => StatusCode::BAD_REQUEST,
        LaerError::SessionNotFound(_)
        | LaerError::NoRelevantContext
        | LaerError::Captions(_) => StatusCode::NOT_FOUND,
        LaerError::Embedding(_)
        | LaerError::VectorStore(_)
        | LaerError::Llm(_)
        | LaerError::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .orchestrator
        .create_session(&req.youtube_url)
        .await
        .map_err(map_error)?;

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: created.session_id.to_string(),
            video_id: created.video_id,
            duration_seconds: created.video_duration_sec,
            transcript_loaded: created.transcript_loaded,
        }),
    ))
}

async fn ask_question(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<QuestionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.question.trim().is_empty() {
        return Err(map_error(LaerError::InvalidInput(
            "Question must not be empty".to_string(),
        )));
    }

    let answered = state
        .orchestrator
        .answer_question(session_id, &req.question, req.timestamp_sec)
        .await
        .map_err(map_error)?;

    Ok(Json(QuestionResponse {
        answer: answered.answer,
        relevant_timestamp: answered.relevant_timestamp_sec,
        confidence: answered.confidence,
    }))
}

async fn generate_quiz(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Query(params): Query<QuizParams>,
) -> Result<impl IntoResponse, ApiError> {
    let num_questions = params
        .num_questions
        .unwrap_or_else(|| state.orchestrator.default_quiz_questions());

    let quiz = state
        .orchestrator
        .generate_quiz(session_id, num_questions)
        .await
        .map_err(map_error)?;

    let questions: Vec<QuestionInfo> =
        quiz.questions.into_iter().map(QuestionInfo::from).collect();
    Ok(Json(QuizResponse {
        session_id: session_id.to_string(),
        video_id: quiz.video_id,
        total_questions: questions.len(),
        questions,
        weak_topics: quiz.weak_topics,
    }))
}

async fn submit_quiz(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .orchestrator
        .submit_quiz(session_id, &req.answers)
        .await
        .map_err(map_error)?;

    Ok(Json(result))
}

async fn get_notes(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let notes = state
        .orchestrator
        .generate_notes(session_id)
        .await
        .map_err(map_error)?;

    Ok(Json(NotesResponse {
        session_id: session_id.to_string(),
        video_id: notes.video_id,
        note_content: notes.content,
    }))
}

async fn reset_vectorstore(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResetParams>,
) -> Result<impl IntoResponse, ApiError> {
    // Destructive; require an explicit confirmation parameter.
    if params.confirm.as_deref() != Some("yes") {
        return Err(map_error(LaerError::InvalidInput(
            "Pass confirm=yes to reset the vector store".to_string(),
        )));
    }

    state.orchestrator.reset().await.map_err(map_error)?;

    Ok(Json(serde_json::json!({ "status": "reset" })))
}
