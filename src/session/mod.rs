//! In-memory study sessions.
//!
//! Sessions are ephemeral per-process state: they pair a session ID with a
//! video and hold the most recent generated quiz between the generate and
//! submit calls. The store is a trait so the orchestrator can be wired with
//! a different backing later without touching its call sites.

use crate::error::{LaerError, Result};
use crate::quiz::QuizQuestion;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// A study session bound to one video.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: Uuid,
    pub video_id: String,
    pub created_at: DateTime<Utc>,
    /// Questions of the most recently generated quiz, with correct answers.
    /// Replaced wholesale on regeneration.
    pub quiz_questions: Option<Vec<QuizQuestion>>,
}

impl Session {
    pub fn new(video_id: String) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            video_id,
            created_at: Utc::now(),
            quiz_questions: None,
        }
    }
}

/// Session storage.
///
/// Concurrent quiz generations for the same session last-write-win on the
/// stored questions; a submission always grades against whichever quiz is
/// stored when it runs.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: Uuid) -> Result<Session>;
    async fn put(&self, session: Session) -> Result<()>;
    async fn set_quiz(&self, session_id: Uuid, questions: Vec<QuizQuestion>) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

/// Process-local session store.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session_id: Uuid) -> Result<Session> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| LaerError::Config("session store lock poisoned".to_string()))?;
        sessions
            .get(&session_id)
            .cloned()
            .ok_or_else(|| LaerError::SessionNotFound(session_id.to_string()))
    }

    async fn put(&self, session: Session) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| LaerError::Config("session store lock poisoned".to_string()))?;
        sessions.insert(session.session_id, session);
        Ok(())
    }

    async fn set_quiz(&self, session_id: Uuid, questions: Vec<QuizQuestion>) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| LaerError::Config("session store lock poisoned".to_string()))?;
        let session = sessions
            .get_mut(&session_id)
            .ok_or_else(|| LaerError::SessionNotFound(session_id.to_string()))?;
        session.quiz_questions = Some(questions);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| LaerError::Config("session store lock poisoned".to_string()))?;
        sessions.clear();
        Ok(())
    }
}
