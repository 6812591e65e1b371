//! Quiz generation and evaluation.
//!
//! Quizzes are generated by the configured model from retrieved transcript
//! chunks and the student's recorded doubts, parsed with a best-effort JSON
//! repair routine, and graded on submission (exact-match for MCQs,
//! model-judged for short answers).

mod evaluate;
mod generate;
pub mod repair;

pub use evaluate::QuizGrader;
pub use generate::QuizGenerator;

use serde::{Deserialize, Serialize};

/// Question kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    ShortAnswer,
}

/// A quiz question. The correct answer is retained in the session for
/// grading but withheld from API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    #[serde(default)]
    pub question_id: String,
    pub question_text: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub correct_answer: String,
    #[serde(default)]
    pub topic: Option<String>,
}

/// A generated quiz with the weak topics it targets.
#[derive(Debug, Clone)]
pub struct GeneratedQuiz {
    pub questions: Vec<QuizQuestion>,
    pub weak_topics: Vec<String>,
}

/// One submitted answer.
#[derive(Debug, Clone, Deserialize)]
pub struct QuizAnswer {
    pub question_id: String,
    pub answer: String,
}

/// Per-question grading feedback.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionFeedback {
    pub question_id: String,
    pub question_text: String,
    pub is_correct: bool,
    pub user_answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    pub explanation: String,
}

/// Result of grading a submission.
#[derive(Debug, Clone, Serialize)]
pub struct QuizResult {
    pub score: f64,
    pub total_questions: usize,
    pub correct_answers: usize,
    pub feedback: Vec<QuestionFeedback>,
}
