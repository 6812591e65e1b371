//! Personalized quiz generation.

use super::repair::sanitize_and_parse;
use super::{GeneratedQuiz, QuestionType, QuizQuestion};
use crate::config::Prompts;
use crate::llm::TextModel;
use crate::vector_index::{Doubt, RetrievedChunk};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Fallback answers are capped at this many characters of the stored answer.
const FALLBACK_ANSWER_CHARS: usize = 200;

/// Quiz generator.
pub struct QuizGenerator {
    model: Arc<dyn TextModel>,
    prompts: Prompts,
}

impl QuizGenerator {
    pub fn new(model: Arc<dyn TextModel>, prompts: Prompts) -> Self {
        Self { model, prompts }
    }

    /// Generate a quiz of `num_questions` questions.
    ///
    /// With no doubts: general MCQs over the retrieved chunks. With doubts:
    /// the prompt prioritizes the student's weak topics (at least half the
    /// questions, floor for odd counts). Model failures and unsalvageable
    /// JSON degrade to a deterministic fallback quiz, never an error.
    #[instrument(skip(self, doubts, chunks), fields(doubts = doubts.len(), num_questions))]
    pub async fn generate(
        &self,
        doubts: &[Doubt],
        chunks: &[RetrievedChunk],
        num_questions: usize,
    ) -> GeneratedQuiz {
        let weak_topics = weak_topics(doubts);

        let context_text = chunks
            .iter()
            .map(|chunk| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context_text);
        vars.insert("num_questions".to_string(), num_questions.to_string());

        let prompt = if doubts.is_empty() {
            Prompts::render(&self.prompts.quiz.general, &vars)
        } else {
            vars.insert("weak_topics".to_string(), weak_topics.join(", "));
            Prompts::render(&self.prompts.quiz.personalized, &vars)
        };

        let response = match self.model.complete(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Quiz generation failed: {}", e);
                return self.fallback_quiz(doubts, num_questions);
            }
        };

        let parsed = sanitize_and_parse(&response);
        let mut questions: Vec<QuizQuestion> = parsed
            .get("questions")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default();

        if questions.is_empty() {
            warn!("Model response yielded no usable questions, using fallback");
            return self.fallback_quiz(doubts, num_questions);
        }

        // Make sure every question can be referenced at grading time.
        for question in &mut questions {
            if question.question_id.is_empty() {
                question.question_id = Uuid::new_v4().to_string();
            }
        }

        info!("Generated {} quiz questions", questions.len());
        GeneratedQuiz {
            questions,
            weak_topics,
        }
    }

    /// Deterministic quiz when the model path degrades: one short-answer
    /// question per doubt, or a single explanatory placeholder.
    fn fallback_quiz(&self, doubts: &[Doubt], num_questions: usize) -> GeneratedQuiz {
        let questions = if doubts.is_empty() {
            vec![QuizQuestion {
                question_id: Uuid::new_v4().to_string(),
                question_text: "We encountered an error generating the quiz. Please try again."
                    .to_string(),
                question_type: QuestionType::ShortAnswer,
                options: None,
                correct_answer: "N/A".to_string(),
                topic: Some("system".to_string()),
            }]
        } else {
            doubts
                .iter()
                .take(num_questions)
                .map(|doubt| QuizQuestion {
                    question_id: Uuid::new_v4().to_string(),
                    question_text: format!("Explain: {}", doubt.question),
                    question_type: QuestionType::ShortAnswer,
                    options: None,
                    correct_answer: doubt
                        .answer
                        .chars()
                        .take(FALLBACK_ANSWER_CHARS)
                        .collect(),
                    topic: Some(
                        doubt
                            .topic
                            .clone()
                            .unwrap_or_else(|| "general".to_string()),
                    ),
                })
                .collect()
        };

        GeneratedQuiz {
            questions,
            weak_topics: Vec::new(),
        }
    }
}

/// Deduplicated weak-topic labels from a session's doubts, in first-seen
/// order. Doubts without a topic count as "general".
pub fn weak_topics(doubts: &[Doubt]) -> Vec<String> {
    let mut topics: Vec<String> = Vec::new();
    for doubt in doubts {
        let topic = doubt
            .topic
            .clone()
            .unwrap_or_else(|| "general".to_string());
        if !topics.contains(&topic) {
            topics.push(topic);
        }
    }
    topics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedModel;
    use chrono::Utc;

    fn doubt(question: &str, topic: Option<&str>) -> Doubt {
        Doubt {
            session_id: "s1".to_string(),
            video_id: "v1".to_string(),
            question: question.to_string(),
            answer: "a detailed answer ".repeat(20),
            timestamp_sec: None,
            topic: topic.map(|t| t.to_string()),
            created_at: Utc::now(),
        }
    }

    fn chunk(text: &str) -> RetrievedChunk {
        RetrievedChunk {
            text: text.to_string(),
            start_seconds: 0.0,
            end_seconds: 10.0,
            score: 0.8,
        }
    }

    #[test]
    fn test_weak_topics_deduplicated() {
        let doubts = vec![
            doubt("q1", Some("recursion")),
            doubt("q2", Some("recursion")),
            doubt("q3", None),
            doubt("q4", Some("dynamic programming")),
        ];
        assert_eq!(
            weak_topics(&doubts),
            vec!["recursion", "general", "dynamic programming"]
        );
    }

    #[tokio::test]
    async fn test_general_quiz_without_doubts() {
        let response = serde_json::json!({
            "questions": (0..5).map(|i| serde_json::json!({
                "question_id": format!("q{}", i),
                "question_text": format!("question {}", i),
                "question_type": "mcq",
                "options": ["A", "B", "C", "D"],
                "correct_answer": "A",
                "topic": "general"
            })).collect::<Vec<_>>()
        });
        let model = Arc::new(ScriptedModel::replying(&response.to_string()));
        let generator = QuizGenerator::new(model.clone(), Prompts::default());

        let quiz = generator.generate(&[], &[chunk("content")], 5).await;

        assert_eq!(quiz.questions.len(), 5);
        assert!(quiz.weak_topics.is_empty());
        // The general prompt was used.
        let prompts = model.prompts.lock().unwrap();
        assert!(!prompts[0].contains("<WeakTopics>"));
    }

    #[tokio::test]
    async fn test_personalized_quiz_carries_weak_topics() {
        let response = serde_json::json!({
            "questions": [
                {"question_text": "q1", "question_type": "mcq", "options": ["A","B","C","D"],
                 "correct_answer": "A", "topic": "recursion"},
                {"question_text": "q2", "question_type": "mcq", "options": ["A","B","C","D"],
                 "correct_answer": "B", "topic": "recursion"},
                {"question_text": "q3", "question_type": "mcq", "options": ["A","B","C","D"],
                 "correct_answer": "C", "topic": "general"}
            ]
        });
        let model = Arc::new(ScriptedModel::replying(&response.to_string()));
        let generator = QuizGenerator::new(model.clone(), Prompts::default());

        let doubts = vec![doubt("what is recursion?", Some("recursion"))];
        let quiz = generator.generate(&doubts, &[chunk("content")], 3).await;

        assert_eq!(quiz.weak_topics, vec!["recursion"]);
        let weak_count = quiz
            .questions
            .iter()
            .filter(|q| q.topic.as_deref() == Some("recursion"))
            .count();
        assert!(weak_count >= 1);
        // Missing IDs were filled in.
        assert!(quiz.questions.iter().all(|q| !q.question_id.is_empty()));
        // The personalized prompt carried the weak topics.
        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("recursion"));
        assert!(prompts[0].contains("<WeakTopics>"));
    }

    #[tokio::test]
    async fn test_fallback_from_doubts_on_model_failure() {
        let model = Arc::new(ScriptedModel::failing());
        let generator = QuizGenerator::new(model, Prompts::default());

        let doubts = vec![doubt("what is recursion?", Some("recursion")), doubt("why?", None)];
        let quiz = generator.generate(&doubts, &[chunk("content")], 5).await;

        assert_eq!(quiz.questions.len(), 2);
        assert_eq!(quiz.questions[0].question_text, "Explain: what is recursion?");
        assert_eq!(quiz.questions[0].question_type, QuestionType::ShortAnswer);
        assert!(quiz.questions[0].correct_answer.chars().count() <= 200);
        assert!(quiz.weak_topics.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_placeholder_without_doubts() {
        let model = Arc::new(ScriptedModel::replying("not json at all"));
        let generator = QuizGenerator::new(model, Prompts::default());

        let quiz = generator.generate(&[], &[chunk("content")], 5).await;

        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].question_type, QuestionType::ShortAnswer);
        assert_eq!(quiz.questions[0].correct_answer, "N/A");
    }

    #[tokio::test]
    async fn test_truncated_response_salvaged() {
        let truncated = r#"{"questions": [
            {"question_text": "q1", "question_type": "mcq", "options": ["A","B","C","D"],
             "correct_answer": "A", "topic": "general"},
            {"question_text": "q2", "question_type": "mcq", "opti"#;
        let model = Arc::new(ScriptedModel::replying(truncated));
        let generator = QuizGenerator::new(model, Prompts::default());

        let quiz = generator.generate(&[], &[chunk("content")], 5).await;

        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].question_text, "q1");
    }
}
