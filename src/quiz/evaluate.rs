//! Quiz grading.

use super::repair::sanitize_and_parse;
use super::{QuestionFeedback, QuestionType, QuizAnswer, QuizQuestion, QuizResult};
use crate::config::Prompts;
use crate::llm::TextModel;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{info, instrument, warn};

/// Quiz grader.
pub struct QuizGrader {
    model: Arc<dyn TextModel>,
    prompts: Prompts,
}

impl QuizGrader {
    pub fn new(model: Arc<dyn TextModel>, prompts: Prompts) -> Self {
        Self { model, prompts }
    }

    /// Grade a submission against the stored questions.
    ///
    /// MCQs compare normalized exact matches. Short answers are judged by
    /// the model, with a keyword-containment fallback if the judge call
    /// fails. Unanswered questions grade as an empty submission.
    #[instrument(skip(self, questions, answers), fields(questions = questions.len()))]
    pub async fn evaluate(&self, questions: &[QuizQuestion], answers: &[QuizAnswer]) -> QuizResult {
        let submitted: HashMap<&str, &str> = answers
            .iter()
            .map(|a| (a.question_id.as_str(), a.answer.as_str()))
            .collect();

        let mut feedback = Vec::with_capacity(questions.len());
        let mut correct_count = 0usize;

        for question in questions {
            let user_answer = submitted
                .get(question.question_id.as_str())
                .copied()
                .unwrap_or("");

            let entry = match question.question_type {
                QuestionType::Mcq => grade_mcq(question, user_answer),
                QuestionType::ShortAnswer => self.grade_short_answer(question, user_answer).await,
            };

            if entry.is_correct {
                correct_count += 1;
            }
            feedback.push(entry);
        }

        let total = questions.len();
        let score = if total == 0 {
            0.0
        } else {
            round2(100.0 * correct_count as f64 / total as f64)
        };

        info!("Graded quiz: {}/{} correct", correct_count, total);
        QuizResult {
            score,
            total_questions: total,
            correct_answers: correct_count,
            feedback,
        }
    }

    /// Ask the model whether a free-text answer demonstrates understanding.
    async fn grade_short_answer(
        &self,
        question: &QuizQuestion,
        user_answer: &str,
    ) -> QuestionFeedback {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.question_text.clone());
        vars.insert("expected".to_string(), question.correct_answer.clone());
        vars.insert("submitted".to_string(), user_answer.to_string());

        let prompt = Prompts::render(&self.prompts.grading.short_answer, &vars);

        let (is_correct, explanation) = match self.model.complete(&prompt).await {
            Ok(response) => {
                let verdict = sanitize_and_parse(&response);
                let is_correct = verdict["is_correct"].as_bool().unwrap_or(false);
                let explanation = verdict["explanation"]
                    .as_str()
                    .unwrap_or("Could not evaluate.")
                    .to_string();
                (is_correct, explanation)
            }
            Err(e) => {
                warn!("Short-answer grading failed, falling back to keywords: {}", e);
                (
                    contains_either_way(&question.correct_answer, user_answer),
                    "Answer evaluated based on keyword matching.".to_string(),
                )
            }
        };

        QuestionFeedback {
            question_id: question.question_id.clone(),
            question_text: question.question_text.clone(),
            is_correct,
            user_answer: user_answer.to_string(),
            correct_answer: None,
            explanation,
        }
    }
}

/// Exact match after normalization; the option letter alone does not match
/// the full option text.
fn grade_mcq(question: &QuizQuestion, user_answer: &str) -> QuestionFeedback {
    let is_correct = normalize(user_answer) == normalize(&question.correct_answer);

    QuestionFeedback {
        question_id: question.question_id.clone(),
        question_text: question.question_text.clone(),
        is_correct,
        user_answer: user_answer.to_string(),
        correct_answer: Some(question.correct_answer.clone()),
        explanation: format!("The correct answer is: {}", question.correct_answer),
    }
}

/// Lowercase, trim, and strip everything but word characters and whitespace.
fn normalize(answer: &str) -> String {
    static PUNCTUATION: OnceLock<Regex> = OnceLock::new();
    let punctuation = PUNCTUATION.get_or_init(|| Regex::new(r"[^\w\s]").unwrap());
    punctuation
        .replace_all(answer, "")
        .trim()
        .to_lowercase()
}

/// True when either answer contains the other, case-insensitively.
fn contains_either_way(expected: &str, submitted: &str) -> bool {
    if expected.is_empty() || submitted.is_empty() {
        return false;
    }
    let expected = expected.to_lowercase();
    let submitted = submitted.to_lowercase();
    expected.contains(&submitted) || submitted.contains(&expected)
}

/// Round to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedModel;

    fn mcq(id: &str, correct: &str) -> QuizQuestion {
        QuizQuestion {
            question_id: id.to_string(),
            question_text: format!("question {}", id),
            question_type: QuestionType::Mcq,
            options: Some(vec!["A".into(), "B".into(), "C".into(), "D".into()]),
            correct_answer: correct.to_string(),
            topic: Some("general".to_string()),
        }
    }

    fn short(id: &str, correct: &str) -> QuizQuestion {
        QuizQuestion {
            question_id: id.to_string(),
            question_text: format!("question {}", id),
            question_type: QuestionType::ShortAnswer,
            options: None,
            correct_answer: correct.to_string(),
            topic: None,
        }
    }

    fn answer(id: &str, text: &str) -> QuizAnswer {
        QuizAnswer {
            question_id: id.to_string(),
            answer: text.to_string(),
        }
    }

    #[test]
    fn test_normalize_strips_punctuation_and_case() {
        assert_eq!(normalize("A."), normalize("a"));
        assert_eq!(normalize("  O(n log n)!  "), "on log n");
        assert_ne!(normalize("A"), normalize("Option A"));
    }

    #[tokio::test]
    async fn test_mcq_exact_match_after_normalization() {
        let grader = QuizGrader::new(Arc::new(ScriptedModel::failing()), Prompts::default());
        let questions = vec![mcq("q1", "A"), mcq("q2", "B")];
        let answers = vec![answer("q1", "a."), answer("q2", "Option B")];

        let result = grader.evaluate(&questions, &answers).await;

        assert!(result.feedback[0].is_correct);
        assert!(!result.feedback[1].is_correct);
        assert_eq!(
            result.feedback[1].explanation,
            "The correct answer is: B"
        );
        assert_eq!(result.feedback[1].correct_answer.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn test_score_rounded_to_two_decimals() {
        let grader = QuizGrader::new(Arc::new(ScriptedModel::failing()), Prompts::default());
        let questions = vec![mcq("q1", "A"), mcq("q2", "B"), mcq("q3", "C")];
        let answers = vec![answer("q1", "A")];

        let result = grader.evaluate(&questions, &answers).await;

        assert_eq!(result.correct_answers, 1);
        assert_eq!(result.total_questions, 3);
        assert_eq!(result.score, 33.33);
    }

    #[tokio::test]
    async fn test_empty_quiz_scores_zero() {
        let grader = QuizGrader::new(Arc::new(ScriptedModel::failing()), Prompts::default());
        let result = grader.evaluate(&[], &[]).await;

        assert_eq!(result.score, 0.0);
        assert_eq!(result.total_questions, 0);
        assert!(result.feedback.is_empty());
    }

    #[tokio::test]
    async fn test_unanswered_question_counts_wrong() {
        let grader = QuizGrader::new(Arc::new(ScriptedModel::failing()), Prompts::default());
        let questions = vec![mcq("q1", "A")];

        let result = grader.evaluate(&questions, &[]).await;

        assert!(!result.feedback[0].is_correct);
        assert_eq!(result.feedback[0].user_answer, "");
    }

    #[tokio::test]
    async fn test_short_answer_judged_by_model() {
        let model = ScriptedModel::new(vec![Ok(
            r#"{"is_correct": true, "explanation": "Captures the core idea."}"#.to_string(),
        )]);
        let grader = QuizGrader::new(Arc::new(model), Prompts::default());
        let questions = vec![short("q1", "a function that calls itself")];
        let answers = vec![answer("q1", "when a function invokes itself")];

        let result = grader.evaluate(&questions, &answers).await;

        assert!(result.feedback[0].is_correct);
        assert_eq!(result.feedback[0].explanation, "Captures the core idea.");
        // Correct answers are never revealed for short-answer feedback.
        assert!(result.feedback[0].correct_answer.is_none());
        assert_eq!(result.score, 100.0);
    }

    #[tokio::test]
    async fn test_short_answer_containment_fallback() {
        let grader = QuizGrader::new(Arc::new(ScriptedModel::failing()), Prompts::default());
        let questions = vec![short("q1", "base case"), short("q2", "memoization")];
        let answers = vec![
            answer("q1", "you need a BASE CASE to stop"),
            answer("q2", "caching"),
        ];

        let result = grader.evaluate(&questions, &answers).await;

        assert!(result.feedback[0].is_correct);
        assert_eq!(
            result.feedback[0].explanation,
            "Answer evaluated based on keyword matching."
        );
        assert!(!result.feedback[1].is_correct);
        assert_eq!(result.score, 50.0);
    }

    #[tokio::test]
    async fn test_unparseable_judge_response_grades_wrong() {
        let model = ScriptedModel::new(vec![Ok("sounds good to me".to_string())]);
        let grader = QuizGrader::new(Arc::new(model), Prompts::default());
        let questions = vec![short("q1", "expected")];
        let answers = vec![answer("q1", "whatever")];

        let result = grader.evaluate(&questions, &answers).await;

        assert!(!result.feedback[0].is_correct);
        assert_eq!(result.feedback[0].explanation, "Could not evaluate.");
    }
}
