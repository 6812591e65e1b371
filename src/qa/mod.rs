//! Grounded question answering.
//!
//! Builds a grounding prompt from retrieved transcript chunks and asks the
//! configured model for a tutor-style answer, plus a short topic label used
//! later for quiz personalization.

use crate::config::Prompts;
use crate::error::Result;
use crate::llm::TextModel;
use crate::vector_index::RetrievedChunk;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Question-answering engine.
pub struct QaEngine {
    model: Arc<dyn TextModel>,
    prompts: Prompts,
}

impl QaEngine {
    pub fn new(model: Arc<dyn TextModel>, prompts: Prompts) -> Self {
        Self { model, prompts }
    }

    /// Generate an answer grounded in the retrieved chunks.
    ///
    /// Conversational tone, redirects for off-topic questions, and the
    /// "not covered in this video" phrasing are all directives delegated to
    /// the model through the prompt template.
    #[instrument(skip(self, context_chunks), fields(chunks = context_chunks.len()))]
    pub async fn answer(&self, question: &str, context_chunks: &[RetrievedChunk]) -> Result<String> {
        let context = format_context(context_chunks);

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context);
        vars.insert("question".to_string(), question.to_string());

        let prompt = Prompts::render(&self.prompts.qa.answer, &vars);
        let answer = self.model.complete(&prompt).await?;

        debug!("Generated answer from {} context chunks", context_chunks.len());
        Ok(answer.trim().to_string())
    }

    /// Extract a short (2-4 word) topic label for a Q&A exchange.
    ///
    /// Best effort: any model failure yields `None` and never blocks QA.
    #[instrument(skip(self, question, answer))]
    pub async fn extract_topic(&self, question: &str, answer: &str) -> Option<String> {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("answer".to_string(), answer.to_string());

        let prompt = Prompts::render(&self.prompts.qa.topic, &vars);

        match self.model.complete(&prompt).await {
            Ok(topic) => {
                let topic = topic.trim().to_string();
                if topic.is_empty() {
                    None
                } else {
                    Some(topic)
                }
            }
            Err(e) => {
                warn!("Topic extraction failed: {}", e);
                None
            }
        }
    }
}

/// Format retrieved chunks for the grounding prompt, each prefixed with its
/// time range.
fn format_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| {
            format!(
                "[{:.0}s - {:.0}s]\n{}",
                chunk.start_seconds, chunk.end_seconds, chunk.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedModel;

    fn chunk(text: &str, start: f64, end: f64) -> RetrievedChunk {
        RetrievedChunk {
            text: text.to_string(),
            start_seconds: start,
            end_seconds: end,
            score: 0.9,
        }
    }

    #[test]
    fn test_format_context_includes_time_ranges() {
        let chunks = vec![chunk("intro to recursion", 0.0, 42.4), chunk("base cases", 42.4, 90.0)];
        let context = format_context(&chunks);

        assert!(context.contains("[0s - 42s]\nintro to recursion"));
        assert!(context.contains("[42s - 90s]\nbase cases"));
    }

    #[tokio::test]
    async fn test_answer_renders_question_into_prompt() {
        let model = Arc::new(ScriptedModel::replying("A function calling itself."));
        let engine = QaEngine::new(model.clone(), Prompts::default());

        let answer = engine
            .answer("What is recursion?", &[chunk("recursion is...", 0.0, 10.0)])
            .await
            .unwrap();

        assert_eq!(answer, "A function calling itself.");
        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("What is recursion?"));
        assert!(prompts[0].contains("recursion is..."));
    }

    #[tokio::test]
    async fn test_topic_extraction_failure_yields_none() {
        let model = Arc::new(ScriptedModel::failing());
        let engine = QaEngine::new(model, Prompts::default());

        let topic = engine.extract_topic("q", "a").await;
        assert!(topic.is_none());
    }

    #[tokio::test]
    async fn test_topic_is_trimmed() {
        let model = Arc::new(ScriptedModel::replying("  tail recursion \n"));
        let engine = QaEngine::new(model, Prompts::default());

        let topic = engine.extract_topic("q", "a").await;
        assert_eq!(topic, Some("tail recursion".to_string()));
    }
}
