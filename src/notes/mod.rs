//! Study note generation.
//!
//! Produces structured Markdown notes from the full indexed transcript,
//! with a weak-areas review section when the session has recorded doubts.

use crate::chunking::Chunk;
use crate::config::Prompts;
use crate::error::Result;
use crate::llm::TextModel;
use crate::vector_index::Doubt;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Notes engine.
pub struct NotesEngine {
    model: Arc<dyn TextModel>,
    prompts: Prompts,
}

impl NotesEngine {
    pub fn new(model: Arc<dyn TextModel>, prompts: Prompts) -> Self {
        Self { model, prompts }
    }

    /// Generate Markdown study notes for a video.
    ///
    /// The weak-areas section is rendered into the prompt only when doubts
    /// exist. Model failures propagate; notes have no degraded fallback.
    #[instrument(skip(self, chunks, doubts), fields(chunks = chunks.len(), doubts = doubts.len()))]
    pub async fn generate(&self, chunks: &[Chunk], doubts: &[Doubt]) -> Result<String> {
        let transcript = chunks
            .iter()
            .map(|chunk| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let weak_areas = if doubts.is_empty() {
            String::new()
        } else {
            let doubt_lines = doubts
                .iter()
                .map(|doubt| format!("- {}", doubt.question))
                .collect::<Vec<_>>()
                .join("\n");

            let mut vars = HashMap::new();
            vars.insert("doubts".to_string(), doubt_lines);
            Prompts::render(&self.prompts.notes.weak_areas, &vars)
        };

        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), transcript);
        vars.insert("weak_areas".to_string(), weak_areas);

        let prompt = Prompts::render(&self.prompts.notes.notes, &vars);
        let notes = self.model.complete(&prompt).await?;

        info!("Generated study notes from {} chunks", chunks.len());
        Ok(strip_markdown_fences(&notes).to_string())
    }
}

/// Models sometimes wrap the whole document in a code fence despite being
/// told not to.
fn strip_markdown_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```markdown")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedModel;
    use chrono::Utc;

    fn chunk(index: usize, text: &str) -> Chunk {
        Chunk {
            chunk_index: index,
            text: text.to_string(),
            start_seconds: index as f64 * 10.0,
            end_seconds: (index + 1) as f64 * 10.0,
        }
    }

    fn doubt(question: &str) -> Doubt {
        Doubt {
            session_id: "s1".to_string(),
            video_id: "v1".to_string(),
            question: question.to_string(),
            answer: "an answer".to_string(),
            timestamp_sec: None,
            topic: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_notes_without_doubts_omit_weak_areas() {
        let model = Arc::new(ScriptedModel::replying("# Study Notes\n\ncontent"));
        let engine = NotesEngine::new(model.clone(), Prompts::default());

        let notes = engine
            .generate(&[chunk(0, "intro"), chunk(1, "details")], &[])
            .await
            .unwrap();

        assert_eq!(notes, "# Study Notes\n\ncontent");
        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("intro\ndetails"));
        assert!(!prompts[0].contains("Weak Areas Review"));
    }

    #[tokio::test]
    async fn test_doubts_rendered_into_weak_areas_section() {
        let model = Arc::new(ScriptedModel::replying("notes"));
        let engine = NotesEngine::new(model.clone(), Prompts::default());

        engine
            .generate(&[chunk(0, "content")], &[doubt("what is a base case?")])
            .await
            .unwrap();

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("Weak Areas Review"));
        assert!(prompts[0].contains("- what is a base case?"));
    }

    #[tokio::test]
    async fn test_output_fences_stripped() {
        let model = Arc::new(ScriptedModel::replying(
            "```markdown\n# Study Notes\nbody\n```",
        ));
        let engine = NotesEngine::new(model, Prompts::default());

        let notes = engine.generate(&[chunk(0, "content")], &[]).await.unwrap();
        assert_eq!(notes, "# Study Notes\nbody");
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let engine = NotesEngine::new(Arc::new(ScriptedModel::failing()), Prompts::default());
        assert!(engine.generate(&[chunk(0, "content")], &[]).await.is_err());
    }
}
