//! Configuration management for Laer.

mod prompts;
mod settings;

pub use prompts::{GradingPrompts, NotesPrompts, Prompts, QaPrompts, QuizPrompts};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, LlmProvider, LlmSettings,
    PromptSettings, QuizSettings, ServerSettings, Settings, TranscriptSettings,
    VectorStoreSettings,
};
