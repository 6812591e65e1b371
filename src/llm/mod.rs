//! Text completion capability for Laer.
//!
//! All answer generation, topic extraction, quiz generation, and grading go
//! through the [`TextModel`] trait. The production implementation drives any
//! provider exposing an OpenAI-compatible chat endpoint; the provider choice
//! is made once at startup from configuration.

use crate::config::{LlmProvider, LlmSettings};
use crate::error::{LaerError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::instrument;

/// Default timeout for LLM and embedding API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

const GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const HUGGINGFACE_API_BASE: &str = "https://router.huggingface.co/v1";

/// Trait for single-prompt text completion.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Complete a prompt and return the model's text response.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Create an OpenAI client with the default timeout.
///
/// Uses a 5-minute timeout to prevent hung API calls from pinning a request.
pub fn create_openai_client() -> Client<OpenAIConfig> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .expect("Failed to create HTTP client");

    Client::with_config(OpenAIConfig::default()).with_http_client(http_client)
}

/// Chat model backed by an OpenAI-compatible endpoint.
pub struct ChatModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatModel {
    /// Build a chat model from settings, selecting the API base and key
    /// source for the configured provider.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let config = match settings.provider {
            LlmProvider::OpenAi => OpenAIConfig::default(),
            LlmProvider::Google => OpenAIConfig::new()
                .with_api_base(GOOGLE_API_BASE)
                .with_api_key(require_env("GOOGLE_API_KEY")?),
            LlmProvider::HuggingFace => OpenAIConfig::new()
                .with_api_base(HUGGINGFACE_API_BASE)
                .with_api_key(require_env("HF_TOKEN")?),
        };

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client: Client::with_config(config).with_http_client(http_client),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| LaerError::Config(format!("{} environment variable is not set", name)))
}

#[async_trait]
impl TextModel for ChatModel {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> =
            vec![ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| LaerError::Llm(e.to_string()))?
                .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| LaerError::Llm(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| LaerError::Llm(format!("Chat completion failed: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| LaerError::Llm("Empty response from LLM".to_string()))?
            .clone();

        Ok(content)
    }
}
