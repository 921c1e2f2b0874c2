//! LLM provider abstraction and implementations.
//!
//! One provider ships today: any `OpenAI`-compatible HTTP server. The
//! trait seam keeps the orchestrator and ingestion pipeline independent
//! of the wire format.

pub mod openai;

use std::time::Duration;

use salescraft_models::ChatMessage;

use crate::LlmError;

pub use openai::OpenAiProvider;

/// Generation parameters for a single chat call.
#[derive(Debug, Clone, Copy)]
pub struct ChatOptions {
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            max_tokens: 200,
            temperature: 0.7,
        }
    }
}

/// Static configuration for constructing a provider.
///
/// Built once at startup from the environment and passed through
/// explicitly; providers hold no process-wide state.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Bearer token for the provider.
    pub api_key: String,
    /// Chat completion model id.
    pub chat_model: String,
    /// Embedding model id.
    pub embed_model: String,
    /// Base URL of an `OpenAI`-compatible server.
    pub base_url: String,
    /// Wall-clock ceiling for one chat call.
    pub chat_timeout: Duration,
    /// Wall-clock ceiling for one embedding call.
    pub embed_timeout: Duration,
    /// Ceiling on in-flight chat calls across the process.
    pub max_concurrent_chats: usize,
    /// Ceiling on in-flight embedding calls across the process.
    pub max_concurrent_embeds: usize,
}

impl ProviderConfig {
    /// Creates a config with the default public endpoint, timeouts, and
    /// concurrency ceilings.
    #[must_use]
    pub fn new(api_key: String, chat_model: String, embed_model: String) -> Self {
        Self {
            api_key,
            chat_model,
            embed_model,
            base_url: "https://api.openai.com/v1".to_string(),
            chat_timeout: Duration::from_secs(15),
            embed_timeout: Duration::from_secs(10),
            max_concurrent_chats: 32,
            max_concurrent_embeds: 64,
        }
    }
}

/// Trait for LLM providers.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Sends a chat completion request and returns the generated text.
    ///
    /// Messages may be bare strings (user turns) or explicit
    /// `{role, content}` pairs; the provider normalizes both.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] if the request fails or times out.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, LlmError>;

    /// Embeds a single text into a fixed-dimension vector.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] if the request fails or times out.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError>;
}
