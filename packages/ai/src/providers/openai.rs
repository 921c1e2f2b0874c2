//! `OpenAI`-compatible provider implementation.

use salescraft_models::ChatMessage;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use super::{ChatOptions, LlmProvider, ProviderConfig};
use crate::LlmError;

/// Provider for any `OpenAI`-compatible chat + embeddings server.
///
/// Holds per-process concurrency ceilings: calls beyond the configured
/// in-flight limits wait their turn rather than piling onto the
/// upstream API.
pub struct OpenAiProvider {
    config: ProviderConfig,
    client: reqwest::Client,
    chat_slots: Semaphore,
    embed_slots: Semaphore,
}

impl OpenAiProvider {
    /// Creates a new provider from static configuration.
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        let chat_slots = Semaphore::new(config.max_concurrent_chats.max(1));
        let embed_slots = Semaphore::new(config.max_concurrent_embeds.max(1));
        Self {
            config,
            client: reqwest::Client::new(),
            chat_slots,
            embed_slots,
        }
    }

    /// Maps a non-success HTTP status and body to a typed error.
    fn map_error(status: reqwest::StatusCode, body: &str) -> LlmError {
        let message = serde_json::from_str::<ApiErrorBody>(body).map_or_else(
            |_| format!("HTTP {status}: {body}"),
            |e| e.error.message,
        );

        match status.as_u16() {
            400 => LlmError::InvalidRequest { message },
            401 | 403 => LlmError::Auth { message },
            429 => LlmError::RateLimited { message },
            500..=599 => LlmError::Server { message },
            _ => LlmError::Transient { message },
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Normalizes heterogeneous prompt messages to the wire shape. Bare
/// strings become user turns.
fn normalize(messages: &[ChatMessage]) -> Vec<ApiMessage> {
    messages
        .iter()
        .map(|m| ApiMessage {
            role: m.role().to_string(),
            content: m.content().to_string(),
        })
        .collect()
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, LlmError> {
        let _slot = self.chat_slots.acquire().await.map_err(|_| LlmError::Server {
            message: "chat slots closed".to_string(),
        })?;

        let request = ChatRequest {
            model: &self.config.chat_model,
            messages: normalize(messages),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .timeout(self.config.chat_timeout)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(Self::map_error(status, &body));
        }

        let response: ChatResponse = serde_json::from_str(&body)?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if text.is_empty() {
            return Err(LlmError::Server {
                message: "empty completion in response".to_string(),
            });
        }

        Ok(text)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let _slot = self
            .embed_slots
            .acquire()
            .await
            .map_err(|_| LlmError::Server {
                message: "embedding slots closed".to_string(),
            })?;

        let request = EmbeddingRequest {
            model: &self.config.embed_model,
            input: text,
        };

        let resp = self
            .client
            .post(format!("{}/embeddings", self.config.base_url))
            .timeout(self.config.embed_timeout)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(Self::map_error(status, &body));
        }

        let response: EmbeddingResponse = serde_json::from_str(&body)?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| LlmError::Server {
                message: "no embedding in response".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_plain_strings_to_user_turns() {
        let messages = vec![
            ChatMessage::system("be brief"),
            ChatMessage::Plain("hello".to_string()),
        ];
        let api = normalize(&messages);
        assert_eq!(api[0].role, "system");
        assert_eq!(api[1].role, "user");
        assert_eq!(api[1].content, "hello");
    }

    #[test]
    fn maps_status_codes_to_error_kinds() {
        let err = OpenAiProvider::map_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "{}");
        assert!(matches!(err, LlmError::RateLimited { .. }));

        let err = OpenAiProvider::map_error(reqwest::StatusCode::UNAUTHORIZED, "{}");
        assert!(matches!(err, LlmError::Auth { .. }));

        let err = OpenAiProvider::map_error(reqwest::StatusCode::BAD_REQUEST, "{}");
        assert!(matches!(err, LlmError::InvalidRequest { .. }));

        let err = OpenAiProvider::map_error(reqwest::StatusCode::BAD_GATEWAY, "{}");
        assert!(matches!(err, LlmError::Server { .. }));
    }

    #[test]
    fn prefers_provider_error_message() {
        let body = r#"{"error": {"message": "model not found"}}"#;
        let err = OpenAiProvider::map_error(reqwest::StatusCode::BAD_REQUEST, body);
        assert!(err.to_string().contains("model not found"));
    }
}
