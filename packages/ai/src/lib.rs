#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! LLM adapter with provider abstraction for chat and embeddings.
//!
//! Supports any `OpenAI`-compatible chat-completions + embeddings server
//! (api.openai.com by default, or a local/self-hosted endpoint via the
//! configured base URL). Callers pass prompt messages as
//! [`salescraft_models::ChatMessage`] values — bare strings or explicit
//! `{role, content}` pairs — and the provider normalizes at the boundary.
//!
//! Every call carries a bounded wall-clock timeout, and failures map to a
//! typed taxonomy so the orchestrator can decide which ones to recover
//! from locally.

pub mod providers;

use std::time::Duration;

use rand::Rng as _;
use thiserror::Error;

pub use providers::{ChatOptions, LlmProvider, OpenAiProvider, ProviderConfig};

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Timeout or transport-level failure; safe to retry.
    #[error("Transient LLM error: {message}")]
    Transient {
        /// Description of what went wrong.
        message: String,
    },

    /// The provider rejected the call for rate limiting (HTTP 429).
    #[error("LLM rate limited: {message}")]
    RateLimited {
        /// Provider-reported detail.
        message: String,
    },

    /// The request itself was malformed (HTTP 400).
    #[error("Invalid LLM request: {message}")]
    InvalidRequest {
        /// Provider-reported detail.
        message: String,
    },

    /// Credentials were rejected (HTTP 401/403).
    #[error("LLM auth error: {message}")]
    Auth {
        /// Provider-reported detail.
        message: String,
    },

    /// The provider failed server-side (HTTP 5xx).
    #[error("LLM server error: {message}")]
    Server {
        /// Provider-reported detail.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("LLM response decode error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Whether a single retry with backoff is worthwhile.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transient { .. } | Self::RateLimited { .. } | Self::Server { .. }
        )
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Transient {
                message: format!("request timed out: {e}"),
            }
        } else {
            Self::Transient {
                message: e.to_string(),
            }
        }
    }
}

/// Base delay before the single adapter-layer retry.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

/// Runs an LLM call and retries it once with jittered backoff when the
/// failure is retryable. Non-retryable errors surface immediately.
///
/// # Errors
///
/// Returns the final [`LlmError`] when both attempts fail.
pub async fn with_retry<T, F, Fut>(operation: F) -> Result<T, LlmError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    match operation().await {
        Ok(value) => Ok(value),
        Err(e) if e.is_retryable() => {
            let jitter = rand::thread_rng().gen_range(0..250);
            let delay = RETRY_BASE_DELAY + Duration::from_millis(jitter);
            log::warn!("LLM call failed ({e}); retrying in {delay:?}");
            tokio::time::sleep(delay).await;
            operation().await
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_and_server_errors_are_retryable() {
        assert!(
            LlmError::Transient {
                message: "t".to_string()
            }
            .is_retryable()
        );
        assert!(
            LlmError::Server {
                message: "s".to_string()
            }
            .is_retryable()
        );
        assert!(
            LlmError::RateLimited {
                message: "r".to_string()
            }
            .is_retryable()
        );
    }

    #[test]
    fn client_errors_are_not_retryable() {
        assert!(
            !LlmError::Auth {
                message: "a".to_string()
            }
            .is_retryable()
        );
        assert!(
            !LlmError::InvalidRequest {
                message: "i".to_string()
            }
            .is_retryable()
        );
    }

    #[tokio::test]
    async fn with_retry_gives_up_after_second_failure() {
        let result: Result<(), LlmError> = with_retry(|| async {
            Err(LlmError::Transient {
                message: "down".to_string(),
            })
        })
        .await;
        assert!(matches!(result, Err(LlmError::Transient { .. })));
    }

    #[tokio::test]
    async fn with_retry_passes_through_success() {
        let result = with_retry(|| async { Ok::<_, LlmError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
