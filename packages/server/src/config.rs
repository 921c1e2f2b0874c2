//! Environment-driven server configuration.
//!
//! All configuration is read once at startup; nothing process-wide is
//! mutable afterwards. A missing required key is fatal: `run_server`
//! returns the error and the process exits non-zero.

use std::time::Duration;

use salescraft_ai::ProviderConfig;
use salescraft_orchestrator::TurnConfig;
use salescraft_vector::VectorConfig;
use thiserror::Error;

/// Configuration errors; always fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("Missing required environment variable: {name}")]
    Missing {
        /// The variable name.
        name: String,
    },

    /// A variable was present but unparseable.
    #[error("Invalid value for {name}: {value}")]
    Invalid {
        /// The variable name.
        name: String,
        /// The offending value.
        value: String,
    },
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Local development: unverified bearer tokens map to a fixed
    /// caller id.
    Development,
    /// Production: tokens are verified against the identity provider.
    Production,
}

/// Full server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: String,
    /// Bind port.
    pub port: u16,
    /// Deployment environment.
    pub environment: Environment,
    /// `SQLite` database path.
    pub store_path: String,
    /// Vector index connection.
    pub vector: VectorConfig,
    /// LLM provider connection.
    pub llm: ProviderConfig,
    /// Orchestrator tuning.
    pub turn: TurnConfig,
    /// Identity provider verification URL; required in production.
    pub auth_provider_url: Option<String>,
    /// Directory for uploaded images.
    pub upload_dir: String,
    /// Origins allowed on authenticated endpoints.
    pub cors_allowed_origins: Vec<String>,
}

impl ServerConfig {
    /// Reads configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required key is missing or a
    /// value fails to parse. Required: `LLM_API_KEY`, and
    /// `AUTH_PROVIDER_URL` when `ENVIRONMENT=production`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env_or("ENVIRONMENT", "development").to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        };

        let api_key = require("LLM_API_KEY")?;
        let chat_model = env_or("LLM_CHAT_MODEL", "gpt-4o-mini");
        let embed_model = env_or("LLM_EMBED_MODEL", "text-embedding-3-small");

        let mut llm = ProviderConfig::new(api_key, chat_model, embed_model);
        if let Ok(base_url) = std::env::var("AI_BASE_URL") {
            llm.base_url = base_url.trim_end_matches('/').to_string();
        }

        let request_timeout = parse_env("REQUEST_TIMEOUT_SECONDS", 15_u64)?;
        llm.chat_timeout = Duration::from_secs(request_timeout);

        let turn = TurnConfig {
            max_history: parse_env("MAX_CONVERSATION_HISTORY", 4_usize)?,
            lead_qualify_min_messages: parse_env("LEAD_QUALIFY_MIN_MESSAGES", 5_usize)?,
            retrieval_top_k: parse_env("RETRIEVAL_TOP_K", 3_u32)?,
            retrieval_score_floor: parse_env("RETRIEVAL_SCORE_FLOOR", 0.5_f32)?,
            turn_budget: Duration::from_secs(request_timeout),
            chat_options: salescraft_ai::ChatOptions {
                max_tokens: parse_env("LLM_MAX_TOKENS", 200_u32)?,
                temperature: parse_env("LLM_TEMPERATURE", 0.7_f32)?,
            },
            ..TurnConfig::default()
        };

        let vector = VectorConfig {
            base_url: env_or("VECTOR_URL", "http://localhost:6333")
                .trim_end_matches('/')
                .to_string(),
            api_key: std::env::var("VECTOR_API_KEY").ok(),
            collection: env_or("VECTOR_COLLECTION", "salescraft"),
            dim: parse_env("VECTOR_DIM", 1536_u32)?,
        };

        let auth_provider_url = std::env::var("AUTH_PROVIDER_URL").ok();
        if environment == Environment::Production && auth_provider_url.is_none() {
            return Err(ConfigError::Missing {
                name: "AUTH_PROVIDER_URL".to_string(),
            });
        }

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            bind_addr: env_or("BIND_ADDR", "127.0.0.1"),
            port: parse_env("PORT", 8080_u16)?,
            environment,
            store_path: env_or("STORE_URL", "data/salescraft.db"),
            vector,
            llm,
            turn,
            auth_provider_url,
            upload_dir: env_or("UPLOAD_DIR", "data/uploads"),
            cors_allowed_origins,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn require(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing {
        name: name.to_string(),
    })
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            name: name.to_string(),
            value: raw,
        }),
    }
}
