mod anthropic;
mod openai;
pub mod types;

use std::future::Future;
use std::pin::Pin;

use reflectgate_common::config::LlmRoleConfig;

pub use types::{Completion, CompletionRequest, StopReason, TokenUsage};

/// LLM API client with provider dispatch. One HTTP attempt per call;
/// timeout and retry are applied by `provider::call_with_policy`.
pub struct LlmClient {
    http: reqwest::Client,
    config: LlmRoleConfig,
    api_key: String,
}

/// Errors from LLM API calls.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM HTTP error: {0}")]
    Http(String),

    #[error("LLM auth error: {0}")]
    Auth(String),

    #[error("LLM rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("LLM context window exceeded: {0}")]
    ContextWindowExceeded(String),

    #[error("LLM API error: {0}")]
    Api(String),

    #[error("LLM response parse error: {0}")]
    Parse(String),
}

impl LlmError {
    /// Whether this error should not be retried.
    pub fn is_non_retryable(&self) -> bool {
        matches!(self, LlmError::Auth(_) | LlmError::ContextWindowExceeded(_))
    }
}

impl From<LlmError> for reflectgate_common::GateError {
    fn from(e: LlmError) -> Self {
        reflectgate_common::GateError::Provider(e.to_string())
    }
}

impl LlmClient {
    /// Create a new LLM client.
    /// Reads the API key from the appropriate env var based on provider.
    /// Returns None if the key is not set.
    pub fn new(config: LlmRoleConfig) -> Option<Self> {
        let env_var = match config.provider.as_str() {
            "anthropic" => "ANTHROPIC_API_KEY",
            "openai" => "OPENAI_API_KEY",
            other => {
                tracing::warn!(provider = other, "Unknown LLM provider");
                return None;
            }
        };

        let api_key = match std::env::var(env_var) {
            Ok(key) if !key.is_empty() => key,
            _ => {
                tracing::warn!(
                    env_var = env_var,
                    provider = config.provider.as_str(),
                    "API key not set, LLM client disabled for this role"
                );
                return None;
            }
        };

        Some(Self {
            http: reqwest::Client::new(),
            config,
            api_key,
        })
    }

    pub fn provider(&self) -> &str {
        &self.config.provider
    }

    /// Single attempt, routed to the provider-specific implementation.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let result = match self.config.provider.as_str() {
            "anthropic" => {
                anthropic::send_messages(
                    &self.http,
                    &self.api_key,
                    &self.config.model,
                    self.config.max_tokens,
                    self.config.temperature,
                    &request.system,
                    &request.prompt,
                )
                .await
            }
            "openai" => {
                openai::send_chat_completion(
                    &self.http,
                    &self.api_key,
                    &self.config.model,
                    self.config.max_tokens,
                    self.config.temperature,
                    &request.system,
                    &request.prompt,
                )
                .await
            }
            other => Err(LlmError::Api(format!("Unknown provider: {}", other))),
        };

        if result.is_err() {
            metrics::counter!("llm.api.errors", "provider" => self.config.provider.clone())
                .increment(1);
        }

        result
    }
}

/// Object-safe trait for the language-model provider (dyn dispatch).
/// Tests provide mock models; production uses LlmClient.
pub trait LanguageModel: Send + Sync {
    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Completion, LlmError>> + Send + 'a>>;
}

impl LanguageModel for LlmClient {
    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Completion, LlmError>> + Send + 'a>> {
        Box::pin(LlmClient::complete(self, request))
    }
}
