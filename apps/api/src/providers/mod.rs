//! Provider layer: the single point of entry for every embedding and chat
//! completion call the API makes.
//!
//! ARCHITECTURAL RULE: No other module may talk to a model backend directly.
//! Callers depend on the `EmbeddingModel` / `InferenceModel` traits only;
//! `EmbeddingClient` and `InferenceClient` are the concrete implementations,
//! parameterized by a `ProviderKind` row of the provider table.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod embedding;
pub mod inference;
pub mod kind;
pub mod prompts;
mod transport;
mod wire;

pub use embedding::EmbeddingClient;
pub use inference::InferenceClient;
pub use kind::ProviderKind;
pub use transport::{ProviderConfig, RateLimitPolicy};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("rate limited (HTTP 429)")]
    RateLimited,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from {provider}: {detail}")]
    MalformedResponse {
        provider: ProviderKind,
        detail: String,
    },

    #[error("{provider} does not support {capability}")]
    Unsupported {
        provider: ProviderKind,
        capability: Capability,
    },

    #[error("no credential configured for {0}")]
    MissingCredential(ProviderKind),
}

impl ProviderError {
    /// Network-level failures: connection errors, timeouts and rate limits.
    /// Everything else is a response or configuration problem.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ProviderError::Http(_) | ProviderError::Timeout | ProviderError::RateLimited
        )
    }

    /// Failures the exponential rate-limit policy retries.
    pub(crate) fn is_rate_limit_retryable(&self) -> bool {
        matches!(self, ProviderError::Timeout | ProviderError::RateLimited)
    }
}

/// Which half of the capability set a client serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Embedding,
    Inference,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Embedding => f.write_str("embedding"),
            Capability::Inference => f.write_str("inference"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Sampling parameters sent with every completion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

/// An immutable conversation plus sampling parameters.
/// `model` overrides the client's default model when set.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    messages: Vec<ChatMessage>,
    params: SamplingParams,
    model: Option<String>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>, params: SamplingParams) -> Self {
        Self {
            messages,
            params,
            model: None,
        }
    }

    #[cfg(test)]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn params(&self) -> SamplingParams {
        self.params
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }
}

/// Normalized completion output. `content` is always a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResult {
    pub role: ChatRole,
    pub content: String,
}

impl CompletionResult {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// One vector per input text, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResult {
    pub vectors: Vec<Vec<f32>>,
}

impl EmbeddingResult {
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Dimensionality of the first vector (0 when empty).
    pub fn dimensions(&self) -> usize {
        self.vectors.first().map(Vec::len).unwrap_or(0)
    }
}

/// Behaviour shared by every provider client.
#[async_trait]
pub trait ModelCapability: Send + Sync {
    /// Model identifier used when a request does not override it.
    fn model_id(&self) -> &str;

    /// Issues a minimal request. Never fails: every error becomes `false`.
    async fn test_connection(&self) -> bool;
}

#[async_trait]
pub trait EmbeddingModel: ModelCapability {
    async fn embed(&self, texts: &[String]) -> Result<EmbeddingResult, ProviderError>;
}

#[async_trait]
pub trait InferenceModel: ModelCapability {
    async fn complete(&self, request: &CompletionRequest)
        -> Result<CompletionResult, ProviderError>;
}
