//! Provider table, one static profile per supported backend.
//!
//! Adding a backend means adding a `ProviderKind` variant and its profile row;
//! request building and response parsing are selected by the wire formats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Models reachable through the Azure-hosted inference endpoint.
pub const AZURE_INFERENCE_MODELS: &[&str] = &[
    "gpt-4o",
    "Phi-3.5-MoE-instruct",
    "Llama-3.3-70B-Instruct",
    "Meta-Llama-3.1-405B-Instruct",
    "Mistral-large-2411",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Ollama,
    OpenRouter,
    Azure,
    Gemini,
    Groq,
    DeepSeek,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChatWire {
    /// `POST /api/generate` with a flattened prompt.
    OllamaGenerate,
    /// `POST /chat/completions`.
    OpenAiChat,
    /// `POST /models/{model}:generateContent`.
    GeminiGenerate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EmbedWire {
    /// `POST /api/embed`.
    OllamaEmbed,
    /// `POST /embeddings`.
    OpenAiEmbeddings,
    /// `POST /models/{model}:batchEmbedContents`.
    GeminiBatchEmbed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthScheme {
    None,
    Bearer,
    GoogleApiKey,
}

/// What a connection-test completion must contain to count as a success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConnectionCheck {
    NonEmpty,
    Contains(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ProviderProfile {
    pub base_url: &'static str,
    pub chat: ChatWire,
    pub embed: Option<EmbedWire>,
    pub default_inference_model: &'static str,
    pub default_embedding_model: Option<&'static str>,
    pub auth: AuthScheme,
    pub headers: &'static [(&'static str, &'static str)],
    /// Header that echoes the model identifier on every request.
    pub model_header: Option<&'static str>,
    /// Completion failures become `"Error: ..."` content instead of errors.
    pub degrade_on_error: bool,
    /// Hosted endpoints can answer 429; the local server cannot.
    pub rate_limited: bool,
    pub connection_check: ConnectionCheck,
}

const OPENROUTER_HEADERS: &[(&str, &str)] = &[
    ("HTTP-Referer", "https://github.com/freelance-assistant/freelance-assistant"),
    ("X-Title", "FreelanceAssistant"),
];

const DEEPSEEK_HEADERS: &[(&str, &str)] = &[
    ("HTTP-Referer", "https://freelanceassistant.ai"),
    ("X-Title", "FreelanceAssistant"),
];

impl ProviderKind {
    pub const ALL: [ProviderKind; 6] = [
        ProviderKind::Ollama,
        ProviderKind::OpenRouter,
        ProviderKind::Azure,
        ProviderKind::Gemini,
        ProviderKind::Groq,
        ProviderKind::DeepSeek,
    ];

    /// Service label used in configuration and API-key records.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::Azure => "azure",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Groq => "groq",
            ProviderKind::DeepSeek => "deepseek",
        }
    }

    pub fn default_inference_model(&self) -> &'static str {
        self.profile().default_inference_model
    }

    pub fn default_embedding_model(&self) -> Option<&'static str> {
        self.profile().default_embedding_model
    }

    pub fn supports_embedding(&self) -> bool {
        self.profile().embed.is_some()
    }

    pub fn requires_credential(&self) -> bool {
        self.profile().auth != AuthScheme::None
    }

    /// Selectable inference models. Only Azure publishes more than its default.
    pub fn inference_models(&self) -> Vec<&'static str> {
        match self {
            ProviderKind::Azure => AZURE_INFERENCE_MODELS.to_vec(),
            other => vec![other.default_inference_model()],
        }
    }

    pub(crate) fn profile(&self) -> ProviderProfile {
        match self {
            ProviderKind::Ollama => ProviderProfile {
                base_url: "http://127.0.0.1:11434",
                chat: ChatWire::OllamaGenerate,
                embed: Some(EmbedWire::OllamaEmbed),
                default_inference_model: "deepseek-coder-v2:latest",
                default_embedding_model: Some("nomic-embed-text:latest"),
                auth: AuthScheme::None,
                headers: &[],
                model_header: None,
                degrade_on_error: false,
                rate_limited: false,
                connection_check: ConnectionCheck::Contains("test successful"),
            },
            ProviderKind::OpenRouter => ProviderProfile {
                base_url: "https://openrouter.ai/api/v1",
                chat: ChatWire::OpenAiChat,
                embed: None,
                default_inference_model: "meta-llama/llama-3.1-405b-instruct:free",
                default_embedding_model: None,
                auth: AuthScheme::Bearer,
                headers: OPENROUTER_HEADERS,
                model_header: None,
                degrade_on_error: true,
                rate_limited: true,
                connection_check: ConnectionCheck::NonEmpty,
            },
            ProviderKind::Azure => ProviderProfile {
                base_url: "https://models.inference.ai.azure.com",
                chat: ChatWire::OpenAiChat,
                embed: Some(EmbedWire::OpenAiEmbeddings),
                default_inference_model: AZURE_INFERENCE_MODELS[0],
                default_embedding_model: Some("text-embedding-3-large"),
                auth: AuthScheme::Bearer,
                headers: &[],
                model_header: None,
                degrade_on_error: false,
                rate_limited: true,
                connection_check: ConnectionCheck::NonEmpty,
            },
            ProviderKind::Gemini => ProviderProfile {
                base_url: "https://generativelanguage.googleapis.com/v1beta",
                chat: ChatWire::GeminiGenerate,
                embed: Some(EmbedWire::GeminiBatchEmbed),
                default_inference_model: "gemini-2.0-flash-exp",
                default_embedding_model: Some("text-embedding-004"),
                auth: AuthScheme::GoogleApiKey,
                headers: &[],
                model_header: None,
                degrade_on_error: false,
                rate_limited: true,
                connection_check: ConnectionCheck::NonEmpty,
            },
            ProviderKind::Groq => ProviderProfile {
                base_url: "https://api.groq.com/openai/v1",
                chat: ChatWire::OpenAiChat,
                embed: None,
                default_inference_model: "llama-3.3-70b-versatile",
                default_embedding_model: None,
                auth: AuthScheme::Bearer,
                headers: &[],
                model_header: None,
                degrade_on_error: false,
                rate_limited: true,
                connection_check: ConnectionCheck::NonEmpty,
            },
            ProviderKind::DeepSeek => ProviderProfile {
                base_url: "https://openrouter.ai/api/v1",
                chat: ChatWire::OpenAiChat,
                embed: None,
                default_inference_model: "deepseek/deepseek-chat",
                default_embedding_model: None,
                auth: AuthScheme::Bearer,
                headers: DEEPSEEK_HEADERS,
                model_header: Some("X-Model"),
                degrade_on_error: false,
                rate_limited: true,
                connection_check: ConnectionCheck::NonEmpty,
            },
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.label() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown provider '{s}' (expected one of: {})",
                    ProviderKind::ALL.map(|k| k.label()).join(", ")
                )
            })
    }
}
