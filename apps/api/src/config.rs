use std::time::Duration;

use anyhow::{Context, Result};

use crate::providers::ProviderKind;

/// Application configuration loaded from environment variables.
/// Every variable is optional; the defaults run against a local inference
/// server with the in-memory configuration store.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub ollama_base_url: String,
    pub embedding_provider: ProviderKind,
    pub inference_provider: ProviderKind,
    pub embedding_model: Option<String>,
    pub inference_model: Option<String>,
    pub provider_timeout: Duration,
    pub credentials: ProviderCredentials,
}

/// One optional credential per hosted provider.
#[derive(Clone, Default)]
pub struct ProviderCredentials {
    pub openrouter: Option<String>,
    pub azure: Option<String>,
    pub gemini: Option<String>,
    pub groq: Option<String>,
    pub deepseek: Option<String>,
}

impl ProviderCredentials {
    pub fn get(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::Ollama => None,
            ProviderKind::OpenRouter => self.openrouter.as_deref(),
            ProviderKind::Azure => self.azure.as_deref(),
            ProviderKind::Gemini => self.gemini.as_deref(),
            ProviderKind::Groq => self.groq.as_deref(),
            ProviderKind::DeepSeek => self.deepseek.as_deref(),
        }
    }
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let configured: Vec<_> = ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).is_some())
            .map(|kind| kind.label())
            .collect();
        f.debug_struct("ProviderCredentials")
            .field("configured", &configured)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            database_url: get("DATABASE_URL"),
            port: get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            ollama_base_url: get("OLLAMA_BASE_URL")
                .unwrap_or_else(|| "http://127.0.0.1:11434".to_string()),
            embedding_provider: parse_provider(get("EMBEDDING_PROVIDER"), "EMBEDDING_PROVIDER")?,
            inference_provider: parse_provider(get("INFERENCE_PROVIDER"), "INFERENCE_PROVIDER")?,
            embedding_model: get("EMBEDDING_MODEL"),
            inference_model: get("INFERENCE_MODEL"),
            provider_timeout: Duration::from_secs(
                get("PROVIDER_TIMEOUT_SECS")
                    .unwrap_or_else(|| "30".to_string())
                    .parse::<u64>()
                    .context("PROVIDER_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            credentials: ProviderCredentials {
                openrouter: get("OPENROUTER_API_KEY"),
                azure: get("GITHUB_TOKEN"),
                gemini: get("GEMINI_API_KEY"),
                groq: get("GROQ_API_KEY"),
                deepseek: get("DEEPSEEK_OPENROUTER_API_KEY"),
            },
        })
    }
}

fn parse_provider(value: Option<String>, key: &str) -> Result<ProviderKind> {
    match value {
        None => Ok(ProviderKind::Ollama),
        Some(v) => v
            .parse::<ProviderKind>()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("{key} is invalid")),
    }
}
