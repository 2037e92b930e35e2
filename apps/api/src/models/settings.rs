use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::providers::ProviderKind;

pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text:latest";
pub const DEFAULT_INFERENCE_MODEL: &str = "meta-llama/llama-3.1-405b-instruct:free";
pub const DEFAULT_EMBEDDING_PROVIDER: ProviderKind = ProviderKind::Ollama;
pub const DEFAULT_INFERENCE_PROVIDER: ProviderKind = ProviderKind::OpenRouter;

/// A named pair of embedding / inference model choices.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ModelSettingsRow {
    pub id: Uuid,
    pub name: String,
    pub embedding_model: String,
    pub inference_model: String,
    pub embedding_provider: String,
    pub inference_provider: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of POST / PUT on model settings. Omitted fields take the defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelSettingsInput {
    pub name: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_inference_model")]
    pub inference_model: String,
    #[serde(default = "default_embedding_provider")]
    pub embedding_provider: ProviderKind,
    #[serde(default = "default_inference_provider")]
    pub inference_provider: ProviderKind,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// An API key for one service. The secret is write-only: it is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApiKeyRow {
    pub id: Uuid,
    pub name: String,
    pub service: String,
    #[serde(skip_serializing)]
    pub key: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyInput {
    pub name: String,
    pub service: String,
    pub key: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Body of PUT on an API key. `key` is kept unchanged when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyUpdate {
    pub name: String,
    pub service: String,
    pub key: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_inference_model() -> String {
    DEFAULT_INFERENCE_MODEL.to_string()
}

fn default_embedding_provider() -> ProviderKind {
    DEFAULT_EMBEDDING_PROVIDER
}

fn default_inference_provider() -> ProviderKind {
    DEFAULT_INFERENCE_PROVIDER
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_settings_input_defaults() {
        let input: ModelSettingsInput = serde_json::from_str(r#"{"name": "default"}"#).unwrap();
        assert_eq!(input.embedding_model, "nomic-embed-text:latest");
        assert_eq!(input.inference_model, "meta-llama/llama-3.1-405b-instruct:free");
        assert_eq!(input.embedding_provider, ProviderKind::Ollama);
        assert_eq!(input.inference_provider, ProviderKind::OpenRouter);
        assert!(input.is_active);
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let result: Result<ModelSettingsInput, _> =
            serde_json::from_str(r#"{"name": "x", "inference_provider": "skynet"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_api_key_secret_is_never_serialized() {
        let row = ApiKeyRow {
            id: Uuid::new_v4(),
            name: "primary".to_string(),
            service: "openrouter".to_string(),
            key: "sk-or-v1-secret".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert!(json.get("key").is_none());
        assert!(!json.to_string().contains("sk-or-v1-secret"));
        assert_eq!(json["service"], "openrouter");
    }

    #[test]
    fn test_api_key_update_key_is_optional() {
        let update: ApiKeyUpdate =
            serde_json::from_str(r#"{"name": "primary", "service": "groq"}"#).unwrap();
        assert!(update.key.is_none());
        assert!(update.is_active);
    }
}
