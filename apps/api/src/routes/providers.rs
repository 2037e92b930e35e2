use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::providers::{
    Capability, EmbeddingClient, InferenceClient, ModelCapability, ProviderError, ProviderKind,
};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProviderInfo {
    pub provider: ProviderKind,
    pub requires_credential: bool,
    pub supports_embedding: bool,
    pub default_inference_model: &'static str,
    pub default_embedding_model: Option<&'static str>,
    pub inference_models: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct ProviderTestRequest {
    pub provider: ProviderKind,
    pub capability: Capability,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProviderTestResponse {
    pub provider: ProviderKind,
    pub capability: Capability,
    pub model: String,
    pub connected: bool,
}

/// GET /api/v1/providers
pub async fn handle_list_providers() -> Json<Vec<ProviderInfo>> {
    Json(
        ProviderKind::ALL
            .into_iter()
            .map(|kind| ProviderInfo {
                provider: kind,
                requires_credential: kind.requires_credential(),
                supports_embedding: kind.supports_embedding(),
                default_inference_model: kind.default_inference_model(),
                default_embedding_model: kind.default_embedding_model(),
                inference_models: kind.inference_models(),
            })
            .collect(),
    )
}

/// POST /api/v1/providers/test
/// Builds a fresh client for the requested provider and runs its connection test.
pub async fn handle_provider_test(
    State(state): State<AppState>,
    Json(req): Json<ProviderTestRequest>,
) -> Result<Json<ProviderTestResponse>, AppError> {
    let config = state.provider_config(req.provider, req.model).await?;

    let client: Box<dyn ModelCapability> = match req.capability {
        Capability::Embedding => Box::new(EmbeddingClient::new(config).map_err(client_error)?),
        Capability::Inference => Box::new(InferenceClient::new(config).map_err(client_error)?),
    };

    let connected = client.test_connection().await;
    info!(
        provider = %req.provider,
        capability = %req.capability,
        model = client.model_id(),
        connected,
        "Provider connection test finished"
    );

    Ok(Json(ProviderTestResponse {
        provider: req.provider,
        capability: req.capability,
        model: client.model_id().to_string(),
        connected,
    }))
}

/// Construction failures are configuration problems, not upstream ones.
fn client_error(e: ProviderError) -> AppError {
    match e {
        ProviderError::MissingCredential(_) | ProviderError::Unsupported { .. } => {
            AppError::UnprocessableEntity(e.to_string())
        }
        other => AppError::Internal(other.into()),
    }
}
