use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::settings::{
    ApiKeyInput, ApiKeyRow, ApiKeyUpdate, ModelSettingsInput, ModelSettingsRow,
};
use crate::providers::ProviderKind;
use crate::state::AppState;

/// Local-only pairing returned by the default-settings endpoint.
#[derive(Debug, Serialize)]
pub struct DefaultSettingsResponse {
    pub embedding_provider: ProviderKind,
    pub inference_provider: ProviderKind,
    pub embedding_model: &'static str,
    pub inference_model: &'static str,
}

/// GET /api/v1/model-settings
pub async fn handle_list_model_settings(
    State(state): State<AppState>,
) -> Result<Json<Vec<ModelSettingsRow>>, AppError> {
    Ok(Json(state.store.list_model_settings().await?))
}

/// GET /api/v1/model-settings/default-settings
pub async fn handle_default_settings() -> Json<DefaultSettingsResponse> {
    let local = ProviderKind::Ollama;
    Json(DefaultSettingsResponse {
        embedding_provider: local,
        inference_provider: local,
        embedding_model: local.default_embedding_model().unwrap_or_default(),
        inference_model: local.default_inference_model(),
    })
}

/// GET /api/v1/model-settings/:id
pub async fn handle_get_model_settings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ModelSettingsRow>, AppError> {
    Ok(Json(state.store.get_model_settings(id).await?))
}

/// POST /api/v1/model-settings
pub async fn handle_create_model_settings(
    State(state): State<AppState>,
    Json(input): Json<ModelSettingsInput>,
) -> Result<(StatusCode, Json<ModelSettingsRow>), AppError> {
    let row = state.store.create_model_settings(input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /api/v1/model-settings/:id
pub async fn handle_update_model_settings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ModelSettingsInput>,
) -> Result<Json<ModelSettingsRow>, AppError> {
    Ok(Json(state.store.update_model_settings(id, input).await?))
}

/// DELETE /api/v1/model-settings/:id
pub async fn handle_delete_model_settings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.store.delete_model_settings(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/api-keys
/// Secrets are never part of the response.
pub async fn handle_list_api_keys(
    State(state): State<AppState>,
) -> Result<Json<Vec<ApiKeyRow>>, AppError> {
    Ok(Json(state.store.list_api_keys().await?))
}

/// GET /api/v1/api-keys/:id
pub async fn handle_get_api_key(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiKeyRow>, AppError> {
    Ok(Json(state.store.get_api_key(id).await?))
}

/// POST /api/v1/api-keys
pub async fn handle_create_api_key(
    State(state): State<AppState>,
    Json(input): Json<ApiKeyInput>,
) -> Result<(StatusCode, Json<ApiKeyRow>), AppError> {
    let row = state.store.create_api_key(input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /api/v1/api-keys/:id
pub async fn handle_update_api_key(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ApiKeyUpdate>,
) -> Result<Json<ApiKeyRow>, AppError> {
    Ok(Json(state.store.update_api_key(id, input).await?))
}

/// DELETE /api/v1/api-keys/:id
pub async fn handle_delete_api_key(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.store.delete_api_key(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
