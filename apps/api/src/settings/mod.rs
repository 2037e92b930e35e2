//! Configuration store for model-settings profiles and provider API keys.
//!
//! `AppState` holds an `Arc<dyn ConfigStore>`: `PgConfigStore` when a
//! database is configured, `MemoryConfigStore` otherwise. Only active rows
//! are visible through the store's read, update and delete operations.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::settings::{
    ApiKeyInput, ApiKeyRow, ApiKeyUpdate, ModelSettingsInput, ModelSettingsRow,
};

pub mod handlers;
pub mod memory;
pub mod postgres;

pub use memory::MemoryConfigStore;
pub use postgres::PgConfigStore;

const MAX_NAME_LEN: usize = 100;
const MAX_MODEL_LEN: usize = 100;
const MAX_SERVICE_LEN: usize = 100;
const MAX_KEY_LEN: usize = 500;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    /// Uniqueness violation.
    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn list_model_settings(&self) -> Result<Vec<ModelSettingsRow>, StoreError>;
    async fn get_model_settings(&self, id: Uuid) -> Result<ModelSettingsRow, StoreError>;
    async fn create_model_settings(
        &self,
        input: ModelSettingsInput,
    ) -> Result<ModelSettingsRow, StoreError>;
    async fn update_model_settings(
        &self,
        id: Uuid,
        input: ModelSettingsInput,
    ) -> Result<ModelSettingsRow, StoreError>;
    async fn delete_model_settings(&self, id: Uuid) -> Result<(), StoreError>;

    async fn list_api_keys(&self) -> Result<Vec<ApiKeyRow>, StoreError>;
    async fn get_api_key(&self, id: Uuid) -> Result<ApiKeyRow, StoreError>;
    async fn create_api_key(&self, input: ApiKeyInput) -> Result<ApiKeyRow, StoreError>;
    async fn update_api_key(&self, id: Uuid, input: ApiKeyUpdate)
        -> Result<ApiKeyRow, StoreError>;
    async fn delete_api_key(&self, id: Uuid) -> Result<(), StoreError>;

    /// Secret of the most recently updated active key for `service`.
    async fn active_secret(&self, service: &str) -> Result<Option<String>, StoreError>;
}

pub(crate) fn validate_model_settings(input: &ModelSettingsInput) -> Result<(), StoreError> {
    require_text("name", &input.name, MAX_NAME_LEN)?;
    require_text("embedding_model", &input.embedding_model, MAX_MODEL_LEN)?;
    require_text("inference_model", &input.inference_model, MAX_MODEL_LEN)?;
    Ok(())
}

pub(crate) fn validate_api_key(
    name: &str,
    service: &str,
    key: Option<&str>,
) -> Result<(), StoreError> {
    require_text("name", name, MAX_NAME_LEN)?;
    require_text("service", service, MAX_SERVICE_LEN)?;
    if let Some(key) = key {
        require_text("key", key, MAX_KEY_LEN)?;
    }
    Ok(())
}

fn require_text(field: &str, value: &str, max_len: usize) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(format!("{field} cannot be empty")));
    }
    if value.chars().count() > max_len {
        return Err(StoreError::Validation(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(())
}

pub(crate) fn duplicate_settings(name: &str) -> StoreError {
    StoreError::Conflict(format!("Model settings named '{name}' already exist"))
}

pub(crate) fn duplicate_api_key(name: &str, service: &str) -> StoreError {
    StoreError::Conflict(format!(
        "An API key named '{name}' for service '{service}' already exists"
    ))
}
