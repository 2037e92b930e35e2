//! In-process store used when no database is configured. Contents are lost
//! on restart.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::settings::{
    ApiKeyInput, ApiKeyRow, ApiKeyUpdate, ModelSettingsInput, ModelSettingsRow,
};
use crate::settings::{
    duplicate_api_key, duplicate_settings, validate_api_key, validate_model_settings,
    ConfigStore, StoreError,
};

#[derive(Default)]
struct Tables {
    model_settings: Vec<ModelSettingsRow>,
    api_keys: Vec<ApiKeyRow>,
}

#[derive(Default)]
pub struct MemoryConfigStore {
    tables: RwLock<Tables>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn settings_not_found(id: Uuid) -> StoreError {
    StoreError::NotFound(format!("Model settings {id} not found"))
}

fn api_key_not_found(id: Uuid) -> StoreError {
    StoreError::NotFound(format!("API key {id} not found"))
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn list_model_settings(&self) -> Result<Vec<ModelSettingsRow>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .model_settings
            .iter()
            .filter(|row| row.is_active)
            .cloned()
            .collect())
    }

    async fn get_model_settings(&self, id: Uuid) -> Result<ModelSettingsRow, StoreError> {
        let tables = self.tables.read().await;
        tables
            .model_settings
            .iter()
            .find(|row| row.id == id && row.is_active)
            .cloned()
            .ok_or_else(|| settings_not_found(id))
    }

    async fn create_model_settings(
        &self,
        input: ModelSettingsInput,
    ) -> Result<ModelSettingsRow, StoreError> {
        validate_model_settings(&input)?;
        let mut tables = self.tables.write().await;
        if tables.model_settings.iter().any(|row| row.name == input.name) {
            return Err(duplicate_settings(&input.name));
        }

        let now = Utc::now();
        let row = ModelSettingsRow {
            id: Uuid::new_v4(),
            name: input.name,
            embedding_model: input.embedding_model,
            inference_model: input.inference_model,
            embedding_provider: input.embedding_provider.label().to_string(),
            inference_provider: input.inference_provider.label().to_string(),
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        tables.model_settings.push(row.clone());
        Ok(row)
    }

    async fn update_model_settings(
        &self,
        id: Uuid,
        input: ModelSettingsInput,
    ) -> Result<ModelSettingsRow, StoreError> {
        validate_model_settings(&input)?;
        let mut tables = self.tables.write().await;
        let index = tables
            .model_settings
            .iter()
            .position(|row| row.id == id && row.is_active)
            .ok_or_else(|| settings_not_found(id))?;
        if tables
            .model_settings
            .iter()
            .any(|row| row.id != id && row.name == input.name)
        {
            return Err(duplicate_settings(&input.name));
        }

        let row = &mut tables.model_settings[index];
        row.name = input.name;
        row.embedding_model = input.embedding_model;
        row.inference_model = input.inference_model;
        row.embedding_provider = input.embedding_provider.label().to_string();
        row.inference_provider = input.inference_provider.label().to_string();
        row.is_active = input.is_active;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete_model_settings(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.model_settings.len();
        tables
            .model_settings
            .retain(|row| !(row.id == id && row.is_active));
        if tables.model_settings.len() == before {
            return Err(settings_not_found(id));
        }
        Ok(())
    }

    async fn list_api_keys(&self) -> Result<Vec<ApiKeyRow>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .api_keys
            .iter()
            .filter(|row| row.is_active)
            .cloned()
            .collect())
    }

    async fn get_api_key(&self, id: Uuid) -> Result<ApiKeyRow, StoreError> {
        let tables = self.tables.read().await;
        tables
            .api_keys
            .iter()
            .find(|row| row.id == id && row.is_active)
            .cloned()
            .ok_or_else(|| api_key_not_found(id))
    }

    async fn create_api_key(&self, input: ApiKeyInput) -> Result<ApiKeyRow, StoreError> {
        validate_api_key(&input.name, &input.service, Some(&input.key))?;
        let mut tables = self.tables.write().await;
        if tables
            .api_keys
            .iter()
            .any(|row| row.name == input.name && row.service == input.service)
        {
            return Err(duplicate_api_key(&input.name, &input.service));
        }

        let now = Utc::now();
        let row = ApiKeyRow {
            id: Uuid::new_v4(),
            name: input.name,
            service: input.service,
            key: input.key,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        tables.api_keys.push(row.clone());
        Ok(row)
    }

    async fn update_api_key(
        &self,
        id: Uuid,
        input: ApiKeyUpdate,
    ) -> Result<ApiKeyRow, StoreError> {
        validate_api_key(&input.name, &input.service, input.key.as_deref())?;
        let mut tables = self.tables.write().await;
        let index = tables
            .api_keys
            .iter()
            .position(|row| row.id == id && row.is_active)
            .ok_or_else(|| api_key_not_found(id))?;
        if tables
            .api_keys
            .iter()
            .any(|row| row.id != id && row.name == input.name && row.service == input.service)
        {
            return Err(duplicate_api_key(&input.name, &input.service));
        }

        let row = &mut tables.api_keys[index];
        row.name = input.name;
        row.service = input.service;
        if let Some(key) = input.key {
            row.key = key;
        }
        row.is_active = input.is_active;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete_api_key(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.api_keys.len();
        tables.api_keys.retain(|row| !(row.id == id && row.is_active));
        if tables.api_keys.len() == before {
            return Err(api_key_not_found(id));
        }
        Ok(())
    }

    async fn active_secret(&self, service: &str) -> Result<Option<String>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .api_keys
            .iter()
            .filter(|row| row.is_active && row.service == service)
            .max_by_key(|row| row.updated_at)
            .map(|row| row.key.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderKind;

    fn key_input(name: &str, service: &str, key: &str) -> ApiKeyInput {
        ApiKeyInput {
            name: name.to_string(),
            service: service.to_string(),
            key: key.to_string(),
            is_active: true,
        }
    }

    fn settings_input(name: &str) -> ModelSettingsInput {
        serde_json::from_value(serde_json::json!({ "name": name })).unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_name_and_service_conflicts() {
        let store = MemoryConfigStore::new();
        store
            .create_api_key(key_input("primary", "openrouter", "sk-1"))
            .await
            .unwrap();

        let err = store
            .create_api_key(key_input("primary", "openrouter", "sk-2"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // Same name on another service is fine.
        store
            .create_api_key(key_input("primary", "groq", "gsk-1"))
            .await
            .unwrap();
        assert_eq!(store.list_api_keys().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_hides_inactive_rows() {
        let store = MemoryConfigStore::new();
        let mut inactive = key_input("old", "groq", "gsk-old");
        inactive.is_active = false;
        let hidden = store.create_api_key(inactive).await.unwrap();
        store
            .create_api_key(key_input("new", "groq", "gsk-new"))
            .await
            .unwrap();

        let listed = store.list_api_keys().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "new");
        assert!(matches!(
            store.get_api_key(hidden.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_keeps_secret_when_omitted() {
        let store = MemoryConfigStore::new();
        let row = store
            .create_api_key(key_input("primary", "gemini", "AIza-1"))
            .await
            .unwrap();

        let updated = store
            .update_api_key(
                row.id,
                ApiKeyUpdate {
                    name: "renamed".to_string(),
                    service: "gemini".to_string(),
                    key: None,
                    is_active: true,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.key, "AIza-1");
        assert_eq!(
            store.active_secret("gemini").await.unwrap().as_deref(),
            Some("AIza-1")
        );
    }

    #[tokio::test]
    async fn test_active_secret_ignores_inactive_and_other_services() {
        let store = MemoryConfigStore::new();
        let mut inactive = key_input("a", "groq", "gsk-inactive");
        inactive.is_active = false;
        store.create_api_key(inactive).await.unwrap();
        store
            .create_api_key(key_input("b", "azure", "ghp-1"))
            .await
            .unwrap();

        assert_eq!(store.active_secret("groq").await.unwrap(), None);
        assert_eq!(
            store.active_secret("azure").await.unwrap().as_deref(),
            Some("ghp-1")
        );
    }

    #[tokio::test]
    async fn test_model_settings_crud() {
        let store = MemoryConfigStore::new();
        let created = store
            .create_model_settings(settings_input("default"))
            .await
            .unwrap();
        assert_eq!(created.embedding_provider, "ollama");
        assert_eq!(created.inference_provider, "openrouter");

        let mut change = settings_input("default");
        change.inference_provider = ProviderKind::Groq;
        change.inference_model = "llama-3.3-70b-versatile".to_string();
        let updated = store
            .update_model_settings(created.id, change)
            .await
            .unwrap();
        assert_eq!(updated.inference_provider, "groq");
        assert!(updated.updated_at >= created.updated_at);

        assert!(matches!(
            store.create_model_settings(settings_input("default")).await,
            Err(StoreError::Conflict(_))
        ));

        store.delete_model_settings(created.id).await.unwrap();
        assert!(store.list_model_settings().await.unwrap().is_empty());
        assert!(matches!(
            store.delete_model_settings(created.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_of_missing_row_is_not_found_before_name_conflict() {
        let store = MemoryConfigStore::new();
        store
            .create_model_settings(settings_input("fast"))
            .await
            .unwrap();
        let err = store
            .update_model_settings(Uuid::new_v4(), settings_input("fast"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        let mut inactive = key_input("old", "groq", "gsk-old");
        inactive.is_active = false;
        let hidden = store.create_api_key(inactive).await.unwrap();
        store
            .create_api_key(key_input("primary", "groq", "gsk-1"))
            .await
            .unwrap();
        let err = store
            .update_api_key(
                hidden.id,
                ApiKeyUpdate {
                    name: "primary".to_string(),
                    service: "groq".to_string(),
                    key: None,
                    is_active: true,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rename_onto_existing_settings_conflicts() {
        let store = MemoryConfigStore::new();
        store
            .create_model_settings(settings_input("fast"))
            .await
            .unwrap();
        let other = store
            .create_model_settings(settings_input("thorough"))
            .await
            .unwrap();
        let err = store
            .update_model_settings(other.id, settings_input("fast"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
