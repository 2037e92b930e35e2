use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::settings::{
    ApiKeyInput, ApiKeyRow, ApiKeyUpdate, ModelSettingsInput, ModelSettingsRow,
};
use crate::settings::{
    duplicate_api_key, duplicate_settings, validate_api_key, validate_model_settings,
    ConfigStore, StoreError,
};

/// Postgres-backed store. Tables are created by `migrations/`.
#[derive(Clone)]
pub struct PgConfigStore {
    pool: PgPool,
}

impl PgConfigStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps a unique-constraint violation to `conflict`, anything else to `Database`.
fn map_unique(e: sqlx::Error, conflict: impl FnOnce() -> StoreError) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => conflict(),
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl ConfigStore for PgConfigStore {
    async fn list_model_settings(&self) -> Result<Vec<ModelSettingsRow>, StoreError> {
        Ok(sqlx::query_as::<_, ModelSettingsRow>(
            "SELECT * FROM model_settings WHERE is_active ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_model_settings(&self, id: Uuid) -> Result<ModelSettingsRow, StoreError> {
        sqlx::query_as::<_, ModelSettingsRow>(
            "SELECT * FROM model_settings WHERE id = $1 AND is_active",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("Model settings {id} not found")))
    }

    async fn create_model_settings(
        &self,
        input: ModelSettingsInput,
    ) -> Result<ModelSettingsRow, StoreError> {
        validate_model_settings(&input)?;

        let row = sqlx::query_as::<_, ModelSettingsRow>(
            r#"
            INSERT INTO model_settings
                (id, name, embedding_model, inference_model,
                 embedding_provider, inference_provider, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.embedding_model)
        .bind(&input.inference_model)
        .bind(input.embedding_provider.label())
        .bind(input.inference_provider.label())
        .bind(input.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, || duplicate_settings(&input.name)))?;

        info!("Created model settings '{}' ({})", row.name, row.id);
        Ok(row)
    }

    async fn update_model_settings(
        &self,
        id: Uuid,
        input: ModelSettingsInput,
    ) -> Result<ModelSettingsRow, StoreError> {
        validate_model_settings(&input)?;

        sqlx::query_as::<_, ModelSettingsRow>(
            r#"
            UPDATE model_settings
            SET name = $2, embedding_model = $3, inference_model = $4,
                embedding_provider = $5, inference_provider = $6,
                is_active = $7, updated_at = now()
            WHERE id = $1 AND is_active
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.embedding_model)
        .bind(&input.inference_model)
        .bind(input.embedding_provider.label())
        .bind(input.inference_provider.label())
        .bind(input.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique(e, || duplicate_settings(&input.name)))?
        .ok_or_else(|| StoreError::NotFound(format!("Model settings {id} not found")))
    }

    async fn delete_model_settings(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM model_settings WHERE id = $1 AND is_active")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Model settings {id} not found")));
        }
        Ok(())
    }

    async fn list_api_keys(&self) -> Result<Vec<ApiKeyRow>, StoreError> {
        Ok(sqlx::query_as::<_, ApiKeyRow>(
            "SELECT * FROM api_keys WHERE is_active ORDER BY service, name",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_api_key(&self, id: Uuid) -> Result<ApiKeyRow, StoreError> {
        sqlx::query_as::<_, ApiKeyRow>("SELECT * FROM api_keys WHERE id = $1 AND is_active")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("API key {id} not found")))
    }

    async fn create_api_key(&self, input: ApiKeyInput) -> Result<ApiKeyRow, StoreError> {
        validate_api_key(&input.name, &input.service, Some(&input.key))?;

        let row = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            INSERT INTO api_keys (id, name, service, key, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.service)
        .bind(&input.key)
        .bind(input.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, || duplicate_api_key(&input.name, &input.service)))?;

        info!("Created API key '{}' for service '{}'", row.name, row.service);
        Ok(row)
    }

    async fn update_api_key(
        &self,
        id: Uuid,
        input: ApiKeyUpdate,
    ) -> Result<ApiKeyRow, StoreError> {
        validate_api_key(&input.name, &input.service, input.key.as_deref())?;

        sqlx::query_as::<_, ApiKeyRow>(
            r#"
            UPDATE api_keys
            SET name = $2, service = $3, key = COALESCE($4, key),
                is_active = $5, updated_at = now()
            WHERE id = $1 AND is_active
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.service)
        .bind(input.key.as_deref())
        .bind(input.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique(e, || duplicate_api_key(&input.name, &input.service)))?
        .ok_or_else(|| StoreError::NotFound(format!("API key {id} not found")))
    }

    async fn delete_api_key(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1 AND is_active")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("API key {id} not found")));
        }
        Ok(())
    }

    async fn active_secret(&self, service: &str) -> Result<Option<String>, StoreError> {
        Ok(sqlx::query_scalar::<_, String>(
            r#"
            SELECT key FROM api_keys
            WHERE service = $1 AND is_active
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(service)
        .fetch_optional(&self.pool)
        .await?)
    }
}
