use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::settings::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            StoreError::Validation(msg) => AppError::Validation(msg),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<AnalysisError> for AppError {
    fn from(e: AnalysisError) -> Self {
        match e {
            AnalysisError::InvalidInput => AppError::Validation(e.to_string()),
            AnalysisError::Embedding(_) => AppError::Llm(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (StatusCode::BAD_GATEWAY, "LLM_ERROR", msg.clone())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;

    #[test]
    fn test_store_errors_map_to_status_codes() {
        let cases = [
            (StoreError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (StoreError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (StoreError::Conflict("x".into()), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_analysis_errors_map_to_status_codes() {
        let invalid = AppError::from(AnalysisError::InvalidInput);
        assert!(matches!(&invalid, AppError::Validation(m) if m == "Job post cannot be empty"));
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);

        let embedding = AppError::from(AnalysisError::Embedding(ProviderError::Timeout));
        assert_eq!(embedding.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
