pub mod health;
pub mod providers;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::settings::handlers as settings;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Model settings
        .route(
            "/api/v1/model-settings",
            get(settings::handle_list_model_settings).post(settings::handle_create_model_settings),
        )
        .route(
            "/api/v1/model-settings/default-settings",
            get(settings::handle_default_settings),
        )
        .route(
            "/api/v1/model-settings/:id",
            get(settings::handle_get_model_settings)
                .put(settings::handle_update_model_settings)
                .delete(settings::handle_delete_model_settings),
        )
        // API keys
        .route(
            "/api/v1/api-keys",
            get(settings::handle_list_api_keys).post(settings::handle_create_api_key),
        )
        .route(
            "/api/v1/api-keys/:id",
            get(settings::handle_get_api_key)
                .put(settings::handle_update_api_key)
                .delete(settings::handle_delete_api_key),
        )
        // Analysis
        .route(
            "/api/v1/job-analysis",
            post(analysis::handle_job_analysis),
        )
        // Providers
        .route("/api/v1/providers", get(providers::handle_list_providers))
        .route(
            "/api/v1/providers/test",
            post(providers::handle_provider_test),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::JobAnalyzer;
    use crate::config::Config;
    use crate::providers::{
        CompletionRequest, CompletionResult, EmbeddingModel, EmbeddingResult, InferenceModel,
        ModelCapability, ProviderError,
    };
    use crate::settings::MemoryConfigStore;
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct StubEmbedder {
        fail: bool,
    }

    #[async_trait]
    impl ModelCapability for StubEmbedder {
        fn model_id(&self) -> &str {
            "stub-embed"
        }

        async fn test_connection(&self) -> bool {
            !self.fail
        }
    }

    #[async_trait]
    impl EmbeddingModel for StubEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<EmbeddingResult, ProviderError> {
            if self.fail {
                return Err(ProviderError::Timeout);
            }
            Ok(EmbeddingResult {
                vectors: texts.iter().map(|_| vec![0.1, 0.2]).collect(),
            })
        }
    }

    struct EchoInference;

    #[async_trait]
    impl ModelCapability for EchoInference {
        fn model_id(&self) -> &str {
            "stub-chat"
        }

        async fn test_connection(&self) -> bool {
            true
        }
    }

    #[async_trait]
    impl InferenceModel for EchoInference {
        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> Result<CompletionResult, ProviderError> {
            Ok(CompletionResult::assistant("section text"))
        }
    }

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    fn app_with(config: Config, embed_fails: bool) -> Router {
        let analyzer = JobAnalyzer::new(
            Arc::new(StubEmbedder { fail: embed_fails }),
            Arc::new(EchoInference),
        );
        build_router(AppState::new(
            Arc::new(MemoryConfigStore::new()),
            analyzer,
            config,
        ))
    }

    fn app() -> Router {
        app_with(config(&[]), false)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "freelance-api");
    }

    #[tokio::test]
    async fn test_job_analysis_requires_job_post() {
        let (status, body) =
            send(&app(), Method::POST, "/api/v1/job-analysis", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Job post is required");
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_job_analysis_without_body_is_error_json() {
        let (status, body) = send(&app(), Method::POST, "/api/v1/job-analysis", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Job post is required");
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_job_analysis_with_non_string_post_is_error_json() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/v1/job-analysis",
            Some(json!({ "job_post": 42 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Job post is required");
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_job_analysis_rejects_blank_post() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/v1/job-analysis",
            Some(json!({ "job_post": "   \n\t" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Job post cannot be empty");
    }

    #[tokio::test]
    async fn test_job_analysis_returns_seven_keys() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/v1/job-analysis",
            Some(json!({ "job_post": "Need a Rust developer for a CLI tool." })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let object = body.as_object().unwrap();
        assert_eq!(object.len(), 7);
        for key in [
            "jobAnalysis",
            "clientCharacteristics",
            "approachAnalysis",
            "solutionAnalysis",
            "questionsAnalysis",
            "proposal",
        ] {
            assert_eq!(object[key], "section text", "{key}");
        }
        let bank: Value = serde_json::from_str(object["prompt"].as_str().unwrap()).unwrap();
        assert_eq!(bank.as_object().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_job_analysis_embedding_failure_is_bad_gateway() {
        let app = app_with(config(&[]), true);
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/job-analysis",
            Some(json!({ "job_post": "Build a scraper." })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "LLM_ERROR");
    }

    #[tokio::test]
    async fn test_api_key_lifecycle_never_exposes_secret() {
        let app = app();
        let (status, created) = send(
            &app,
            Method::POST,
            "/api/v1/api-keys",
            Some(json!({ "name": "primary", "service": "groq", "key": "gsk-secret" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(created.get("key").is_none());

        let (status, listed) = send(&app, Method::GET, "/api/v1/api-keys", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert!(!listed.to_string().contains("gsk-secret"));

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/api-keys",
            Some(json!({ "name": "primary", "service": "groq", "key": "gsk-other" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let uri = format!("/api/v1/api-keys/{}", created["id"].as_str().unwrap());
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_api_key_validation() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/v1/api-keys",
            Some(json!({ "name": "primary", "service": "groq", "key": "k".repeat(501) })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "key must be at most 500 characters");
    }

    #[tokio::test]
    async fn test_model_settings_create_update_and_defaults() {
        let app = app();
        let (status, created) = send(
            &app,
            Method::POST,
            "/api/v1/model-settings",
            Some(json!({ "name": "default" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["inference_provider"], "openrouter");

        let uri = format!("/api/v1/model-settings/{}", created["id"].as_str().unwrap());
        let (status, updated) = send(
            &app,
            Method::PUT,
            &uri,
            Some(json!({ "name": "default", "inference_provider": "groq" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["inference_provider"], "groq");

        let (status, defaults) = send(
            &app,
            Method::GET,
            "/api/v1/model-settings/default-settings",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(defaults["embedding_model"], "nomic-embed-text:latest");
        assert_eq!(defaults["inference_model"], "deepseek-coder-v2:latest");
        assert_eq!(defaults["embedding_provider"], "ollama");
        assert_eq!(defaults["inference_provider"], "ollama");
    }

    #[tokio::test]
    async fn test_unknown_model_settings_is_not_found() {
        let uri = format!("/api/v1/model-settings/{}", uuid::Uuid::new_v4());
        let (status, _) = send(&app(), Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_provider_catalogue() {
        let (status, body) = send(&app(), Method::GET, "/api/v1/providers", None).await;
        assert_eq!(status, StatusCode::OK);
        let providers = body.as_array().unwrap();
        assert_eq!(providers.len(), 6);
        assert_eq!(providers[0]["provider"], "ollama");
        assert_eq!(providers[0]["requires_credential"], false);
        let azure = providers.iter().find(|p| p["provider"] == "azure").unwrap();
        assert_eq!(azure["inference_models"].as_array().unwrap().len(), 5);
        assert_eq!(azure["default_embedding_model"], "text-embedding-3-large");
    }

    #[tokio::test]
    async fn test_provider_test_against_local_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "response": "Test successful!" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "embeddings": [[0.5, 0.25]] })),
            )
            .mount(&server)
            .await;

        let uri = server.uri();
        let app = app_with(config(&[("OLLAMA_BASE_URL", uri.as_str())]), false);
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/providers/test",
            Some(json!({ "provider": "ollama", "capability": "inference" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["connected"], true);
        assert_eq!(body["model"], "deepseek-coder-v2:latest");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/providers/test",
            Some(json!({
                "provider": "ollama",
                "capability": "embedding",
                "model": "mxbai-embed-large"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["connected"], true);
        assert_eq!(body["model"], "mxbai-embed-large");
    }

    #[tokio::test]
    async fn test_provider_test_configuration_errors_are_unprocessable() {
        let app = app_with(config(&[("OLLAMA_BASE_URL", "http://127.0.0.1:9")]), false);
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/providers/test",
            Some(json!({ "provider": "openrouter", "capability": "inference" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "no credential configured for openrouter");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/providers/test",
            Some(json!({ "provider": "ollama", "capability": "embedding" })),
        )
        .await;
        assert_eq!(body["connected"], false);
        // Unreachable server: reported as disconnected, not as an error.
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/providers/test",
            Some(json!({ "provider": "groq", "capability": "embedding" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "groq does not support embedding");
    }
}
