use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::analysis::JobAnalyzer;
use crate::config::Config;
use crate::providers::{EmbeddingClient, InferenceClient, ProviderConfig, ProviderKind};
use crate::settings::{ConfigStore, StoreError};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Postgres-backed when `DATABASE_URL` is set, in-memory otherwise.
    pub store: Arc<dyn ConfigStore>,
    pub analyzer: Arc<JobAnalyzer>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn ConfigStore>, analyzer: JobAnalyzer, config: Config) -> Self {
        Self {
            store,
            analyzer: Arc::new(analyzer),
            config,
        }
    }

    /// Client configuration for `kind`, with its credential resolved.
    pub async fn provider_config(
        &self,
        kind: ProviderKind,
        model: Option<String>,
    ) -> Result<ProviderConfig, StoreError> {
        provider_config(&self.config, self.store.as_ref(), kind, model).await
    }
}

/// Credential for `kind`: the environment first, then the most recently
/// updated active API key stored under the provider's label.
pub async fn resolve_credential(
    config: &Config,
    store: &dyn ConfigStore,
    kind: ProviderKind,
) -> Result<Option<String>, StoreError> {
    if !kind.requires_credential() {
        return Ok(None);
    }
    if let Some(key) = config.credentials.get(kind) {
        return Ok(Some(key.to_string()));
    }
    store.active_secret(kind.label()).await
}

pub async fn provider_config(
    config: &Config,
    store: &dyn ConfigStore,
    kind: ProviderKind,
    model: Option<String>,
) -> Result<ProviderConfig, StoreError> {
    let mut provider = ProviderConfig::new(kind).with_timeout(config.provider_timeout);
    if kind == ProviderKind::Ollama {
        provider = provider.with_base_url(config.ollama_base_url.clone());
    }
    if let Some(key) = resolve_credential(config, store, kind).await? {
        provider = provider.with_api_key(key);
    }
    if let Some(model) = model {
        provider = provider.with_model(model);
    }
    Ok(provider)
}

/// Builds the analyzer from `EMBEDDING_PROVIDER` / `INFERENCE_PROVIDER`.
pub async fn build_analyzer(config: &Config, store: &dyn ConfigStore) -> Result<JobAnalyzer> {
    let embedding = provider_config(
        config,
        store,
        config.embedding_provider,
        config.embedding_model.clone(),
    )
    .await?;
    let inference = provider_config(
        config,
        store,
        config.inference_provider,
        config.inference_model.clone(),
    )
    .await?;

    if config.embedding_provider != config.inference_provider {
        warn!(
            "Embedding ({}) and inference ({}) use different providers",
            config.embedding_provider, config.inference_provider
        );
    }

    let embedder = EmbeddingClient::new(embedding)?;
    let inference = InferenceClient::new(inference)?;
    let analyzer = JobAnalyzer::new(Arc::new(embedder), Arc::new(inference));
    info!(
        "Job analyzer ready (embedding: {}, inference: {})",
        analyzer.embedding_model(),
        analyzer.inference_model()
    );
    Ok(analyzer)
}
