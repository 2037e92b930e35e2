//! Embedding client for the providers that expose an embedding endpoint.

use async_trait::async_trait;
use tracing::{error, info};

use super::kind::{EmbedWire, ProviderKind};
use super::prompts::CONNECTION_TEST_EMBED_TEXT;
use super::transport::{ProviderConfig, Transport};
use super::wire;
use super::{Capability, EmbeddingModel, EmbeddingResult, ModelCapability, ProviderError};

pub struct EmbeddingClient {
    transport: Transport,
    wire_format: EmbedWire,
    model: String,
}

impl EmbeddingClient {
    /// Fails with `Unsupported` for providers without an embedding endpoint.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let profile = config.kind.profile();
        let (wire_format, default_model) = match (profile.embed, profile.default_embedding_model)
        {
            (Some(wire_format), Some(model)) => (wire_format, model),
            _ => {
                return Err(ProviderError::Unsupported {
                    provider: config.kind,
                    capability: Capability::Embedding,
                })
            }
        };

        let transport = Transport::new(&config)?;
        let model = config.model.unwrap_or_else(|| default_model.to_string());

        info!(
            provider = %config.kind,
            model = %model,
            base_url = transport.base_url(),
            "Initialized embedding client"
        );

        Ok(Self {
            transport,
            wire_format,
            model,
        })
    }

    pub fn kind(&self) -> ProviderKind {
        self.transport.kind()
    }
}

#[async_trait]
impl ModelCapability for EmbeddingClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn test_connection(&self) -> bool {
        info!(provider = %self.kind(), model = %self.model, "Testing embedding connection...");

        match self.embed(&[CONNECTION_TEST_EMBED_TEXT.to_string()]).await {
            Ok(result) => {
                let success = result.dimensions() > 0;
                info!(
                    provider = %self.kind(),
                    "Embedding connection test {}",
                    if success { "successful" } else { "failed" }
                );
                success
            }
            Err(e) => {
                error!(provider = %self.kind(), "Embedding connection test failed: {e}");
                false
            }
        }
    }
}

#[async_trait]
impl EmbeddingModel for EmbeddingClient {
    async fn embed(&self, texts: &[String]) -> Result<EmbeddingResult, ProviderError> {
        if texts.is_empty() {
            return Ok(EmbeddingResult::default());
        }

        let body = wire::embed_body(self.wire_format, &self.model, texts);
        let response = self
            .transport
            .post_json(
                &wire::embed_path(self.wire_format, &self.model),
                &self.model,
                &body,
            )
            .await
            .inspect_err(|e| error!(provider = %self.kind(), "Embedding failed: {e}"))?;

        let vectors = wire::parse_embeddings(self.wire_format, response, texts.len())
            .map_err(|detail| ProviderError::MalformedResponse {
                provider: self.kind(),
                detail,
            })?;

        Ok(EmbeddingResult { vectors })
    }
}
