//! Chat-completion client for any `ProviderKind`.

use async_trait::async_trait;
use tracing::{error, info};

use super::kind::{ConnectionCheck, ProviderKind};
use super::prompts::connection_test_request;
use super::transport::{ProviderConfig, Transport};
use super::wire;
use super::{CompletionRequest, CompletionResult, InferenceModel, ModelCapability, ProviderError};

pub struct InferenceClient {
    transport: Transport,
    model: String,
}

impl InferenceClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let transport = Transport::new(&config)?;
        let model = config
            .model
            .unwrap_or_else(|| config.kind.default_inference_model().to_string());

        info!(
            provider = %config.kind,
            model = %model,
            base_url = transport.base_url(),
            "Initialized inference client"
        );

        Ok(Self { transport, model })
    }

    pub fn kind(&self) -> ProviderKind {
        self.transport.kind()
    }

    /// Completes `request` without the aggregator's error degradation:
    /// every failure is returned as an error.
    pub async fn try_complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResult, ProviderError> {
        let wire_format = self.transport.profile().chat;
        let model = request.model().unwrap_or(&self.model);

        let body = wire::chat_body(wire_format, model, request);
        let response = self
            .transport
            .post_json(&wire::chat_path(wire_format, model), model, &body)
            .await?;

        let content =
            wire::parse_chat(wire_format, response).map_err(|detail| {
                ProviderError::MalformedResponse {
                    provider: self.kind(),
                    detail,
                }
            })?;

        Ok(CompletionResult::assistant(content))
    }
}

#[async_trait]
impl ModelCapability for InferenceClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn test_connection(&self) -> bool {
        info!(provider = %self.kind(), model = %self.model, "Testing inference connection...");

        let result = match self.try_complete(&connection_test_request()).await {
            Ok(result) => result,
            Err(e) => {
                error!(provider = %self.kind(), "Inference connection test failed: {e}");
                return false;
            }
        };

        let success = match self.transport.profile().connection_check {
            ConnectionCheck::NonEmpty => !result.content.is_empty(),
            ConnectionCheck::Contains(needle) => result.content.to_lowercase().contains(needle),
        };
        info!(
            provider = %self.kind(),
            "Inference connection test {}",
            if success { "successful" } else { "failed" }
        );
        success
    }
}

#[async_trait]
impl InferenceModel for InferenceClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResult, ProviderError> {
        match self.try_complete(request).await {
            Ok(result) => Ok(result),
            Err(e) if self.transport.profile().degrade_on_error => {
                error!(provider = %self.kind(), "Completion failed: {e}");
                Ok(CompletionResult::assistant(format!("Error: {e}")))
            }
            Err(e) => {
                error!(provider = %self.kind(), "Completion failed: {e}");
                Err(e)
            }
        }
    }
}
