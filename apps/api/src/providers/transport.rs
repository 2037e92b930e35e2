//! Shared HTTP plumbing for provider clients: base URL, credential,
//! per-request timeout and the 429 backoff policy.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, Secret};
use serde_json::Value;
use tracing::{debug, warn};

use super::kind::{AuthScheme, ProviderKind, ProviderProfile};
use super::ProviderError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Bounded exponential backoff applied to 429s and timeouts from hosted
/// providers: `initial_delay`, doubling, `max_attempts` calls in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
        }
    }
}

/// Construction-time configuration for a provider client.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout: Duration,
    pub rate_limit: RateLimitPolicy,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            base_url: None,
            api_key: None,
            model: None,
            timeout: DEFAULT_TIMEOUT,
            rate_limit: RateLimitPolicy::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_rate_limit(mut self, policy: RateLimitPolicy) -> Self {
        self.rate_limit = policy;
        self
    }
}

pub(crate) struct Transport {
    kind: ProviderKind,
    profile: ProviderProfile,
    client: Client,
    base_url: String,
    credential: Option<Secret<String>>,
    rate_limit: RateLimitPolicy,
}

impl Transport {
    pub(crate) fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let profile = config.kind.profile();

        let credential = match (&config.api_key, profile.auth) {
            (_, AuthScheme::None) => None,
            (Some(key), _) if !key.trim().is_empty() => Some(Secret::new(key.clone())),
            _ => return Err(ProviderError::MissingCredential(config.kind)),
        };

        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(profile.base_url)
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            kind: config.kind,
            profile,
            client,
            base_url,
            credential,
            rate_limit: config.rate_limit,
        })
    }

    pub(crate) fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub(crate) fn profile(&self) -> &ProviderProfile {
        &self.profile
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POSTs `body` to `path` and returns the decoded JSON body.
    /// Hosted providers retry 429s and timeouts with exponential backoff.
    pub(crate) async fn post_json(
        &self,
        path: &str,
        model: &str,
        body: &Value,
    ) -> Result<Value, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let attempts = if self.profile.rate_limited {
            self.rate_limit.max_attempts.max(1)
        } else {
            1
        };
        let mut delay = self.rate_limit.initial_delay;

        let mut attempt = 1;
        loop {
            match self.send_once(&url, model, body).await {
                Err(e) if e.is_rate_limit_retryable() && attempt < attempts => {
                    warn!(
                        provider = %self.kind,
                        "Attempt {}/{} failed ({}), retrying after {}ms...",
                        attempt,
                        attempts,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn send_once(&self, url: &str, model: &str, body: &Value) -> Result<Value, ProviderError> {
        let request = self.authorize(self.client.post(url), model).json(body);

        let response = request.send().await.map_err(classify)?;
        let status = response.status();

        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await.map_err(classify)?;
        debug!(provider = %self.kind, model, bytes = text.len(), "Provider call succeeded");

        serde_json::from_str(&text).map_err(|e| ProviderError::MalformedResponse {
            provider: self.kind,
            detail: format!("response is not valid JSON: {e}"),
        })
    }

    fn authorize(&self, mut request: RequestBuilder, model: &str) -> RequestBuilder {
        if let Some(secret) = &self.credential {
            request = match self.profile.auth {
                AuthScheme::Bearer => request.bearer_auth(secret.expose_secret()),
                AuthScheme::GoogleApiKey => {
                    request.header("x-goog-api-key", secret.expose_secret())
                }
                AuthScheme::None => request,
            };
        }
        for (name, value) in self.profile.headers {
            request = request.header(*name, *value);
        }
        if let Some(name) = self.profile.model_header {
            request = request.header(name, model);
        }
        request
    }
}

fn classify(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Http(e)
    }
}
