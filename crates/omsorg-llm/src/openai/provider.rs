//! Non-streaming chat completions client implementing [`Gateway`].

use async_trait::async_trait;
use omsorg_core::messages::PromptMessage;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER};
use tracing::{debug, instrument, warn};

use crate::gateway::{Completion, Gateway, GatewayError, GatewayResult};

use super::types::{ChatRequest, ChatResponse, ErrorResponse, OpenAiConfig};

/// Fallback backoff when a 429 carries no usable `Retry-After` header.
const DEFAULT_RETRY_AFTER_MS: u64 = 5_000;

/// OpenAI-compatible gateway. Cheap to clone; the inner client is pooled.
#[derive(Clone)]
pub struct OpenAiGateway {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiGateway {
    /// Create a gateway with its own HTTP client.
    #[must_use]
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Create a gateway sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(config: OpenAiConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Bearer auth plus JSON content type.
    fn build_headers(&self) -> GatewayResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = format!("Bearer {}", self.config.api_key);
        let mut auth_value = HeaderValue::from_str(&auth_value).map_err(|e| GatewayError::Auth {
            message: format!("invalid API key header: {e}"),
        })?;
        auth_value.set_sensitive(true);
        let _ = headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    /// Map a non-success response to the matching error variant.
    async fn error_for(response: reqwest::Response) -> GatewayError {
        let status = response.status();
        let retry_after_ms = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(DEFAULT_RETRY_AFTER_MS, |secs| secs * 1_000);

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| {
                if body.is_empty() {
                    status.to_string()
                } else {
                    body
                }
            });

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Auth { message },
            StatusCode::TOO_MANY_REQUESTS => GatewayError::RateLimited {
                retry_after_ms,
                message,
            },
            _ => GatewayError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl Gateway for OpenAiGateway {
    #[instrument(skip(self, prompt), fields(model = %self.config.model, turns = prompt.len()))]
    async fn complete(&self, prompt: &[PromptMessage]) -> GatewayResult<Completion> {
        let url = format!("{}/chat/completions", self.config.base_url());
        let request = ChatRequest {
            model: &self.config.model,
            messages: prompt,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&url)
            .headers(self.build_headers()?)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = Self::error_for(response).await;
            warn!(error = %err, "completion request failed");
            return Err(err);
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.is_empty());
        let model = body.model.unwrap_or_else(|| self.config.model.clone());

        debug!(
            content_len = content.as_deref().map_or(0, str::len),
            "completion received"
        );
        Ok(Completion { content, model })
    }
}
