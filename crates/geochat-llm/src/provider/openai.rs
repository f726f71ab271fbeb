//! OpenAI-compatible provider implementation

use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use geochat_config::LlmConfig;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{Provider, ProviderStream};
use crate::convert::openai::openai_chunk_to_events;
use crate::error::LlmError;
use crate::protocol::openai::{OpenAiErrorResponse, OpenAiRequest, OpenAiResponse, OpenAiStreamChunk};
use crate::types::{CompletionRequest, CompletionResponse, StreamEvent};

/// Default `OpenAI` API base URL
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Whether the provider is the canonical `OpenAI` API (vs a compatible third-party)
fn is_canonical_openai(base_url: &Url) -> bool {
    base_url.host_str().is_some_and(|h| h == "api.openai.com")
}

/// OpenAI-compatible provider
pub struct OpenAiProvider {
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    request_timeout: Option<Duration>,
}

impl OpenAiProvider {
    /// Create from the `[llm]` configuration section
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Internal` if the request timeout is malformed or the
    /// HTTP client cannot be built
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded default base URL is invalid (should never happen)
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| Url::parse(DEFAULT_BASE_URL).expect("valid default URL"));

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| LlmError::Internal(anyhow::anyhow!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            request_timeout: config.request_timeout()?,
        })
    }

    /// Build the chat completions URL
    fn completions_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/chat/completions")
    }

    fn post(&self, body: &OpenAiRequest) -> RequestBuilder {
        let builder = self.client.post(self.completions_url()).json(body);

        match &self.api_key {
            Some(key) => builder.bearer_auth(key.expose_secret()),
            None => builder,
        }
    }
}

/// Turn a non-success response into the matching error, keeping the provider's message
async fn error_from_response(response: Response) -> LlmError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(http::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok());

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<OpenAiErrorResponse>(&body).map_or(body, |e| e.error.message);

    tracing::warn!(status = %status, error = %message, "model provider returned error");

    LlmError::from_status(status, message, retry_after)
}

/// Map one SSE frame to zero or more stream events
fn frame_to_events(data: &str) -> Vec<Result<StreamEvent, LlmError>> {
    let data = data.trim();
    if data == "[DONE]" {
        return vec![Ok(StreamEvent::Done)];
    }

    match serde_json::from_str::<OpenAiStreamChunk>(data) {
        Ok(chunk) => openai_chunk_to_events(chunk).into_iter().map(Ok).collect(),
        Err(e) => {
            tracing::debug!(error = %e, data = %data, "skipping unparseable SSE chunk");
            Vec::new()
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let mut wire_request = OpenAiRequest::from(request);
        wire_request.stream = None;
        wire_request.stream_options = None;

        let mut builder = self.post(&wire_request);
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = %e, "model request failed");
            LlmError::from(e)
        })?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let wire_response: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Upstream(format!("failed to parse response: {e}")))?;

        Ok(wire_response.into())
    }

    async fn complete_stream(&self, request: &CompletionRequest) -> Result<ProviderStream, LlmError> {
        let mut wire_request = OpenAiRequest::from(request);
        wire_request.stream = Some(true);

        // Compatible deployments often reject the unknown parameter
        if !is_canonical_openai(&self.base_url) {
            wire_request.stream_options = None;
        }

        let response = self.post(&wire_request).send().await.map_err(|e| {
            tracing::error!(error = %e, "model stream request failed");
            LlmError::from(e)
        })?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let events = response
            .bytes_stream()
            .eventsource()
            .map(|result| match result {
                Ok(event) => frame_to_events(&event.data),
                Err(e) => vec![Err(LlmError::Streaming(e.to_string()))],
            })
            .flat_map(futures_util::stream::iter);

        Ok(Box::pin(events))
    }
}
