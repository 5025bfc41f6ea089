use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::LLMError;
use crate::http::{DynHttpTransport, HttpResponse, post_json_with_headers};
use crate::provider::{ProviderAdapter, endpoint};
use crate::types::{AdapterRequest, AdapterResponse};

use super::error::parse_anthropic_error;
use super::request::build_anthropic_body;
use super::response::map_response;
use super::types::AnthropicMessageResponse;

const API_VERSION: &str = "2023-06-01";

/// Anthropic Messages adapter.
pub struct AnthropicMessagesAdapter {
    transport: DynHttpTransport,
    version: String,
}

impl AnthropicMessagesAdapter {
    pub fn new(transport: DynHttpTransport) -> Self {
        Self {
            transport,
            version: API_VERSION.to_string(),
        }
    }

    /// Overrides the `anthropic-version` header.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub(crate) fn endpoint(base_url: &str) -> String {
        endpoint(base_url, "/v1", "/messages")
    }

    fn build_headers(&self, request: &AdapterRequest) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("Accept".to_string(), "application/json".to_string());
        headers.insert("anthropic-version".to_string(), self.version.clone());
        if let Some(credential) = &request.credential {
            headers.insert(
                "x-api-key".to_string(),
                credential.expose_secret().to_string(),
            );
        }
        headers
    }

    fn ensure_success(&self, response: HttpResponse) -> Result<String, LLMError> {
        response.into_text(self.name(), parse_anthropic_error)
    }

    fn try_parse<T: DeserializeOwned>(&self, text: &str) -> Result<T, LLMError> {
        serde_json::from_str(text).map_err(|err| {
            LLMError::provider(
                self.name(),
                format!("failed to parse Anthropic response: {err}"),
            )
        })
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicMessagesAdapter {
    async fn complete(&self, request: &AdapterRequest) -> Result<AdapterResponse, LLMError> {
        let url = Self::endpoint(&request.base_url);
        debug!(%url, model = %request.model, "sending Anthropic message");
        let response = post_json_with_headers(
            self.transport.as_ref(),
            url,
            self.build_headers(request),
            &build_anthropic_body(request),
        )
        .await?;
        let text = self.ensure_success(response)?;
        let parsed: AnthropicMessageResponse = self.try_parse(&text)?;
        map_response(parsed, self.name())
    }

    fn name(&self) -> &'static str {
        "anthropic_messages"
    }
}
