use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::LLMError;
use crate::http::{DynHttpTransport, HttpResponse, post_json_with_headers};
use crate::provider::{ProviderAdapter, endpoint};
use crate::types::{AdapterRequest, AdapterResponse};

use super::error::parse_openai_error;
use super::request::build_openai_body;
use super::response::map_response;
use super::types::OpenAiChatResponse;

/// OpenAI Chat Completions adapter.
pub struct OpenAiChatAdapter {
    transport: DynHttpTransport,
}

impl OpenAiChatAdapter {
    pub fn new(transport: DynHttpTransport) -> Self {
        Self { transport }
    }

    pub(crate) fn endpoint(base_url: &str) -> String {
        endpoint(base_url, "/v1", "/chat/completions")
    }

    fn build_headers(request: &AdapterRequest) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("Accept".to_string(), "application/json".to_string());
        if let Some(credential) = &request.credential {
            headers.insert(
                "Authorization".to_string(),
                format!("Bearer {}", credential.expose_secret()),
            );
        }
        headers
    }

    fn ensure_success(&self, response: HttpResponse) -> Result<String, LLMError> {
        response.into_text(self.name(), parse_openai_error)
    }

    fn try_parse<T: DeserializeOwned>(&self, text: &str) -> Result<T, LLMError> {
        serde_json::from_str(text).map_err(|err| {
            LLMError::provider(self.name(), format!("failed to parse OpenAI response: {err}"))
        })
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiChatAdapter {
    async fn complete(&self, request: &AdapterRequest) -> Result<AdapterResponse, LLMError> {
        let url = Self::endpoint(&request.base_url);
        debug!(%url, model = %request.model, "sending OpenAI chat completion");
        let response = post_json_with_headers(
            self.transport.as_ref(),
            url,
            Self::build_headers(request),
            &build_openai_body(request),
        )
        .await?;
        let text = self.ensure_success(response)?;
        let parsed: OpenAiChatResponse = self.try_parse(&text)?;
        map_response(parsed, self.name())
    }

    fn name(&self) -> &'static str {
        "openai_chat"
    }
}
