use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::LLMError;
use crate::http::{DynHttpTransport, HttpResponse, post_json_with_headers};
use crate::provider::{ProviderAdapter, endpoint};
use crate::types::{AdapterRequest, AdapterResponse};

use super::error::parse_ollama_error;
use super::request::build_ollama_body;
use super::response::map_response;
use super::types::OllamaGenerateResponse;

/// Ollama `/api/generate` adapter.
pub struct OllamaGenerateAdapter {
    transport: DynHttpTransport,
}

impl OllamaGenerateAdapter {
    pub fn new(transport: DynHttpTransport) -> Self {
        Self { transport }
    }

    pub(crate) fn endpoint(base_url: &str) -> String {
        endpoint(base_url, "/api", "/generate")
    }

    /// Local servers need no auth; a credential is forwarded for proxied setups.
    fn build_headers(request: &AdapterRequest) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        if let Some(credential) = &request.credential {
            headers.insert(
                "Authorization".to_string(),
                format!("Bearer {}", credential.expose_secret()),
            );
        }
        headers
    }

    fn ensure_success(&self, response: HttpResponse) -> Result<String, LLMError> {
        response.into_text(self.name(), parse_ollama_error)
    }

    fn try_parse<T: DeserializeOwned>(&self, text: &str) -> Result<T, LLMError> {
        serde_json::from_str(text).map_err(|err| {
            LLMError::provider(self.name(), format!("failed to parse Ollama response: {err}"))
        })
    }
}

#[async_trait]
impl ProviderAdapter for OllamaGenerateAdapter {
    async fn complete(&self, request: &AdapterRequest) -> Result<AdapterResponse, LLMError> {
        let url = Self::endpoint(&request.base_url);
        debug!(%url, model = %request.model, "sending Ollama generate");
        let response = post_json_with_headers(
            self.transport.as_ref(),
            url,
            Self::build_headers(request),
            &build_ollama_body(request),
        )
        .await?;
        let text = self.ensure_success(response)?;
        let parsed: OllamaGenerateResponse = self.try_parse(&text)?;
        map_response(parsed, self.name())
    }

    fn name(&self) -> &'static str {
        "ollama_generate"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_accepts_bare_host_and_api_suffix() {
        assert_eq!(
            OllamaGenerateAdapter::endpoint("http://localhost:11434"),
            "http://localhost:11434/api/generate"
        );
        assert_eq!(
            OllamaGenerateAdapter::endpoint("http://gpu-box:11434/api/"),
            "http://gpu-box:11434/api/generate"
        );
    }
}
