use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::LLMError;
use crate::http::{DynHttpTransport, HttpResponse, post_json_with_headers};
use crate::provider::ProviderAdapter;
use crate::types::{AdapterRequest, AdapterResponse};

use super::error::parse_gemini_error;
use super::request::build_gemini_body;
use super::response::map_response;
use super::types::GeminiGenerateContentResponse;

/// Google Gemini GenerateContent adapter.
pub struct GoogleGeminiAdapter {
    transport: DynHttpTransport,
}

impl GoogleGeminiAdapter {
    pub fn new(transport: DynHttpTransport) -> Self {
        Self { transport }
    }

    /// Builds the non-streaming endpoint URL for GenerateContent.
    pub(crate) fn endpoint(base_url: &str, model: &str) -> String {
        let base = base_url.trim_end_matches('/');
        let model_path = normalize_model(model);
        if base.ends_with("/v1beta") {
            format!("{base}/{model_path}:generateContent")
        } else {
            format!("{base}/v1beta/{model_path}:generateContent")
        }
    }

    fn build_headers(request: &AdapterRequest) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        if let Some(credential) = &request.credential {
            headers.insert(
                "x-goog-api-key".to_string(),
                credential.expose_secret().to_string(),
            );
        }
        headers
    }

    fn ensure_success(&self, response: HttpResponse) -> Result<String, LLMError> {
        response.into_text(self.name(), parse_gemini_error)
    }

    fn try_parse<T: DeserializeOwned>(&self, text: &str) -> Result<T, LLMError> {
        serde_json::from_str(text).map_err(|err| {
            LLMError::provider(self.name(), format!("failed to parse Gemini response: {err}"))
        })
    }
}

/// Accepts both `gemini-2.0-flash` and `models/gemini-2.0-flash`.
fn normalize_model(model: &str) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

#[async_trait]
impl ProviderAdapter for GoogleGeminiAdapter {
    async fn complete(&self, request: &AdapterRequest) -> Result<AdapterResponse, LLMError> {
        let url = Self::endpoint(&request.base_url, &request.model);
        debug!(%url, "sending Gemini generateContent");
        let response = post_json_with_headers(
            self.transport.as_ref(),
            url,
            Self::build_headers(request),
            &build_gemini_body(request),
        )
        .await?;
        let text = self.ensure_success(response)?;
        let parsed: GeminiGenerateContentResponse = self.try_parse(&text)?;
        map_response(parsed, self.name())
    }

    fn name(&self) -> &'static str {
        "google_gemini"
    }
}
