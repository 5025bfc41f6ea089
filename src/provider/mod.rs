use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LLMError;
use crate::http::DynHttpTransport;
use crate::types::{AdapterRequest, AdapterResponse};

pub mod anthropic_messages;
pub mod google_gemini;
pub mod ollama_generate;
pub mod openai_chat;

use anthropic_messages::AnthropicMessagesAdapter;
use google_gemini::GoogleGeminiAdapter;
use ollama_generate::OllamaGenerateAdapter;
use openai_chat::OpenAiChatAdapter;

/// Translator between the canonical request/response and one provider wire protocol.
///
/// Implementations issue exactly one HTTP call per [`complete`](Self::complete);
/// retrying is the caller's business.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Sends the request and normalizes the reply.
    ///
    /// # Errors
    ///
    /// * [`LLMError::Http`] for non-success statuses, carrying the numeric status.
    /// * [`LLMError::Provider`] when a success response lacks the expected fields.
    /// * [`LLMError::Transport`] for network-level failures.
    async fn complete(&self, request: &AdapterRequest) -> Result<AdapterResponse, LLMError>;

    /// Adapter name used in errors and logs, e.g. `openai_chat`.
    fn name(&self) -> &'static str;
}

/// Thread-safe adapter handle.
pub type DynAdapter = Arc<dyn ProviderAdapter>;

/// Lookup table from adapter kind (the `adapter` field of a service) to adapter.
#[derive(Clone, Default)]
pub struct AdapterSet {
    adapters: HashMap<String, DynAdapter>,
}

impl AdapterSet {
    /// An empty set; see [`builtin`](Self::builtin) for the bundled adapters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the bundled adapters under the kinds `anthropic`, `openai`,
    /// `ollama` and `gemini`, all sharing `transport`.
    pub fn builtin(transport: DynHttpTransport) -> Self {
        Self::new()
            .register(
                "anthropic",
                Arc::new(AnthropicMessagesAdapter::new(transport.clone())),
            )
            .register("openai", Arc::new(OpenAiChatAdapter::new(transport.clone())))
            .register(
                "ollama",
                Arc::new(OllamaGenerateAdapter::new(transport.clone())),
            )
            .register("gemini", Arc::new(GoogleGeminiAdapter::new(transport)))
    }

    /// Adds or replaces the adapter for `kind`.
    pub fn register(mut self, kind: impl Into<String>, adapter: DynAdapter) -> Self {
        self.adapters.insert(kind.into(), adapter);
        self
    }

    /// Registered kinds in sorted order.
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.adapters.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    /// Returns the adapter for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`LLMError::UnknownAdapter`] listing every registered kind.
    pub fn get(&self, kind: &str) -> Result<DynAdapter, LLMError> {
        self.adapters
            .get(kind)
            .cloned()
            .ok_or_else(|| LLMError::UnknownAdapter {
                kind: kind.to_string(),
                known: self.kinds(),
            })
    }
}

/// Appends `path` to `base`, dropping a duplicated version segment such as `/v1`.
pub(crate) fn endpoint(base_url: &str, version: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with(version) {
        format!("{base}{path}")
    } else {
        format!("{base}{version}{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::reqwest::default_dyn_transport;

    #[test]
    fn builtin_set_registers_every_bundled_kind() {
        let set = AdapterSet::builtin(default_dyn_transport().expect("transport"));
        assert_eq!(set.kinds(), vec!["anthropic", "gemini", "ollama", "openai"]);
        assert_eq!(set.get("anthropic").expect("anthropic").name(), "anthropic_messages");
        assert_eq!(set.get("openai").expect("openai").name(), "openai_chat");
        assert_eq!(set.get("ollama").expect("ollama").name(), "ollama_generate");
        assert_eq!(set.get("gemini").expect("gemini").name(), "google_gemini");
    }

    #[test]
    fn unknown_kind_fails_with_known_kinds() {
        let set = AdapterSet::builtin(default_dyn_transport().expect("transport"));
        let err = match set.get("cohere") {
            Ok(_) => panic!("expected unknown adapter error"),
            Err(err) => err,
        };
        let message = err.to_string();
        assert!(message.contains("cohere"), "{message}");
        for kind in ["anthropic", "gemini", "ollama", "openai"] {
            assert!(message.contains(kind), "missing {kind} in: {message}");
        }
    }

    #[test]
    fn endpoint_does_not_duplicate_version_segment() {
        assert_eq!(
            endpoint("https://api.openai.com/", "/v1", "/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            endpoint("https://proxy.local/v1", "/v1", "/chat/completions"),
            "https://proxy.local/v1/chat/completions"
        );
        assert_eq!(
            endpoint("http://localhost:11434", "/api", "/generate"),
            "http://localhost:11434/api/generate"
        );
    }
}
