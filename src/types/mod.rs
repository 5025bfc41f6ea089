//! Canonical request and response shapes shared by every provider.
//!
//! Callers only ever see [`CompletionRequest`] and [`CompletionResult`]. Adapters
//! work with the narrower [`AdapterRequest`] / [`AdapterResponse`] pair, which the
//! orchestrator fills in after the service, credential and model are resolved.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// One "complete a prompt" request.
///
/// # Examples
///
/// ```
/// use llm_relay::types::CompletionRequest;
///
/// let request = CompletionRequest::new("Summarize the release notes")
///     .with_service("ollama")
///     .with_system_prompt("You are terse.")
///     .with_temperature(0.2);
/// assert_eq!(request.service.as_deref(), Some("ollama"));
/// assert!(request.model.is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    /// User prompt, sent verbatim.
    pub prompt: String,
    /// Service name from the service map; the default service when absent.
    #[serde(default, alias = "serviceName")]
    pub service: Option<String>,
    /// Model override; the service's `default_model` when absent.
    #[serde(default)]
    pub model: Option<String>,
    /// Optional system instruction.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Sampling temperature in `0.0..=1.0`.
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Upper bound on generated tokens.
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    /// Ask the provider for JSON output where the protocol supports it.
    #[serde(default, alias = "jsonModeHint")]
    pub json_mode: bool,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }
}

/// Normalized reason a provider stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of output, or any provider signal without a dedicated mapping.
    Stop,
    /// The output token cap was reached.
    MaxTokens,
    /// The provider refused or filtered the output.
    Error,
}

/// Token usage reported by the provider; missing counts are `0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounts {
    pub input: u64,
    pub output: u64,
}

/// Envelope returned for every completion regardless of provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResult {
    /// Generated text exactly as the provider returned it.
    pub text: String,
    /// Model the provider reports having run.
    pub model: String,
    /// Adapter kind of the service that handled the request.
    pub provider: String,
    pub tokens: TokenCounts,
    pub finish_reason: FinishReason,
    /// Wall-clock time from service resolution through cost estimation.
    pub duration_ms: u64,
    /// `None` when the model has no entry in the price table.
    pub estimated_cost_usd: Option<f64>,
}

/// Request handed to a [`crate::provider::ProviderAdapter`].
///
/// Everything the adapter needs is resolved up front; adapters keep no per-service
/// state of their own.
#[derive(Debug)]
pub struct AdapterRequest {
    /// Service endpoint root, e.g. `https://api.openai.com`.
    pub base_url: String,
    /// Secret for the auth header; `None` for credential-free services.
    pub credential: Option<SecretString>,
    pub model: String,
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
    pub json_mode: bool,
}

/// Provider reply after protocol-specific parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterResponse {
    /// Generated text, untrimmed.
    pub text: String,
    /// Model string echoed by the provider, if any.
    pub model: Option<String>,
    pub tokens: TokenCounts,
    /// Finish signal as the provider spelled it.
    pub native_finish_reason: Option<String>,
    pub finish_reason: FinishReason,
}
