//! The relay entry point: one prompt in, one normalized result out.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{PRICING_FILE, ServiceRegistry, config_dir};
use crate::credentials::{CredentialProvider, EnvCredentials, resolve_credential};
use crate::error::LLMError;
use crate::http::reqwest::default_dyn_transport;
use crate::pricing::PriceTable;
use crate::provider::AdapterSet;
use crate::retry::{RetryPolicy, with_retry};
use crate::types::{AdapterRequest, CompletionRequest, CompletionResult};

/// Help text for command-line front ends built on the relay.
pub const USAGE: &str = "\
llm-relay: send one prompt to a configured LLM service

USAGE:
    complete <JSON request>    run one completion and print the result as JSON
    list                       print the default service and every configured service

REQUEST FIELDS:
    prompt            text to complete (required)
    service           service name from services.toml (default: default_service)
    model             model name (default: the service's default_model)
    systemPrompt      optional system instruction
    temperature       sampling temperature between 0 and 1
    maxOutputTokens   cap on generated tokens
    jsonMode          ask the provider for a JSON object answer

FILES:
    $LLM_RELAY_HOME/services.toml   service map, created with defaults when missing
    $LLM_RELAY_HOME/pricing.toml    optional per-model rates in USD per million tokens

LLM_RELAY_HOME defaults to the platform config directory joined with `llm-relay`.
";

/// Result of [`Relay::list_services`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceListing {
    pub default_service: String,
    /// Sorted by name.
    pub services: Vec<String>,
}

/// Composes service resolution, credentials, adapters, retries and pricing.
///
/// A `Relay` is cheap to share behind an `Arc` and safe to call concurrently; the
/// only state shared between calls is the cached service map and the price table.
pub struct Relay {
    registry: Arc<ServiceRegistry>,
    credentials: Arc<dyn CredentialProvider>,
    adapters: AdapterSet,
    pricing: PriceTable,
    retry: RetryPolicy,
}

impl Relay {
    pub fn builder() -> RelayBuilder {
        RelayBuilder::default()
    }

    /// Relay over the default config directory, environment credentials and the
    /// bundled adapters on a reqwest transport.
    ///
    /// # Errors
    ///
    /// Fails when no config directory can be determined or the HTTP client cannot be
    /// built. The service map itself is read lazily on the first call.
    pub fn from_default_config() -> Result<Self, LLMError> {
        let dir = config_dir()?;
        Self::builder()
            .registry(Arc::new(ServiceRegistry::from_default_location()?))
            .pricing(PriceTable::load(&dir.join(PRICING_FILE)))
            .build()
    }

    /// Shared service registry, e.g. to [`reset`](ServiceRegistry::reset) it.
    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Runs one completion.
    ///
    /// Configuration, credential and model errors are raised before any network
    /// call. Provider errors are returned exactly as the adapter produced them once
    /// the retry policy gives up.
    pub async fn complete(&self, request: CompletionRequest) -> Result<CompletionResult, LLMError> {
        let started = Instant::now();

        let service = self.registry.resolve(request.service.as_deref())?;
        let credential = resolve_credential(&service, self.credentials.as_ref())?;
        let adapter = self.adapters.get(&service.config.adapter)?;

        let model = request
            .model
            .filter(|model| !model.trim().is_empty())
            .or_else(|| service.config.default_model.clone())
            .filter(|model| !model.trim().is_empty())
            .ok_or_else(|| LLMError::ModelRequired {
                service: service.name.clone(),
            })?;
        validate_temperature(request.temperature)?;

        let adapter_request = AdapterRequest {
            base_url: service.config.base_url.clone(),
            credential,
            model,
            prompt: request.prompt,
            system_prompt: request.system_prompt,
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
            json_mode: request.json_mode,
        };
        debug!(
            service = %service.name,
            adapter = adapter.name(),
            model = %adapter_request.model,
            "dispatching completion"
        );

        let adapter = adapter.as_ref();
        let outgoing = &adapter_request;
        let response = with_retry(move || adapter.complete(outgoing), &self.retry).await?;

        let model = response
            .model
            .filter(|model| !model.is_empty())
            .unwrap_or_else(|| adapter_request.model.clone());
        let estimated_cost_usd = self
            .pricing
            .estimate(&model, response.tokens.input, response.tokens.output)
            .or_else(|| {
                self.pricing.estimate(
                    &adapter_request.model,
                    response.tokens.input,
                    response.tokens.output,
                )
            });

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(
            service = %service.name,
            model = %model,
            input_tokens = response.tokens.input,
            output_tokens = response.tokens.output,
            duration_ms,
            "completion finished"
        );

        Ok(CompletionResult {
            text: response.text,
            model,
            provider: service.config.adapter,
            tokens: response.tokens,
            finish_reason: response.finish_reason,
            duration_ms,
            estimated_cost_usd,
        })
    }

    /// Default service and every configured service name.
    pub fn list_services(&self) -> Result<ServiceListing, LLMError> {
        let map = self.registry.load()?;
        Ok(ServiceListing {
            default_service: map.default_service.clone(),
            services: map.names(),
        })
    }
}

fn validate_temperature(temperature: Option<f64>) -> Result<(), LLMError> {
    match temperature {
        Some(value) if !(0.0..=1.0).contains(&value) => Err(LLMError::Validation {
            message: format!("temperature must be between 0 and 1, got {value}"),
        }),
        _ => Ok(()),
    }
}

/// Builder for [`Relay`]; anything left unset falls back to the defaults of
/// [`Relay::from_default_config`], except pricing which defaults to an empty table.
#[derive(Default)]
pub struct RelayBuilder {
    registry: Option<Arc<ServiceRegistry>>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    adapters: Option<AdapterSet>,
    pricing: PriceTable,
    retry: RetryPolicy,
}

impl RelayBuilder {
    pub fn registry(mut self, registry: Arc<ServiceRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn adapters(mut self, adapters: AdapterSet) -> Self {
        self.adapters = Some(adapters);
        self
    }

    pub fn pricing(mut self, pricing: PriceTable) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn build(self) -> Result<Relay, LLMError> {
        let registry = match self.registry {
            Some(registry) => registry,
            None => Arc::new(ServiceRegistry::from_default_location()?),
        };
        let adapters = match self.adapters {
            Some(adapters) => adapters,
            None => AdapterSet::builtin(default_dyn_transport()?),
        };
        Ok(Relay {
            registry,
            credentials: self
                .credentials
                .unwrap_or_else(|| Arc::new(EnvCredentials)),
            adapters,
            pricing: self.pricing,
            retry: self.retry,
        })
    }
}
