use std::path::PathBuf;

use thiserror::Error;

/// HTTP statuses that a provider may return for a request that is worth re-issuing.
const TRANSIENT_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Aggregates every failure mode exposed by the relay.
///
/// Configuration, resolution and credential variants always carry the context an
/// operator needs to fix the problem (file path, known names, where to add a key).
/// Provider failures keep the upstream status and message verbatim so callers can
/// decide whether to retry, fall back to another service, or surface the error.
#[derive(Debug, Error)]
pub enum LLMError {
    /// Malformed or invalid service/pricing configuration text.
    #[error("invalid configuration in {}: {message}", .path.display())]
    Config {
        /// File the configuration was read from.
        path: PathBuf,
        /// Parser or validation detail, including line/column when available.
        message: String,
    },
    /// The requested service name is not declared in the service map.
    #[error("unknown service `{name}`; known services: {}", .known.join(", "))]
    UnknownService { name: String, known: Vec<String> },
    /// Neither the request nor the service configuration names a model.
    #[error(
        "model name required: service `{service}` has no `default_model`; pass a model explicitly or add `default_model` to [services.{service}]"
    )]
    ModelRequired { service: String },
    /// The service needs a credential but does not say which key to use.
    #[error(
        "service `{service}` requires a credential but declares no key name; add `key = \"<NAME>\"` under [services.{service}] or set `key_required = false`"
    )]
    MissingKeyField { service: String },
    /// The credential store has no secret under the configured key name.
    #[error(
        "credential `{key}` for service `{service}` not found (available: {}); add `{key}` to the credential store or point [services.{service}].key at an existing entry",
        join_or_none(.available)
    )]
    CredentialNotFound {
        service: String,
        key: String,
        available: Vec<String>,
    },
    /// The credential store itself could not be located.
    #[error(
        "credential store not found at {location} (needed by service `{service}`); create it and add the keys your services reference"
    )]
    CredentialStoreMissing { service: String, location: String },
    /// The service names an adapter kind no adapter is registered for.
    #[error("unknown adapter kind `{kind}`; known adapter kinds: {}", .known.join(", "))]
    UnknownAdapter { kind: String, known: Vec<String> },
    /// Signals validation failures in the canonical request.
    #[error("invalid request: {message}")]
    Validation { message: String },
    /// Network-level failure: connection refused, DNS, reset, unreadable body.
    #[error("transport error: {message}")]
    Transport { message: String },
    /// The provider answered with a non-success HTTP status.
    #[error("provider {provider} returned an error ({status}): {message}")]
    Http {
        /// Adapter name, such as `openai_chat`.
        provider: &'static str,
        /// Numeric HTTP status code.
        status: u16,
        /// Error message extracted from the body, or the raw body.
        message: String,
    },
    /// The provider answered successfully but with a payload we cannot use.
    #[error("provider {provider} error: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },
}

impl LLMError {
    /// Creates an [`LLMError::Transport`] from a textual description.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_relay::error::LLMError;
    ///
    /// let err = LLMError::transport("connection refused");
    /// assert!(err.is_transient());
    /// ```
    pub fn transport<T: Into<String>>(message: T) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates an [`LLMError::Provider`] with the given provider name and message.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_relay::error::LLMError;
    ///
    /// let err = LLMError::provider("openai_chat", "missing choices");
    /// assert!(matches!(err, LLMError::Provider { provider: "openai_chat", .. }));
    /// assert!(!err.is_transient());
    /// ```
    pub fn provider<T: Into<String>>(provider: &'static str, message: T) -> Self {
        Self::Provider {
            provider,
            message: message.into(),
        }
    }

    /// Returns the upstream HTTP status for [`LLMError::Http`] errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` when re-issuing the same request may succeed.
    ///
    /// Network-level failures and the statuses 429, 500, 502, 503 and 504 are
    /// transient. Every other error, including 400/401/403/404 responses, is
    /// permanent.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_relay::error::LLMError;
    ///
    /// let throttled = LLMError::Http { provider: "openai_chat", status: 429, message: "slow down".into() };
    /// let unauthorized = LLMError::Http { provider: "openai_chat", status: 401, message: "bad key".into() };
    /// assert!(throttled.is_transient());
    /// assert!(!unauthorized.is_transient());
    /// ```
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Http { status, .. } => TRANSIENT_STATUSES.contains(status),
            _ => false,
        }
    }
}

fn join_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}
