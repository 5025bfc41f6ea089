//! Credential lookup for services that need an API key.
//!
//! The relay does not own a secret store. It talks to a [`CredentialProvider`]
//! and turns that provider's failures into errors that say where to add what.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

use crate::config::NamedService;
use crate::error::LLMError;

/// Failure conditions a credential store can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialLookupError {
    #[error("key `{key}` not found")]
    KeyNotFound {
        key: String,
        /// Names the store does hold, for the operator's benefit.
        available: Vec<String>,
    },
    #[error("credential store not found at {location}")]
    StoreNotFound { location: String },
    /// The store exists but its contents cannot be read as key/secret pairs.
    #[error("credential store at {location} is unreadable: {message}")]
    StoreUnreadable { location: String, message: String },
}

/// External secret lookup keyed by a logical name.
pub trait CredentialProvider: Send + Sync {
    fn get(&self, key: &str) -> Result<SecretString, CredentialLookupError>;
}

/// Loads the credential a service needs.
///
/// Returns `Ok(None)` for services with `key_required = false`.
///
/// # Errors
///
/// * [`LLMError::MissingKeyField`] when a credential is required but no `key` is configured.
/// * [`LLMError::CredentialNotFound`] / [`LLMError::CredentialStoreMissing`] when the
///   provider cannot supply it.
pub fn resolve_credential(
    service: &NamedService,
    provider: &dyn CredentialProvider,
) -> Result<Option<SecretString>, LLMError> {
    if !service.config.key_required {
        return Ok(None);
    }
    let key = service
        .config
        .key
        .as_deref()
        .ok_or_else(|| LLMError::MissingKeyField {
            service: service.name.clone(),
        })?;

    provider
        .get(key)
        .map(Some)
        .map_err(|err| match err {
            CredentialLookupError::KeyNotFound { key, available } => LLMError::CredentialNotFound {
                service: service.name.clone(),
                key,
                available,
            },
            CredentialLookupError::StoreNotFound { location } => LLMError::CredentialStoreMissing {
                service: service.name.clone(),
                location,
            },
            CredentialLookupError::StoreUnreadable { location, message } => LLMError::Config {
                path: PathBuf::from(location),
                message,
            },
        })
}

/// Reads credentials from process environment variables named by the key.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvCredentials;

impl CredentialProvider for EnvCredentials {
    fn get(&self, key: &str) -> Result<SecretString, CredentialLookupError> {
        match std::env::var(key) {
            Ok(value) if !value.is_empty() => Ok(SecretString::from(value)),
            _ => {
                let mut available: Vec<String> = std::env::vars_os()
                    .filter_map(|(name, _)| name.into_string().ok())
                    .filter(|name| name.ends_with("_API_KEY") || name.ends_with("_TOKEN"))
                    .collect();
                available.sort();
                Err(CredentialLookupError::KeyNotFound {
                    key: key.to_string(),
                    available,
                })
            }
        }
    }
}

/// In-memory credentials, handy for embedding and tests.
#[derive(Debug, Default, Clone)]
pub struct StaticCredentials {
    secrets: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.secrets.insert(key.into(), secret.into());
        self
    }
}

impl CredentialProvider for StaticCredentials {
    fn get(&self, key: &str) -> Result<SecretString, CredentialLookupError> {
        self.secrets
            .get(key)
            .map(|secret| SecretString::from(secret.clone()))
            .ok_or_else(|| {
                let mut available: Vec<String> = self.secrets.keys().cloned().collect();
                available.sort();
                CredentialLookupError::KeyNotFound {
                    key: key.to_string(),
                    available,
                }
            })
    }
}

/// TOML file of `NAME = "secret"` pairs, read on every lookup.
///
/// Only top-level string values are secrets; tables and other value types are
/// skipped.
#[derive(Debug, Clone)]
pub struct TomlCredentialFile {
    path: PathBuf,
}

impl TomlCredentialFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialProvider for TomlCredentialFile {
    fn get(&self, key: &str) -> Result<SecretString, CredentialLookupError> {
        let location = self.path.display().to_string();
        let text = fs::read_to_string(&self.path).map_err(|_| {
            CredentialLookupError::StoreNotFound {
                location: location.clone(),
            }
        })?;
        let table: toml::Table =
            toml::from_str(&text).map_err(|err| CredentialLookupError::StoreUnreadable {
                location,
                message: err.to_string(),
            })?;
        let secrets: HashMap<String, String> = table
            .into_iter()
            .filter_map(|(name, value)| match value {
                toml::Value::String(secret) => Some((name, secret)),
                _ => None,
            })
            .collect();

        secrets
            .get(key)
            .map(|secret| SecretString::from(secret.clone()))
            .ok_or_else(|| {
                let mut available: Vec<String> = secrets.keys().cloned().collect();
                available.sort();
                CredentialLookupError::KeyNotFound {
                    key: key.to_string(),
                    available,
                }
            })
    }
}
