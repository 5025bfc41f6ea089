//! Provider-neutral completion relay for hosted and local LLMs.
//!
//! A [`Relay`] resolves a named service from `services.toml`, loads its credential,
//! translates the prompt into the service's wire protocol, retries transient
//! failures and returns a [`CompletionResult`] with normalized token counts, finish
//! reason and an advisory cost estimate.

pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod pricing;
pub mod provider;
pub mod relay;
pub mod retry;
pub mod types;

pub use config::{ServiceConfig, ServiceRegistry};
pub use credentials::{CredentialProvider, EnvCredentials};
pub use error::LLMError;
pub use provider::{AdapterSet, ProviderAdapter};
pub use relay::{Relay, RelayBuilder, ServiceListing};
pub use retry::RetryPolicy;
pub use types::*;
