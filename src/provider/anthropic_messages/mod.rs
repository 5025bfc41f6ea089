//! Anthropic Messages protocol (`POST /v1/messages`).

mod error;
mod provider;
mod request;
mod response;
mod types;

pub use provider::AnthropicMessagesAdapter;
