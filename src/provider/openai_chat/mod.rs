//! OpenAI Chat Completions protocol (`POST /v1/chat/completions`).
//!
//! Also serves any OpenAI-compatible gateway that accepts bearer tokens.

mod error;
mod provider;
mod request;
mod response;
mod types;

pub use provider::OpenAiChatAdapter;
