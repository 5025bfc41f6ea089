//! Ollama native generate endpoint (`POST /api/generate`, non-streaming).

mod error;
mod provider;
mod request;
mod response;
mod types;

pub use provider::OllamaGenerateAdapter;
