//! Google Gemini `generateContent` protocol.

mod error;
mod provider;
mod request;
mod response;
mod types;

pub use provider::GoogleGeminiAdapter;
