use serde::Deserialize;

use crate::error::LLMError;

/// Parses error responses returned by Google Gemini.
pub(crate) fn parse_gemini_error(status: u16, body: &str) -> LLMError {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<InnerError>,
    }

    #[derive(Deserialize)]
    struct InnerError {
        message: Option<String>,
        status: Option<String>,
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .map(|error| {
            let message = error.message.unwrap_or_else(|| "unknown error".to_string());
            match error.status.filter(|status| !status.is_empty()) {
                Some(rpc_status) => format!("{rpc_status}: {message}"),
                None => message,
            }
        })
        .unwrap_or_else(|| body.to_string());

    LLMError::Http {
        provider: "google_gemini",
        status,
        message,
    }
}
