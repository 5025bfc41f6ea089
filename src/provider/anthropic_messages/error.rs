use serde::Deserialize;

use crate::error::LLMError;

/// Parses error responses returned by the Anthropic Messages API.
pub(crate) fn parse_anthropic_error(status: u16, body: &str) -> LLMError {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<InnerError>,
    }

    #[derive(Deserialize)]
    struct InnerError {
        message: Option<String>,
        r#type: Option<String>,
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .map(|error| {
            let message = error.message.unwrap_or_else(|| "unknown error".to_string());
            match error.r#type {
                Some(kind) => format!("{kind}: {message}"),
                None => message,
            }
        })
        // Fallback: if the payload cannot be parsed, surface the raw body.
        .unwrap_or_else(|| body.to_string());

    LLMError::Http {
        provider: "anthropic_messages",
        status,
        message,
    }
}
