use serde::Deserialize;

use crate::error::LLMError;

/// Ollama reports failures as `{"error": "..."}`.
pub(crate) fn parse_ollama_error(status: u16, body: &str) -> LLMError {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<String>,
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .unwrap_or_else(|| body.to_string());

    LLMError::Http {
        provider: "ollama_generate",
        status,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_error_is_permanent() {
        let err = parse_ollama_error(404, r#"{"error":"model \"llama9\" not found, try pulling it first"}"#);
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_transient());
        assert!(err.to_string().contains("try pulling it first"));
    }

    #[test]
    fn overloaded_server_is_transient() {
        let err = parse_ollama_error(503, "server busy");
        assert!(err.is_transient());
        assert!(err.to_string().contains("server busy"));
    }
}
