use serde::Deserialize;
use serde_json::Value;

use crate::error::LLMError;

/// Turns a non-success Chat Completions response into [`LLMError::Http`].
pub(crate) fn parse_openai_error(status: u16, body: &str) -> LLMError {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<InnerError>,
    }
    #[derive(Deserialize)]
    struct InnerError {
        message: Option<String>,
        code: Option<Value>,
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .map(|error| {
            let message = error.message.unwrap_or_else(|| "unknown error".to_string());
            match error.code {
                Some(Value::String(code)) => format!("{message} [{code}]"),
                _ => message,
            }
        })
        .unwrap_or_else(|| body.to_string());

    LLMError::Http {
        provider: "openai_chat",
        status,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_message_and_code() {
        let body = r#"{
  "error": {
    "message": "Incorrect API key provided",
    "type": "invalid_request_error",
    "code": "invalid_api_key"
  }
}"#;
        let err = parse_openai_error(401, body);
        assert_eq!(err.status(), Some(401));
        assert!(!err.is_transient());
        let rendered = err.to_string();
        assert!(rendered.contains("(401)"), "{rendered}");
        assert!(rendered.contains("Incorrect API key provided [invalid_api_key]"), "{rendered}");
    }

    #[test]
    fn falls_back_to_raw_body() {
        let err = parse_openai_error(502, "<html>bad gateway</html>");
        assert!(err.is_transient());
        match err {
            LLMError::Http { message, .. } => assert_eq!(message, "<html>bad gateway</html>"),
            other => panic!("unexpected error type: {other:?}"),
        }
    }
}
