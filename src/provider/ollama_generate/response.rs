use crate::error::LLMError;
use crate::types::{AdapterResponse, FinishReason, TokenCounts};

use super::types::OllamaGenerateResponse;

pub(crate) fn map_response(
    resp: OllamaGenerateResponse,
    provider: &'static str,
) -> Result<AdapterResponse, LLMError> {
    let text = resp
        .response
        .ok_or_else(|| LLMError::provider(provider, "response has no `response` field"))?;
    if !resp.done {
        return Err(LLMError::provider(
            provider,
            "received a partial response with `done: false`",
        ));
    }

    Ok(AdapterResponse {
        text,
        model: resp.model,
        tokens: TokenCounts {
            input: resp.prompt_eval_count.unwrap_or(0),
            output: resp.eval_count.unwrap_or(0),
        },
        finish_reason: resp
            .done_reason
            .as_deref()
            .map(convert_done_reason)
            .unwrap_or(FinishReason::Stop),
        native_finish_reason: resp.done_reason,
    })
}

fn convert_done_reason(reason: &str) -> FinishReason {
    match reason {
        "length" => FinishReason::MaxTokens,
        _ => FinishReason::Stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<AdapterResponse, LLMError> {
        let resp: OllamaGenerateResponse = serde_json::from_str(body).expect("valid json");
        map_response(resp, "ollama_generate")
    }

    #[test]
    fn maps_text_model_and_eval_counts() {
        let mapped = parse(
            r#"{
  "model": "llama3.2:instruct",
  "created_at": "2024-09-25T10:00:00Z",
  "response": "  Rayleigh scattering.\n",
  "done": true,
  "done_reason": "stop",
  "prompt_eval_count": 100,
  "eval_count": 200,
  "total_duration": 5000000
}"#,
        )
        .expect("mapped");

        assert_eq!(mapped.text, "  Rayleigh scattering.\n");
        assert_eq!(mapped.model.as_deref(), Some("llama3.2:instruct"));
        assert_eq!(mapped.tokens, TokenCounts { input: 100, output: 200 });
        assert_eq!(mapped.finish_reason, FinishReason::Stop);
        assert_eq!(mapped.native_finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn length_maps_to_max_tokens() {
        let mapped = parse(r#"{ "response": "cut", "done": true, "done_reason": "length" }"#)
            .expect("mapped");
        assert_eq!(mapped.finish_reason, FinishReason::MaxTokens);
        assert_eq!(mapped.tokens, TokenCounts::default());
        assert!(mapped.model.is_none());
    }

    #[test]
    fn missing_response_field_is_an_error() {
        let err = parse(r#"{ "model": "llama3.2", "done": true }"#).expect_err("no text");
        assert!(matches!(err, LLMError::Provider { .. }));
    }
}
