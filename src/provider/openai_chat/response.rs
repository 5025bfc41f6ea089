use crate::error::LLMError;
use crate::types::{AdapterResponse, FinishReason, TokenCounts};

use super::types::OpenAiChatResponse;

pub(crate) fn map_response(
    resp: OpenAiChatResponse,
    provider: &'static str,
) -> Result<AdapterResponse, LLMError> {
    let choice = resp
        .choices
        .into_iter()
        .min_by_key(|choice| choice.index)
        .ok_or_else(|| LLMError::provider(provider, "response contained no choices"))?;

    let message = choice
        .message
        .ok_or_else(|| LLMError::provider(provider, "response choice has no message"))?;
    // A refusal carries its explanation in place of the content.
    let (text, refused) = match (message.content, message.refusal) {
        (Some(content), _) => (content, false),
        (None, Some(refusal)) => (refusal, true),
        (None, None) => {
            return Err(LLMError::provider(
                provider,
                "response choice has no message content",
            ));
        }
    };

    let tokens = resp
        .usage
        .map(|usage| TokenCounts {
            input: usage.prompt_tokens.unwrap_or(0),
            output: usage.completion_tokens.unwrap_or(0),
        })
        .unwrap_or_default();

    Ok(AdapterResponse {
        text,
        model: resp.model,
        tokens,
        finish_reason: if refused {
            FinishReason::Error
        } else {
            choice
                .finish_reason
                .as_deref()
                .map(convert_finish_reason)
                .unwrap_or(FinishReason::Stop)
        },
        native_finish_reason: choice.finish_reason,
    })
}

pub(crate) fn convert_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "stop" => FinishReason::Stop,
        "length" => FinishReason::MaxTokens,
        "content_filter" => FinishReason::Error,
        _ => FinishReason::Stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<AdapterResponse, LLMError> {
        let resp: OpenAiChatResponse = serde_json::from_str(body).expect("valid json");
        map_response(resp, "openai_chat")
    }

    #[test]
    fn maps_text_usage_and_model() {
        let mapped = parse(
            r#"{
  "id": "chatcmpl-1",
  "model": "gpt-4o-mini-2024-07-18",
  "choices": [{ "index": 0, "message": { "role": "assistant", "content": "  spaced out \n" }, "finish_reason": "stop" }],
  "usage": { "prompt_tokens": 100, "completion_tokens": 200, "total_tokens": 300 }
}"#,
        )
        .expect("mapped");

        assert_eq!(mapped.text, "  spaced out \n");
        assert_eq!(mapped.model.as_deref(), Some("gpt-4o-mini-2024-07-18"));
        assert_eq!(mapped.tokens, TokenCounts { input: 100, output: 200 });
        assert_eq!(mapped.finish_reason, FinishReason::Stop);
        assert_eq!(mapped.native_finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn missing_usage_counts_as_zero_tokens() {
        let mapped = parse(
            r#"{ "choices": [{ "index": 0, "message": { "content": "ok" }, "finish_reason": "length" }] }"#,
        )
        .expect("mapped");
        assert_eq!(mapped.tokens, TokenCounts::default());
        assert_eq!(mapped.finish_reason, FinishReason::MaxTokens);
        assert!(mapped.model.is_none());
    }

    #[test]
    fn missing_content_is_an_explicit_error() {
        let err = parse(r#"{ "choices": [{ "index": 0, "message": { "content": null } }] }"#)
            .expect_err("no content");
        assert!(matches!(err, LLMError::Provider { provider: "openai_chat", .. }));

        let err = parse(r#"{ "choices": [] }"#).expect_err("no choices");
        assert!(err.to_string().contains("no choices"));
    }

    #[test]
    fn refusal_is_returned_as_an_error_finish() {
        let mapped = parse(
            r#"{ "choices": [{ "index": 0, "message": { "content": null, "refusal": "I can't help with that." }, "finish_reason": "stop" }] }"#,
        )
        .expect("mapped");
        assert_eq!(mapped.text, "I can't help with that.");
        assert_eq!(mapped.finish_reason, FinishReason::Error);
        assert_eq!(mapped.native_finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn finish_reasons_are_normalized() {
        assert_eq!(convert_finish_reason("stop"), FinishReason::Stop);
        assert_eq!(convert_finish_reason("length"), FinishReason::MaxTokens);
        assert_eq!(convert_finish_reason("content_filter"), FinishReason::Error);
        assert_eq!(convert_finish_reason("tool_calls"), FinishReason::Stop);
        assert_eq!(convert_finish_reason("something_new"), FinishReason::Stop);
    }
}
