use crate::error::LLMError;
use crate::types::{AdapterResponse, FinishReason, TokenCounts};

use super::types::AnthropicMessageResponse;

pub(crate) fn map_response(
    resp: AnthropicMessageResponse,
    provider: &'static str,
) -> Result<AdapterResponse, LLMError> {
    let blocks = resp
        .content
        .ok_or_else(|| LLMError::provider(provider, "response has no `content` field"))?;

    // Text blocks are concatenated as-is; other block kinds carry no text.
    let texts: Vec<String> = blocks
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect();
    if texts.is_empty() {
        return Err(LLMError::provider(
            provider,
            "response `content` holds no text block",
        ));
    }

    let tokens = resp
        .usage
        .map(|usage| TokenCounts {
            input: usage.input_tokens.unwrap_or(0),
            output: usage.output_tokens.unwrap_or(0),
        })
        .unwrap_or_default();

    Ok(AdapterResponse {
        text: texts.concat(),
        model: resp.model,
        tokens,
        finish_reason: resp
            .stop_reason
            .as_deref()
            .map(convert_finish_reason)
            .unwrap_or(FinishReason::Stop),
        native_finish_reason: resp.stop_reason,
    })
}

pub(crate) fn convert_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "end_turn" | "stop_sequence" => FinishReason::Stop,
        "max_tokens" => FinishReason::MaxTokens,
        "refusal" => FinishReason::Error,
        _ => FinishReason::Stop,
    }
}
