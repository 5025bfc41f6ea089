use crate::error::LLMError;
use crate::types::{AdapterResponse, FinishReason, TokenCounts};

use super::types::GeminiGenerateContentResponse;

/// Maps the first candidate of a GenerateContentResponse.
pub(crate) fn map_response(
    resp: GeminiGenerateContentResponse,
    provider: &'static str,
) -> Result<AdapterResponse, LLMError> {
    let Some(candidate) = resp
        .candidates
        .into_iter()
        .min_by_key(|candidate| candidate.index.unwrap_or(0))
    else {
        let reason = resp
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .map(|reason| format!(" (prompt blocked: {reason})"))
            .unwrap_or_default();
        return Err(LLMError::provider(
            provider,
            format!("response contained no candidates{reason}"),
        ));
    };

    let texts: Vec<String> = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|part| part.thought != Some(true))
        .filter_map(|part| part.text)
        .collect();
    if texts.is_empty() {
        return Err(LLMError::provider(
            provider,
            "candidate content holds no text part",
        ));
    }

    let tokens = resp
        .usage_metadata
        .map(|usage| TokenCounts {
            input: usage.prompt_token_count.unwrap_or(0),
            output: usage.candidates_token_count.unwrap_or(0),
        })
        .unwrap_or_default();

    Ok(AdapterResponse {
        text: texts.concat(),
        model: resp.model_version,
        tokens,
        finish_reason: candidate
            .finish_reason
            .as_deref()
            .map(convert_finish_reason)
            .unwrap_or(FinishReason::Stop),
        native_finish_reason: candidate.finish_reason,
    })
}

pub(crate) fn convert_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::MaxTokens,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" => {
            FinishReason::Error
        }
        _ => FinishReason::Stop,
    }
}
