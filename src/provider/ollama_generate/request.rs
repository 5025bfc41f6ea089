use crate::types::AdapterRequest;

use super::types::{OllamaGenerateRequest, OllamaOptions};

pub(crate) fn build_ollama_body(request: &AdapterRequest) -> OllamaGenerateRequest<'_> {
    let options = OllamaOptions {
        temperature: request.temperature,
        num_predict: request.max_output_tokens,
    };
    OllamaGenerateRequest {
        model: &request.model,
        prompt: &request.prompt,
        system: request.system_prompt.as_deref(),
        stream: false,
        format: request.json_mode.then_some("json"),
        options: (!options.is_empty()).then_some(options),
    }
}
