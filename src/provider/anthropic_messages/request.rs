use serde_json::{Map, Value, json};

use crate::types::AdapterRequest;

/// `max_tokens` is mandatory in the Messages API.
pub(crate) const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Builds the Messages API body.
///
/// The system prompt travels as the top-level `system` field. The API has no JSON
/// mode switch, so the hint is not forwarded.
pub(crate) fn build_anthropic_body(request: &AdapterRequest) -> Value {
    let mut body = Map::new();
    body.insert("model".to_string(), Value::String(request.model.clone()));
    body.insert(
        "messages".to_string(),
        json!([{ "role": "user", "content": request.prompt }]),
    );
    if let Some(system) = &request.system_prompt {
        body.insert("system".to_string(), Value::String(system.clone()));
    }
    body.insert(
        "max_tokens".to_string(),
        Value::from(request.max_output_tokens.unwrap_or(DEFAULT_MAX_TOKENS)),
    );
    if let Some(temperature) = request.temperature {
        body.insert("temperature".to_string(), Value::from(temperature));
    }
    Value::Object(body)
}
