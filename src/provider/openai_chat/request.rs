use serde_json::{Map, Value, json};

use crate::types::AdapterRequest;

/// Builds the Chat Completions body; absent options are left out entirely.
pub(crate) fn build_openai_body(request: &AdapterRequest) -> Value {
    let mut body = Map::new();
    body.insert("model".to_string(), Value::String(request.model.clone()));

    let mut messages = Vec::new();
    if let Some(system) = &request.system_prompt {
        messages.push(json!({ "role": "system", "content": system }));
    }
    messages.push(json!({ "role": "user", "content": request.prompt }));
    body.insert("messages".to_string(), Value::Array(messages));

    if let Some(temperature) = request.temperature {
        body.insert("temperature".to_string(), Value::from(temperature));
    }
    if let Some(max_tokens) = request.max_output_tokens {
        body.insert("max_tokens".to_string(), Value::from(max_tokens));
    }
    if request.json_mode {
        body.insert(
            "response_format".to_string(),
            json!({ "type": "json_object" }),
        );
    }
    body.insert("stream".to_string(), Value::Bool(false));
    Value::Object(body)
}
