use serde_json::{Map, Value, json};

use crate::types::AdapterRequest;

/// Builds the GenerateContent body.
///
/// Sampling options live under `generationConfig`, which is omitted when empty.
pub(crate) fn build_gemini_body(request: &AdapterRequest) -> Value {
    let mut body = Map::new();
    body.insert(
        "contents".to_string(),
        json!([{ "role": "user", "parts": [{ "text": request.prompt }] }]),
    );
    if let Some(system) = &request.system_prompt {
        body.insert(
            "systemInstruction".to_string(),
            json!({ "parts": [{ "text": system }] }),
        );
    }

    let mut generation_config = Map::new();
    if let Some(temperature) = request.temperature {
        generation_config.insert("temperature".to_string(), Value::from(temperature));
    }
    if let Some(max_tokens) = request.max_output_tokens {
        generation_config.insert("maxOutputTokens".to_string(), Value::from(max_tokens));
    }
    if request.json_mode {
        generation_config.insert(
            "responseMimeType".to_string(),
            Value::String("application/json".to_string()),
        );
    }
    if !generation_config.is_empty() {
        body.insert(
            "generationConfig".to_string(),
            Value::Object(generation_config),
        );
    }
    Value::Object(body)
}
