use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use llm_relay::credentials::StaticCredentials;
use llm_relay::http::{HttpRequest, HttpResponse, HttpTransport};
use llm_relay::pricing::PriceTable;
use llm_relay::{
    AdapterSet, CompletionRequest, FinishReason, LLMError, Relay, RetryPolicy, ServiceRegistry,
};
use serde_json::{Value, json};

const SERVICES: &str = r#"
default_service = "openai"

[services.openai]
adapter = "openai"
key = "OPENAI_API_KEY"
base_url = "https://api.openai.test"
default_model = "gpt-4o-mini"

[services.claude]
adapter = "anthropic"
key = "ANTHROPIC_API_KEY"
base_url = "https://api.anthropic.test"
default_model = "claude-sonnet-4-5"

[services.ollama]
adapter = "ollama"
base_url = "http://gpu-box:11434"
key_required = false
default_model = "llama3.2"

[services.bare]
adapter = "ollama"
base_url = "http://localhost:11434"
key_required = false
"#;

/// Replays canned responses in order and records every request it receives.
#[derive(Default)]
struct MockTransport {
    responses: Mutex<VecDeque<(u16, Vec<u8>)>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, status: u16, body: Value) {
        self.push_raw(status, body.to_string().into_bytes());
    }

    fn push_raw(&self, status: u16, body: Vec<u8>) {
        self.responses.lock().unwrap().push_back((status, body));
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn last_body(&self) -> Value {
        let requests = self.requests();
        let request = requests.last().expect("a request was sent");
        serde_json::from_slice(&request.body).expect("json body")
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, LLMError> {
        self.requests.lock().unwrap().push(request);
        let (status, body) = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected request: no canned response left");
        Ok(HttpResponse { status, body })
    }
}

fn write_services(dir: &Path) -> Arc<ServiceRegistry> {
    let path = dir.join("services.toml");
    fs::write(&path, SERVICES).expect("write services");
    Arc::new(ServiceRegistry::from_path(path))
}

fn relay(dir: &Path, transport: Arc<MockTransport>, retry: RetryPolicy) -> Relay {
    let credentials = StaticCredentials::new()
        .with("OPENAI_API_KEY", "sk-openai")
        .with("ANTHROPIC_API_KEY", "sk-ant");
    Relay::builder()
        .registry(write_services(dir))
        .credentials(Arc::new(credentials))
        .adapters(AdapterSet::builtin(transport))
        .pricing(PriceTable::new().with_price("gpt-4o-mini", 0.15, 0.60))
        .retry_policy(retry)
        .build()
        .expect("relay")
}

fn openai_reply(text: &str, input: u64, output: u64) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": "gpt-4o-mini-2024-07-18",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": text },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": input, "completion_tokens": output, "total_tokens": input + output }
    })
}

#[tokio::test]
async fn openai_tokens_are_not_swapped() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::new();
    transport.push(200, openai_reply("Hello!", 100, 200));

    let result = relay(dir.path(), transport.clone(), RetryPolicy::none())
        .complete(CompletionRequest::new("Say hello"))
        .await
        .expect("completion");

    assert_eq!(result.tokens.input, 100);
    assert_eq!(result.tokens.output, 200);
    assert_eq!(result.provider, "openai");
    assert_eq!(result.model, "gpt-4o-mini-2024-07-18");
    assert_eq!(result.finish_reason, FinishReason::Stop);
    // reported model is unpriced, the requested one is not
    let cost = result.estimated_cost_usd.expect("priced");
    assert!((cost - 0.000135).abs() < 1e-12, "{cost}");

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "https://api.openai.test/v1/chat/completions");
    assert_eq!(
        requests[0].headers.get("Authorization").map(String::as_str),
        Some("Bearer sk-openai")
    );
}

#[tokio::test]
async fn provider_is_the_adapter_kind_not_the_reported_model() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::new();
    transport.push(
        200,
        json!({
            "model": "llama3.2:instruct",
            "response": "Blue light scatters more.",
            "done": true,
            "done_reason": "stop",
            "prompt_eval_count": 12,
            "eval_count": 7
        }),
    );

    let result = relay(dir.path(), transport.clone(), RetryPolicy::none())
        .complete(
            CompletionRequest::new("Why is the sky blue?")
                .with_service("ollama")
                .with_temperature(0.2),
        )
        .await
        .expect("completion");

    assert_eq!(result.provider, "ollama");
    assert_eq!(result.model, "llama3.2:instruct");
    assert_eq!(result.estimated_cost_usd, None);

    let requests = transport.requests();
    assert_eq!(requests[0].url, "http://gpu-box:11434/api/generate");
    assert!(!requests[0].headers.contains_key("Authorization"));
    let body = transport.last_body();
    assert_eq!(body["stream"], false);
    assert_eq!(body["model"], "llama3.2");
    assert_eq!(body["options"]["temperature"], json!(0.2));
}

#[tokio::test]
async fn missing_model_fails_before_any_network_call() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::new();

    let err = relay(dir.path(), transport.clone(), RetryPolicy::none())
        .complete(CompletionRequest::new("hi").with_service("bare"))
        .await
        .expect_err("model required");

    assert!(err.to_string().contains("model name required"), "{err}");
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn unknown_service_lists_every_known_name() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::new();

    let err = relay(dir.path(), transport.clone(), RetryPolicy::none())
        .complete(CompletionRequest::new("hi").with_service("mistral"))
        .await
        .expect_err("unknown service");

    let message = err.to_string();
    for name in ["mistral", "bare", "claude", "ollama", "openai"] {
        assert!(message.contains(name), "missing {name} in: {message}");
    }
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn service_unavailable_is_retried_then_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::new();
    transport.push(503, json!({ "error": { "message": "overloaded", "type": "server_error" } }));
    transport.push(200, openai_reply("recovered", 5, 6));

    let result = relay(
        dir.path(),
        transport.clone(),
        RetryPolicy::new(3, vec![Duration::ZERO]),
    )
    .complete(CompletionRequest::new("hi"))
    .await
    .expect("second attempt succeeds");

    assert_eq!(result.text, "recovered");
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn unauthorized_surfaces_verbatim_without_retry() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::new();
    transport.push(
        401,
        json!({ "type": "error", "error": { "type": "authentication_error", "message": "invalid x-api-key" } }),
    );

    let err = relay(
        dir.path(),
        transport.clone(),
        RetryPolicy::new(3, vec![Duration::ZERO]),
    )
    .complete(CompletionRequest::new("hi").with_service("claude"))
    .await
    .expect_err("unauthorized");

    assert_eq!(err.status(), Some(401));
    assert!(err.to_string().contains("invalid x-api-key"), "{err}");
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(
        transport.requests()[0]
            .headers
            .get("x-api-key")
            .map(String::as_str),
        Some("sk-ant")
    );
}

#[tokio::test]
async fn unreadable_error_body_is_not_retried_and_keeps_status() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::new();
    transport.push_raw(401, vec![0xff, 0xfe, b'x']);

    let err = relay(
        dir.path(),
        transport.clone(),
        RetryPolicy::new(3, vec![Duration::ZERO]),
    )
    .complete(CompletionRequest::new("hi"))
    .await
    .expect_err("unauthorized");

    assert_eq!(err.status(), Some(401));
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn temperature_reaches_the_wire_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::new();
    transport.push(200, openai_reply("ok", 1, 1));

    relay(dir.path(), transport.clone(), RetryPolicy::none())
        .complete(CompletionRequest::new("hi").with_temperature(0.2))
        .await
        .expect("completion");

    let body = String::from_utf8(transport.requests()[0].body.clone()).unwrap();
    assert!(body.contains(r#""temperature":0.2"#), "{body}");
}

#[tokio::test]
async fn text_is_returned_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::new();
    transport.push(
        200,
        json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude-sonnet-4-5-20250929",
            "content": [{ "type": "text", "text": "\n  padded answer  \n" }],
            "stop_reason": "max_tokens",
            "usage": { "input_tokens": 100, "output_tokens": 200 }
        }),
    );

    let result = relay(dir.path(), transport.clone(), RetryPolicy::none())
        .complete(
            CompletionRequest::new("hi")
                .with_service("claude")
                .with_system_prompt("Be terse"),
        )
        .await
        .expect("completion");

    assert_eq!(result.text, "\n  padded answer  \n");
    assert_eq!(result.finish_reason, FinishReason::MaxTokens);
    assert_eq!((result.tokens.input, result.tokens.output), (100, 200));
    assert_eq!(transport.last_body()["system"], "Be terse");
}

#[tokio::test]
async fn listing_comes_from_the_service_file() {
    let dir = tempfile::tempdir().unwrap();
    let listing = relay(dir.path(), MockTransport::new(), RetryPolicy::none())
        .list_services()
        .expect("listing");

    assert_eq!(listing.default_service, "openai");
    assert_eq!(listing.services, vec!["bare", "claude", "ollama", "openai"]);
}

#[test]
fn result_serializes_with_camel_case_fields() {
    let result = llm_relay::CompletionResult {
        text: "ok".to_string(),
        model: "m".to_string(),
        provider: "openai".to_string(),
        tokens: llm_relay::TokenCounts { input: 1, output: 2 },
        finish_reason: FinishReason::MaxTokens,
        duration_ms: 3,
        estimated_cost_usd: None,
    };
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["finishReason"], "max_tokens");
    assert_eq!(json["durationMs"], 3);
    assert!(json["estimatedCostUsd"].is_null());
}
