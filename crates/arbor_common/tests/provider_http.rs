//! Wire-level tests for the HTTP provider adapters.
//!
//! Each test starts a local axum stub that records the request and answers
//! with a canned provider reply.

use arbor_common::provider::{
    build_client, AnthropicProvider, CustomProvider, OpenAiProvider,
};
use arbor_common::{
    Engine, EngineSettings, LlmError, ProviderConfig, ProviderKind, ProviderRegistry, TreeProvider,
};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TREE_JSON: &str = r#"{"question":"Q","options":[{"text":"a","result":"r"},{"text":"b"}]}"#;

#[derive(Clone)]
struct Stub {
    status: StatusCode,
    reply: Value,
    delay: Duration,
    seen: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

impl Stub {
    fn ok(reply: Value) -> Self {
        Self::with_status(StatusCode::OK, reply)
    }

    fn with_status(status: StatusCode, reply: Value) -> Self {
        Self {
            status,
            reply,
            delay: Duration::ZERO,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn last_request(&self) -> (HeaderMap, Value) {
        self.seen.lock().unwrap().last().cloned().expect("no request recorded")
    }

    fn request_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

async fn handle(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    stub.seen.lock().unwrap().push((headers, body));
    if !stub.delay.is_zero() {
        tokio::time::sleep(stub.delay).await;
    }
    (stub.status, Json(stub.reply.clone()))
}

/// Serve `stub` on `path` and return the base URL.
async fn serve(path: &str, stub: Stub) -> String {
    let app = Router::new().route(path, post(handle)).with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn config(kind: ProviderKind) -> ProviderConfig {
    ProviderConfig {
        provider: kind,
        api_key: "sk-test".to_string(),
        model: "test-model".to_string(),
        temperature: 0.4,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_openai_wire_format() {
    let stub = Stub::ok(json!({"choices": [{"message": {"content": TREE_JSON}}]}));
    let base = serve("/v1/chat/completions", stub.clone()).await;
    let provider = OpenAiProvider::with_base_url(build_client(5).unwrap(), format!("{}/v1", base), 5);

    let text = provider
        .send("去哪工作", "SYSTEM", &config(ProviderKind::OpenAi))
        .await
        .unwrap();
    assert_eq!(text, TREE_JSON);

    let (headers, body) = stub.last_request();
    assert_eq!(headers["authorization"], "Bearer sk-test");
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["messages"][0], json!({"role": "system", "content": "SYSTEM"}));
    assert_eq!(body["messages"][1], json!({"role": "user", "content": "去哪工作"}));
    assert_eq!(body["response_format"]["type"], "json_object");
    assert_eq!(body["temperature"], 0.4);
}

#[tokio::test]
async fn test_anthropic_wire_format() {
    let reply_text = format!("Here is your tree:\n{}\nLet me know!", TREE_JSON);
    let stub = Stub::ok(json!({"content": [{"type": "text", "text": reply_text}]}));
    let base = serve("/v1/messages", stub.clone()).await;
    let provider =
        AnthropicProvider::with_base_url(build_client(5).unwrap(), format!("{}/v1", base), 5);

    let text = provider
        .send("Q", "SYSTEM", &config(ProviderKind::Anthropic))
        .await
        .unwrap();
    assert_eq!(text, reply_text);

    let (headers, body) = stub.last_request();
    assert_eq!(headers["x-api-key"], "sk-test");
    assert_eq!(headers["anthropic-version"], "2023-06-01");
    assert!(headers.get("authorization").is_none());
    assert_eq!(body["system"], "SYSTEM");
    assert_eq!(body["max_tokens"], 4096);
    assert_eq!(body["messages"], json!([{"role": "user", "content": "Q"}]));
}

#[tokio::test]
async fn test_custom_endpoint_resolves_response_field() {
    let stub = Stub::ok(json!({"response": TREE_JSON}));
    let base = serve("/generate", stub.clone()).await;
    let provider = CustomProvider::new(build_client(5).unwrap(), 5);
    let config = ProviderConfig {
        endpoint: format!("{}/generate", base),
        ..config(ProviderKind::Custom)
    };

    let text = provider.send("Q", "SYSTEM", &config).await.unwrap();
    assert_eq!(text, TREE_JSON);

    let (headers, body) = stub.last_request();
    assert_eq!(headers["authorization"], "Bearer sk-test");
    assert!(body.get("response_format").is_none());
}

#[tokio::test]
async fn test_custom_endpoint_without_key_sends_no_auth() {
    let stub = Stub::ok(json!({"text": TREE_JSON}));
    let base = serve("/generate", stub.clone()).await;
    let provider = CustomProvider::new(build_client(5).unwrap(), 5);
    let config = ProviderConfig {
        provider: ProviderKind::Custom,
        endpoint: format!("{}/generate", base),
        ..Default::default()
    };

    provider.send("Q", "S", &config).await.unwrap();
    let (headers, _) = stub.last_request();
    assert!(headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_custom_unknown_shape() {
    let stub = Stub::ok(json!({"output": "something"}));
    let base = serve("/generate", stub).await;
    let provider = CustomProvider::new(build_client(5).unwrap(), 5);
    let config = ProviderConfig {
        endpoint: format!("{}/generate", base),
        ..config(ProviderKind::Custom)
    };

    let err = provider.send("Q", "S", &config).await.unwrap_err();
    assert_eq!(err, LlmError::UnrecognizedResponseShape);
}

#[tokio::test]
async fn test_custom_missing_endpoint_makes_no_call() {
    let provider = CustomProvider::new(build_client(5).unwrap(), 5);
    let err = provider
        .send("Q", "S", &config(ProviderKind::Custom))
        .await
        .unwrap_err();
    assert_eq!(err, LlmError::MissingEndpoint);
}

#[tokio::test]
async fn test_error_status_uses_provider_message() {
    let stub = Stub::with_status(
        StatusCode::TOO_MANY_REQUESTS,
        json!({"error": {"message": "Rate limit reached"}}),
    );
    let base = serve("/v1/chat/completions", stub).await;
    let provider = OpenAiProvider::with_base_url(build_client(5).unwrap(), format!("{}/v1", base), 5);

    let err = provider
        .send("Q", "S", &config(ProviderKind::OpenAi))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LlmError::ProviderHttp {
            status: 429,
            message: "Rate limit reached".to_string(),
        }
    );
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_error() {
    let stub = Stub::with_status(StatusCode::UNAUTHORIZED, json!({}));
    let base = serve("/v1/messages", stub).await;
    let provider =
        AnthropicProvider::with_base_url(build_client(5).unwrap(), format!("{}/v1", base), 5);

    let err = provider
        .send("Q", "S", &config(ProviderKind::Anthropic))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LlmError::ProviderAuth {
            message: "Anthropic API call failed".to_string(),
        }
    );
}

#[tokio::test]
async fn test_missing_key_makes_no_call() {
    let stub = Stub::ok(json!({}));
    let base = serve("/v1/chat/completions", stub.clone()).await;
    let provider = OpenAiProvider::with_base_url(build_client(5).unwrap(), format!("{}/v1", base), 5);
    let config = ProviderConfig {
        provider: ProviderKind::OpenAi,
        ..Default::default()
    };

    let err = provider.send("Q", "S", &config).await.unwrap_err();
    assert!(matches!(err, LlmError::ProviderAuth { .. }));
    assert_eq!(stub.request_count(), 0);
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let mut stub = Stub::ok(json!({"choices": [{"message": {"content": TREE_JSON}}]}));
    stub.delay = Duration::from_secs(3);
    let base = serve("/v1/chat/completions", stub).await;
    let provider = OpenAiProvider::with_base_url(build_client(1).unwrap(), format!("{}/v1", base), 1);

    let err = provider
        .send("Q", "S", &config(ProviderKind::OpenAi))
        .await
        .unwrap_err();
    assert_eq!(err, LlmError::Timeout(1));
}

#[tokio::test]
async fn test_unreachable_provider_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let provider =
        OpenAiProvider::with_base_url(build_client(5).unwrap(), format!("http://{}/v1", addr), 5);
    let err = provider
        .send("Q", "S", &config(ProviderKind::OpenAi))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Network(_)));
}

#[tokio::test]
async fn test_engine_generates_through_live_adapter() {
    let reply_text = format!("Sure:\n{}", TREE_JSON);
    let stub = Stub::ok(json!({"content": [{"text": reply_text}]}));
    let base = serve("/v1/messages", stub.clone()).await;

    let client = build_client(5).unwrap();
    let mut registry = ProviderRegistry::http(client.clone(), 5);
    registry.register(
        ProviderKind::Anthropic,
        Arc::new(AnthropicProvider::with_base_url(client, format!("{}/v1", base), 5)),
    );
    let engine = Engine::new(registry, EngineSettings::immediate());

    let tree = engine
        .generate_live("Q", &config(ProviderKind::Anthropic), None)
        .await
        .unwrap();
    assert_eq!(tree.question, "Q");
    assert_eq!(tree.options.len(), 2);
    assert_eq!(tree.options[0].result(), Some("r"));
    assert!(tree.options[1].needs_generation());

    // system prompt for full-tree mode went out
    let (_, body) = stub.last_request();
    assert!(body["system"].as_str().unwrap().contains("完整的决策树"));
}

#[tokio::test]
async fn test_engine_falls_back_when_provider_errors() {
    let stub = Stub::with_status(StatusCode::INTERNAL_SERVER_ERROR, json!({}));
    let base = serve("/v1/chat/completions", stub.clone()).await;

    let client = build_client(5).unwrap();
    let mut registry = ProviderRegistry::empty();
    registry.register(
        ProviderKind::OpenAi,
        Arc::new(OpenAiProvider::with_base_url(client, format!("{}/v1", base), 5)),
    );
    let engine = Engine::new(registry, EngineSettings::immediate());

    let tree = engine
        .generate("我该去哪个城市工作", &config(ProviderKind::OpenAi), None)
        .await;
    assert_eq!(tree.question, "你最看重工作的哪个方面？");
    assert_eq!(stub.request_count(), 1);
}
