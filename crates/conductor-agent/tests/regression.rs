//! Regression tests for conductor-agent: ModelConfig, the HTTP adapters, and
//! agents wired to them end to end.

use conductor_agent::{
    Agent, AgentInit, AutomationAgent, AutomationSettings, HttpAutomationTrigger,
    HttpCodeReviewer, HttpRetriever, LlmProvider, ModelConfig, OpenAiCompletion,
};
use conductor_core::{
    AutomationTrigger, CodeReviewer, CompletionOptions, ConductorError, ModelCompletion,
    Retriever, RunContext,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn model_config(provider: LlmProvider, base: &str, api_key: &str) -> ModelConfig {
    ModelConfig {
        provider,
        model_id: "test-model".to_string(),
        api_key: api_key.to_string(),
        api_base_url: Some(base.to_string()),
        temperature: 0.2,
        max_tokens: 256,
        request_timeout_secs: 5,
    }
}

fn openai_completion(provider: LlmProvider, server: &MockServer, key: &str) -> OpenAiCompletion {
    let config = model_config(provider, &server.uri(), key);
    OpenAiCompletion::new(config).unwrap()
}

fn json_reply(status: u16, body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(body)
}

fn text_reply(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_string(body)
}

fn chat_reply(content: &str) -> serde_json::Value {
    json!({
        "choices": [{"message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
    })
}

// --- ModelConfig & LlmProvider ---

#[test]
fn test_model_config_toml_defaults() {
    let config: ModelConfig = toml::from_str(
        r#"
        provider = "groq"
        model_id = "llama-3.1-8b-instant"
        "#,
    )
    .unwrap();

    assert_eq!(config.provider, LlmProvider::Groq);
    assert!(config.api_key.is_empty());
    assert_eq!(config.temperature, 0.7);
    assert_eq!(config.max_tokens, 2000);
    assert_eq!(config.request_timeout_secs, 120);
    assert_eq!(config.base_url(), "https://api.groq.com/openai");
}

#[test]
fn test_model_config_base_url_override() {
    let config = model_config(LlmProvider::Ollama, "http://gpu-box:11434", "");
    assert_eq!(config.base_url(), "http://gpu-box:11434");

    let options = config.completion_options();
    assert_eq!(options.temperature, 0.2);
    assert_eq!(options.max_tokens, 256);
}

#[test]
fn test_provider_serialization() {
    let encoded = serde_json::to_string(&LlmProvider::OpenRouter).unwrap();
    assert_eq!(encoded, "\"openrouter\"");
    let provider: LlmProvider = serde_json::from_str("\"openai\"").unwrap();
    assert_eq!(provider, LlmProvider::OpenAi);
}

// --- OpenAiCompletion ---

#[tokio::test]
async fn test_completion_posts_single_user_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_json(json!({
            "model": "test-model",
            "temperature": 0.5,
            "max_tokens": 64,
            "messages": [{"role": "user", "content": "Break down this task"}],
        })))
        .respond_with(json_reply(200, chat_reply("step one\nstep two")))
        .expect(1)
        .mount(&server)
        .await;

    let completion = openai_completion(LlmProvider::OpenAi, &server, "sk-test");
    let options = CompletionOptions {
        temperature: 0.5,
        max_tokens: 64,
    };

    let text = completion
        .complete("Break down this task", &options)
        .await
        .unwrap();
    assert_eq!(text, "step one\nstep two");
}

#[tokio::test]
async fn test_completion_openrouter_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("X-Title", "Conductor"))
        .respond_with(json_reply(200, chat_reply("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let completion = openai_completion(LlmProvider::OpenRouter, &server, "key");
    let text = completion
        .complete("hi", &CompletionOptions::default())
        .await
        .unwrap();
    assert_eq!(text, "ok");
}

#[tokio::test]
async fn test_completion_error_status_is_downstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(json_reply(429, json!({"error": "rate limited"})))
        .mount(&server)
        .await;

    let completion = openai_completion(LlmProvider::Groq, &server, "key");
    let err = completion
        .complete("hi", &CompletionOptions::default())
        .await
        .unwrap_err();

    match err {
        ConductorError::Downstream(message) => {
            assert!(message.contains("429"));
            assert!(message.contains("rate limited"));
        }
        other => panic!("expected downstream error, got {other:?}"),
    }
}

// --- HttpRetriever ---

#[tokio::test]
async fn test_retriever_accepts_wrapped_and_bare_responses() {
    let documents = json!({
        "documents": [
            {"content": "lru.rs", "metadata": {"path": "src/lru.rs"}},
            {"content": "cache.md"},
            {"content": "extra"}
        ]
    });
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wrapped"))
        .and(body_json(json!({"query": "cache", "top_k": 2})))
        .respond_with(json_reply(200, documents))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bare"))
        .respond_with(json_reply(200, json!([{"content": "only"}])))
        .mount(&server)
        .await;

    let wrapped = HttpRetriever::new(format!("{}/wrapped", server.uri()));
    let docs = wrapped.retrieve("cache", 2).await.unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].metadata["path"], "src/lru.rs");

    let bare = HttpRetriever::new(format!("{}/bare", server.uri()));
    let docs = bare.retrieve("cache", 3).await.unwrap();
    assert_eq!(docs[0].content, "only");
}

#[tokio::test]
async fn test_retriever_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(text_reply(503, "index rebuilding"))
        .mount(&server)
        .await;

    let retriever = HttpRetriever::new(server.uri());
    let err = retriever.retrieve("q", 3).await.unwrap_err();
    match err {
        ConductorError::Downstream(message) => assert!(message.contains("index rebuilding")),
        other => panic!("expected downstream error, got {other:?}"),
    }
}

// --- HttpAutomationTrigger ---

#[tokio::test]
async fn test_trigger_health_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/healthz"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let trigger = HttpAutomationTrigger::new(None);
    trigger.check_health(&server.uri()).await.unwrap();
}

#[tokio::test]
async fn test_trigger_unhealthy_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/healthz"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = HttpAutomationTrigger::new(None)
        .check_health(&server.uri())
        .await
        .unwrap_err();
    let expected = "Downstream service error: n8n health check failed: 502";
    assert_eq!(err.to_string(), expected);
}

#[tokio::test]
async fn test_trigger_sends_webhook_id_and_keeps_text_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/deploy"))
        .and(header("X-N8N-Webhook-ID", "wh-1"))
        .respond_with(text_reply(500, "workflow crashed"))
        .mount(&server)
        .await;

    let trigger = HttpAutomationTrigger::new(Some("wh-1".to_string()));
    let endpoint = format!("{}/webhook/deploy", server.uri());
    let payload = json!({"workflow": "deploy"});
    let response = trigger.invoke(&endpoint, &payload).await.unwrap();

    assert_eq!(response.status, 500);
    assert!(response.is_failure());
    assert_eq!(response.body, json!("workflow crashed"));
}

// --- HttpCodeReviewer ---

#[tokio::test]
async fn test_reviewer_posts_code_with_bearer_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/analyze"))
        .and(header("Authorization", "Bearer cr-key"))
        .and(body_json(json!({"code": "fn f() {}"})))
        .respond_with(json_reply(200, json!({"issues": []})))
        .expect(1)
        .mount(&server)
        .await;

    let reviewer = HttpCodeReviewer::new(format!("{}/v1", server.uri()), "cr-key");
    let findings = reviewer.analyze("fn f() {}").await.unwrap();
    assert_eq!(findings, json!({"issues": []}));
}

#[tokio::test]
async fn test_reviewer_non_200_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(text_reply(201, "queued"))
        .mount(&server)
        .await;

    let reviewer = HttpCodeReviewer::new(server.uri(), "cr-key");
    let err = reviewer.analyze("fn f() {}").await.unwrap_err();
    match err {
        ConductorError::Downstream(message) => assert_eq!(message, "CodeRabbit API error: queued"),
        other => panic!("expected downstream error, got {other:?}"),
    }
}

// --- Agents over HTTP ---

#[tokio::test]
async fn test_automation_agent_against_live_endpoints() {
    let reply = "WORKFLOW: deploy\nPARAMETERS: env=prod\nEXECUTION: run\nVALIDATION: 200 OK";
    let payload = json!({"workflow": "deploy", "parameters": "env=prod", "execution": "run"});
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(json_reply(200, chat_reply(reply)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/healthz"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/webhook/deploy"))
        .and(body_json(payload))
        .respond_with(json_reply(200, json!({"executionId": "7"})))
        .expect(2)
        .mount(&server)
        .await;

    let completion: Arc<dyn ModelCompletion> =
        Arc::new(openai_completion(LlmProvider::OpenAi, &server, "key"));
    let settings = AutomationSettings {
        webhook_url: Some(format!("{}/webhook/deploy", server.uri())),
        webhook_id: Some("wh-1".to_string()),
        cloud_url: Some(server.uri()),
    };
    let mut agent = AutomationAgent::new(
        AgentInit::new("n8n", completion),
        &settings,
        Arc::new(HttpAutomationTrigger::new(settings.webhook_id.clone())),
    )
    .unwrap();

    let ctx = RunContext::new();
    let first = agent.run("trigger the deploy webhook", &ctx).await;
    let second = agent.run("trigger it again", &ctx).await;

    assert!(first.is_success(), "{:?}", first.error);
    assert!(second.is_success(), "{:?}", second.error);
    assert_eq!(first.output["execution_result"]["executionId"], "7");
}
