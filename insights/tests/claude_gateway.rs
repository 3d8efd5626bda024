//! Claude insights gateway against a mock Messages API.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use scipub_core::environment::{InsightsError, InsightsGateway, InsightsRequest};
use scipub_insights::{AnthropicClient, ClaudeInsightsGateway};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Fixtures
// ============================================================================

fn request() -> InsightsRequest {
    InsightsRequest {
        title: "Thinking, Fast and Slow".to_string(),
        author: "Daniel Kahneman".to_string(),
    }
}

fn reply(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_test",
        "type": "message",
        "model": "claude-sonnet-4-5-20250929",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 42, "output_tokens": 64}
    })
}

fn gateway_for(server: &MockServer) -> ClaudeInsightsGateway {
    let client = AnthropicClient::new("test-key").with_api_url(server.uri());
    ClaudeInsightsGateway::new(client).with_model("claude-test")
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn returns_parsed_insights() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({"model": "claude-test"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply(
            r#"{"summary": "Two systems of thought.", "keyTakeaways": ["System 1 is fast", "System 2 is slow"]}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let insights = gateway_for(&server).generate(request()).await.unwrap();

    assert_eq!(insights.summary, "Two systems of thought.");
    assert_eq!(
        insights.key_takeaways,
        vec!["System 1 is fast", "System 2 is slow"]
    );
}

#[tokio::test]
async fn prose_reply_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("I cannot help with that.")))
        .mount(&server)
        .await;

    let result = gateway_for(&server).generate(request()).await;

    assert!(matches!(result, Err(InsightsError::Malformed(_))));
}

#[tokio::test]
async fn server_errors_become_request_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let result = gateway_for(&server).generate(request()).await;

    match result {
        Err(InsightsError::RequestFailed(message)) => {
            assert!(message.contains("500"), "unexpected message: {message}");
        }
        other => panic!("expected request failure, got {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = gateway_for(&server).generate(request()).await;

    assert_eq!(
        result,
        Err(InsightsError::RequestFailed(
            "Unauthorized - invalid API key".to_string()
        ))
    );
}
