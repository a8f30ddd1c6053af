use estoque_llm_sdk::client::LlmClient;
use estoque_llm_sdk::error::LlmError;
use estoque_llm_sdk::openai::OpenAIClient;
use estoque_llm_sdk::types::{CompletionRequest, Message};
use mockito::Matcher;
use serde_json::json;
use std::time::Duration;

fn completion_body(content: &str) -> String {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1700000000,
        "model": "gpt-4o",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17 }
    })
    .to_string()
}

fn client_for(server: &mockito::ServerGuard, model: &str) -> OpenAIClient {
    OpenAIClient::new("test-key")
        .unwrap()
        .with_base_url(server.url())
        .with_model(model)
        .with_retry_delay(Duration::from_millis(1))
}

#[tokio::test]
async fn test_complete_sends_selected_model_and_stop_sequences() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o",
            "stop": ["\nObservation"],
            "messages": [
                { "role": "system", "content": "be brief" },
                { "role": "user", "content": "Olá" }
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body("Final Answer: oi"))
        .create_async()
        .await;

    let client = client_for(&server, "gpt-4o");
    assert_eq!(client.model_name(), "gpt-4o");
    assert_eq!(client.provider_name(), "openai");

    let mut request = CompletionRequest::new(client.model_name(), vec![Message::user("Olá")]);
    request.system = Some("be brief".to_string());
    request.stop_sequences = Some(vec!["\nObservation".to_string()]);

    let response = client.complete(request).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.text(), "Final Answer: oi");
    assert_eq!(response.usage.input_tokens, 12);
    assert_eq!(response.usage.output_tokens, 5);
    assert_eq!(response.stop_reason.as_deref(), Some("stop"));
}

#[tokio::test]
async fn test_authentication_error_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(
            json!({ "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" } })
                .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server, "gpt-4").with_max_retries(3);
    let request = CompletionRequest::new("gpt-4", vec![Message::user("Olá")]);

    let err = client.complete(request).await.unwrap_err();

    mock.assert_async().await;
    match err {
        LlmError::Authentication { message } => {
            assert!(message.contains("Incorrect API key"));
        }
        other => panic!("Expected authentication error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_errors_are_retried_until_budget_is_spent() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_body("upstream exploded")
        .expect(3)
        .create_async()
        .await;

    let client = client_for(&server, "gpt-4o-mini").with_max_retries(2);
    let request = CompletionRequest::new("gpt-4o-mini", vec![Message::user("Olá")]);

    let err = client.complete(request).await.unwrap_err();

    mock.assert_async().await;
    assert!(err.is_transient());
    assert!(matches!(err, LlmError::Api { status: 500, .. }));
}

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(429)
        .with_header("retry-after", "2")
        .with_body(json!({ "error": { "message": "Rate limit reached" } }).to_string())
        .create_async()
        .await;

    let client = client_for(&server, "gpt-4o");
    let request = CompletionRequest::new("gpt-4o", vec![Message::user("Olá")]);

    let err = client.complete(request).await.unwrap_err();

    assert!(err.is_transient());
    assert_eq!(err.retry_after(), Some(Duration::from_secs(2)));
}

#[tokio::test]
async fn test_empty_choices_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "id": "x", "model": "gpt-4o", "choices": [] }).to_string())
        .create_async()
        .await;

    let client = client_for(&server, "gpt-4o");
    let request = CompletionRequest::new("gpt-4o", vec![Message::user("Olá")]);

    let err = client.complete(request).await.unwrap_err();
    assert!(matches!(err, LlmError::Internal { .. }));
}

#[test]
fn test_trait_object_usage() {
    let _client: Box<dyn LlmClient> = Box::new(OpenAIClient::new("test-key").unwrap());
}
