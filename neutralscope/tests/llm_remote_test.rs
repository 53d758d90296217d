use common::RelayMode;
use mockito::Matcher;
use neutralscope::error::RelayError;
use neutralscope::llm::completion::complete;
use neutralscope::llm::remote::RemoteLlmProvider;
use neutralscope::llm::{LlmProvider, LlmRequest};
use serde_json::json;

fn request(prompt: &str) -> LlmRequest {
    LlmRequest {
        system: Some("You are an unbiased news editor.".to_string()),
        prompt: prompt.to_string(),
        max_tokens: Some(1000),
        temperature: Some(0.3),
        timeout_seconds: Some(10),
    }
}

fn completion_body(content: &str) -> String {
    json!({
        "model": "gpt-3.5-turbo",
        "choices": [{
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
    .to_string()
}

#[tokio::test]
async fn test_remote_provider_with_mock() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .match_header("authorization", "Bearer fake-api-key")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({"model": "gpt-3.5-turbo", "max_tokens": 1000})),
            Matcher::Regex("\"role\":\"system\",\"content\":\"You are an unbiased news editor.\"".to_string()),
            Matcher::Regex("\"role\":\"user\",\"content\":\"Test prompt\"".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body("This is a test response"))
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-3.5-turbo");

    let response = provider.generate(request("Test prompt")).await.expect("generate");

    assert_eq!(response.content, "This is a test response");
    assert_eq!(response.usage.prompt_tokens, 10);
    assert_eq!(response.usage.completion_tokens, 5);
    assert_eq!(response.usage.total_tokens, 15);
    assert_eq!(response.model, "gpt-3.5-turbo");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_complete_strips_json_fence() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body(
            "```json\n[{\"title\":\"A\",\"url\":\"http://a\",\"bias_score\":0.13}]\n```\n",
        ))
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-3.5-turbo");

    let text = complete(&provider, request("Rate these")).await.expect("complete");
    assert_eq!(text, "[{\"title\":\"A\",\"url\":\"http://a\",\"bias_score\":0.13}]");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_provider_missing_content() {
    let mut server = mockito::Server::new_async().await;

    let _empty_choices = server
        .mock("POST", "/empty")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"model": "gpt-3.5-turbo", "choices": []}"#)
        .create_async()
        .await;
    let _null_content = server
        .mock("POST", "/null")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#)
        .create_async()
        .await;

    for path in ["/empty", "/null"] {
        let provider =
            RemoteLlmProvider::new(format!("{}{}", server.url(), path), "fake-api-key", "gpt-3.5-turbo");
        let err = provider.generate(request("Test")).await.unwrap_err();
        assert!(matches!(err, RelayError::NoContent), "{}: {:?}", path, err);
    }
}

#[tokio::test]
async fn test_remote_provider_error_handling() {
    let mut server = mockito::Server::new_async().await;

    // Mock API error
    let mock = server
        .mock("POST", "/")
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": {"message": "Rate limit exceeded"}}"#)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-3.5-turbo");

    let err = provider.generate(request("Test")).await.unwrap_err();

    assert!(matches!(err, RelayError::Upstream { service: "completion", .. }));
    assert!(err.to_string().contains("429"));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_provider_timeout() {
    let mut server = mockito::Server::new_async().await;

    // Mock slow response
    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(std::time::Duration::from_secs(3));
            w.write_all(b"too late")
        })
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-3.5-turbo");

    let mut req = request("Test");
    req.timeout_seconds = Some(1); // 1 second timeout

    let err = provider.generate(req).await.unwrap_err();

    assert!(matches!(err, RelayError::UpstreamTimeout { service: "completion", seconds: 1 }));
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn test_provider_defaults_fill_unset_request_fields() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({"max_tokens": 1000, "temperature": 0.7})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body("[]"))
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-3.5-turbo")
        .with_defaults(5, 1000, RelayMode::Predict.temperature());

    let bare = LlmRequest {
        system: None,
        prompt: "Predict".to_string(),
        max_tokens: None,
        temperature: None,
        timeout_seconds: None,
    };
    provider.generate(bare).await.expect("generate");

    mock.assert_async().await;
}
