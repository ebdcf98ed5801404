use agentkit::error::Error;
use agentkit::llm::{
    DirectApiClient, GatewayClient, InvocationRequest, InvocationResult, ManagedCloudClient,
    ModelClient,
};
use agentkit::resolver::ProviderKind;
use aws_sdk_bedrockruntime::config::retry::RetryConfig;
use aws_sdk_bedrockruntime::config::timeout::TimeoutConfig;
use aws_sdk_bedrockruntime::config::{
    BehaviorVersion, Builder as BedrockConfig, Credentials, Region,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn request(provider: ProviderKind, model: &str) -> InvocationRequest {
    InvocationRequest {
        provider,
        model: model.into(),
        max_tokens: 256,
        system: "You are terse.".into(),
        task: "Answer the question.".into(),
        input: "What is 2+2?".into(),
        content: "Answer the question.\n\nWhat is 2+2?".into(),
        tools: vec![],
    }
}

fn anthropic_body(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "usage": {"input_tokens": 12, "output_tokens": 4}
    })
}

fn direct(server: &MockServer) -> ModelClient {
    ModelClient::Direct(DirectApiClient::new("test-key".into(), server.uri(), TIMEOUT).unwrap())
}

fn gateway(server: &MockServer) -> ModelClient {
    ModelClient::Gateway(GatewayClient::new("goose-key".into(), server.uri(), TIMEOUT).unwrap())
}

fn bedrock_config(server: &MockServer, timeout: Duration) -> BedrockConfig {
    aws_sdk_bedrockruntime::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .endpoint_url(server.uri())
        .retry_config(RetryConfig::disabled())
        .timeout_config(TimeoutConfig::builder().operation_timeout(timeout).build())
}

fn bedrock_client(conf: BedrockConfig, timeout: Duration) -> ModelClient {
    ModelClient::ManagedCloud(ManagedCloudClient::from_client(
        aws_sdk_bedrockruntime::Client::from_conf(conf.build()),
        timeout,
    ))
}

fn bedrock_with_timeout(server: &MockServer, timeout: Duration) -> ModelClient {
    let conf = bedrock_config(server, timeout)
        .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "test"));
    bedrock_client(conf, timeout)
}

fn bedrock(server: &MockServer) -> ModelClient {
    bedrock_with_timeout(server, TIMEOUT)
}

fn assert_same_shape(result: &InvocationResult, provider: ProviderKind, model: &str) {
    assert!(!result.text.is_empty());
    assert_eq!(result.provider, provider);
    assert_eq!(result.model, model);
}

#[tokio::test]
async fn direct_api_sends_messages_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-3-sonnet-20240229",
            "max_tokens": 256,
            "system": "You are terse.",
            "messages": [{"role": "user", "content": "Answer the question.\n\nWhat is 2+2?"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_body(" 4 ")))
        .expect(1)
        .mount(&server)
        .await;

    let result = direct(&server)
        .generate(&request(ProviderKind::DirectApi, "claude-3-sonnet"))
        .await
        .unwrap();
    assert_same_shape(&result, ProviderKind::DirectApi, "claude-3-sonnet-20240229");
    assert_eq!(result.text, "4");
    assert_eq!(result.usage.map(|u| u.input_tokens), Some(12));
}

#[tokio::test]
async fn gateway_passes_model_through_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer goose-key"))
        .and(body_partial_json(json!({
            "model": "mixtral-8x7b",
            "stream": false,
            "messages": [
                {"role": "system", "content": "You are terse."},
                {"role": "user", "content": "Answer the question.\n\nWhat is 2+2?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "4"}}],
            "usage": {"prompt_tokens": 20, "completion_tokens": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = gateway(&server)
        .generate(&request(ProviderKind::Gateway, "mixtral-8x7b"))
        .await
        .unwrap();
    assert_same_shape(&result, ProviderKind::Gateway, "mixtral-8x7b");
}

#[tokio::test]
async fn managed_cloud_invokes_bedrock_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/model/.+/invoke$"))
        .and(body_partial_json(json!({
            "anthropic_version": "bedrock-2023-05-31",
            "max_tokens": 256,
            "system": "You are terse."
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_body("4")))
        .expect(1)
        .mount(&server)
        .await;

    let result = bedrock(&server)
        .generate(&request(ProviderKind::ManagedCloud, "claude-3-haiku"))
        .await
        .unwrap();
    assert_same_shape(
        &result,
        ProviderKind::ManagedCloud,
        "anthropic.claude-3-haiku-20240307-v1:0",
    );
    assert_eq!(result.usage.map(|u| u.output_tokens), Some(4));
}

#[tokio::test]
async fn status_codes_map_to_error_categories() {
    let cases = [
        (401, "AuthenticationError"),
        (403, "AuthenticationError"),
        (429, "RateLimitError"),
        (500, "ProviderUnavailableError"),
        (503, "ProviderUnavailableError"),
        (400, "ProviderError"),
    ];
    for (status, category) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(json!({"error": {"message": "nope"}})),
            )
            .expect(2)
            .mount(&server)
            .await;

        let err = direct(&server)
            .generate(&request(ProviderKind::DirectApi, "claude-3-haiku"))
            .await
            .unwrap_err();
        assert_eq!(err.category(), category, "status {status}");

        let err = gateway(&server)
            .generate(&request(ProviderKind::Gateway, "gpt-4o"))
            .await;
        assert_eq!(err.unwrap_err().category(), category, "status {status}");
    }
}

#[tokio::test]
async fn rate_limit_captures_retry_after_and_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
        .expect(1)
        .mount(&server)
        .await;

    let err = direct(&server)
        .generate(&request(ProviderKind::DirectApi, "claude-3-haiku"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::RateLimit {
            provider: ProviderKind::DirectApi,
            retry_after_secs: Some(30),
            ..
        }
    ));
}

#[tokio::test]
async fn managed_cloud_throttling_is_a_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("x-amzn-ErrorType", "ThrottlingException")
                .set_body_json(json!({"message": "Too many requests"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = bedrock(&server)
        .generate(&request(ProviderKind::ManagedCloud, "claude-3-sonnet"))
        .await
        .unwrap_err();
    assert_eq!(err.category(), "RateLimitError");
}

#[tokio::test]
async fn managed_cloud_status_codes_map_to_error_categories() {
    let cases = [
        (401, "AuthenticationError"),
        (403, "AuthenticationError"),
        (429, "RateLimitError"),
        (500, "ProviderUnavailableError"),
        (503, "ProviderUnavailableError"),
        (400, "ProviderError"),
    ];
    for (status, category) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/model/.+/invoke$"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({"message": "nope"})))
            .expect(1)
            .mount(&server)
            .await;

        let err = bedrock(&server)
            .generate(&request(ProviderKind::ManagedCloud, "claude-3-haiku"))
            .await
            .unwrap_err();
        assert_eq!(err.category(), category, "status {status}");
    }
}

#[tokio::test]
async fn managed_cloud_model_timeout_is_a_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(408)
                .insert_header("x-amzn-ErrorType", "ModelTimeoutException")
                .set_body_json(json!({"message": "Model has timed out"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = bedrock(&server)
        .generate(&request(ProviderKind::ManagedCloud, "claude-3-sonnet"))
        .await
        .unwrap_err();
    assert_eq!(err.category(), "TimeoutError");
}

#[tokio::test]
async fn managed_cloud_slow_response_hits_operation_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(anthropic_body("late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = bedrock_with_timeout(&server, Duration::from_millis(200))
        .generate(&request(ProviderKind::ManagedCloud, "claude-3-haiku"))
        .await
        .unwrap_err();
    assert_eq!(err.category(), "TimeoutError");
}

#[tokio::test]
async fn managed_cloud_without_credentials_is_an_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_body("never")))
        .expect(0)
        .mount(&server)
        .await;

    let client = bedrock_client(bedrock_config(&server, TIMEOUT), TIMEOUT);
    let err = client
        .generate(&request(ProviderKind::ManagedCloud, "claude-3-haiku"))
        .await
        .unwrap_err();
    assert_eq!(err.category(), "AuthenticationError");
}

#[tokio::test]
async fn slow_provider_surfaces_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(anthropic_body("late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = ModelClient::Direct(
        DirectApiClient::new("test-key".into(), server.uri(), Duration::from_millis(200)).unwrap(),
    );
    let err = client
        .generate(&request(ProviderKind::DirectApi, "claude-3-haiku"))
        .await
        .unwrap_err();
    assert_eq!(err.category(), "TimeoutError");
}

#[tokio::test]
async fn unreachable_provider_is_unavailable() {
    let client = ModelClient::Gateway(
        GatewayClient::new("k".into(), "http://127.0.0.1:1".into(), TIMEOUT).unwrap(),
    );
    let err = client
        .generate(&request(ProviderKind::Gateway, "gpt-4o"))
        .await
        .unwrap_err();
    assert_eq!(err.category(), "ProviderUnavailableError");
}

#[tokio::test]
async fn empty_completion_is_a_response_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .generate(&request(ProviderKind::Gateway, "gpt-4o"))
        .await
        .unwrap_err();
    assert_eq!(err.category(), "ProviderResponseError");
}
