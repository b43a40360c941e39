//! Behavior-driven tests for error handling and credential hygiene.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use findata_core::{
    ApiKey, ClientConfig, ConfigError, ErrorKind, HttpClient, HttpError, HttpRequest,
    HttpResponse, RetryConfig, ToolDispatcher, API_KEY_HEADER,
};
use findata_tests::{args, config, dispatcher, RecordingHttpClient, TEST_KEY};
use serde_json::json;

struct SilentUpstream;

impl HttpClient for SilentUpstream {
    fn execute<'a>(
        &'a self,
        _request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(std::future::pending())
    }
}

// =============================================================================
// Security: credential handling
// =============================================================================

#[tokio::test]
async fn when_any_tool_is_called_credential_travels_only_in_header() {
    let http = RecordingHttpClient::json(json!({ "news": [{ "title": "t" }] }));
    let dispatcher = dispatcher(http.clone());

    dispatcher.dispatch("get_news", &args(json!({ "ticker": "AAPL" }))).await;

    let request = &http.requests()[0];
    assert!(!request.url.contains(TEST_KEY), "url leaked credential: {}", request.url);
    assert_eq!(
        request.headers.get(&API_KEY_HEADER.to_ascii_lowercase()).map(String::as_str),
        Some(TEST_KEY)
    );
}

#[test]
fn when_configuration_is_printed_credential_is_redacted() {
    let http = RecordingHttpClient::json(json!({}));
    let dispatcher = dispatcher(http);

    assert!(!format!("{dispatcher:?}").contains(TEST_KEY));
    assert!(!format!("{:?}", config(2)).contains(TEST_KEY));
}

#[test]
fn when_credential_is_blank_configuration_is_rejected() {
    assert_eq!(ApiKey::new(""), Err(ConfigError::EmptyApiKey));
    assert_eq!(ApiKey::new(" \t"), Err(ConfigError::EmptyApiKey));
}

#[tokio::test]
async fn when_failure_is_reported_message_never_contains_credential() {
    let http = RecordingHttpClient::always(Err(HttpError::connect("connection refused")));
    let dispatcher = dispatcher(http.clone());

    let result = dispatcher.dispatch("get_current_price", &args(json!({ "ticker": "AAPL" }))).await;

    let rendered = result.to_value().to_string();
    assert!(!rendered.contains(TEST_KEY));
    assert_eq!(result.error_kind(), Some(ErrorKind::UpstreamUnavailable));
}

// =============================================================================
// Error handling: timeouts and isolation
// =============================================================================

#[tokio::test]
async fn when_upstream_never_answers_call_resolves_to_failure() {
    // Given: an upstream that never responds and a short timeout
    let config = ClientConfig::new(ApiKey::new(TEST_KEY).expect("key"))
        .with_timeout_ms(25)
        .with_retry(RetryConfig::immediate(1));
    let dispatcher = ToolDispatcher::new(config, Arc::new(SilentUpstream));

    // When: a tool is called
    let result = dispatcher.dispatch("get_news", &args(json!({ "ticker": "AAPL" }))).await;

    // Then: the call fails as unavailable instead of hanging
    let error = result.error().expect("failure");
    assert_eq!(error.kind(), ErrorKind::UpstreamUnavailable);
    assert!(error.message().contains("timed out"), "{}", error.message());
}

#[tokio::test]
async fn when_calls_run_concurrently_they_do_not_interfere() {
    let http = RecordingHttpClient::json(json!({
        "snapshot": { "price": 10.0, "time": "2024-05-01T20:00:00Z" }
    }));
    let dispatcher = dispatcher(http.clone());

    let handles: Vec<_> = ["AAPL", "MSFT", "NVDA", "TSLA"]
        .into_iter()
        .map(|ticker| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                dispatcher
                    .dispatch("get_current_price", &args(json!({ "ticker": ticker })))
                    .await
            })
        })
        .collect();

    for handle in handles {
        let result = handle.await.expect("task completes");
        assert!(result.is_success());
    }
    assert_eq!(http.call_count(), 4);
}

#[tokio::test]
async fn when_upstream_returns_unexpected_client_error_user_gets_invalid_argument() {
    let http = RecordingHttpClient::always(Ok(HttpResponse::new(
        400,
        r#"{"error":"Bad Request","message":"limit exceeds maximum"}"#,
    )));
    let dispatcher = dispatcher(http.clone());

    let result = dispatcher
        .dispatch("get_news", &args(json!({ "ticker": "AAPL", "limit": 5000 })))
        .await;

    assert_eq!(http.call_count(), 1);
    let error = result.error().expect("failure");
    assert_eq!(error.kind(), ErrorKind::InvalidArgument);
    assert!(error.message().contains("limit exceeds maximum"));
}
