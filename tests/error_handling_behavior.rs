//! Behavior-driven tests for error classification and retry.
//!
//! These tests verify HOW raw transport and HTTP failures become
//! [`AppError`]s, which of them are retried, and what the user is shown.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use stockgrid_core::{
    AppError, ClientConfig, ErrorClassifier, ErrorKind, HttpError, HttpResponse, MarketDataClient,
    NetworkFlag, RawError, RetryConfig, RetryPolicy, TokioClock,
};
use tokio::time::Instant;

use stockgrid_tests::{shared, PinnedDateClock, Reply, ScriptedHttpClient, BASE_URL};

fn status(status: u16) -> RawError {
    RawError::Status {
        status,
        message: None,
    }
}

fn policy(config: RetryConfig) -> RetryPolicy {
    RetryPolicy::new(config, ErrorClassifier::default(), Arc::new(TokioClock))
}

// =============================================================================
// Classification
// =============================================================================

#[test]
fn when_upstream_returns_429_the_error_is_a_retryable_rate_limit() {
    // Given: A classifier
    let classifier = ErrorClassifier::default();

    // When: A 429 is classified
    let error = classifier.classify(status(429));

    // Then: It is RATE_LIMIT and retryable
    assert_eq!(error.kind(), ErrorKind::RateLimit);
    assert!(classifier.is_retryable(&error));
}

#[test]
fn when_upstream_returns_404_the_error_is_a_terminal_not_found() {
    let classifier = ErrorClassifier::default();

    let error = classifier.classify(status(404));

    assert_eq!(error.kind(), ErrorKind::NotFound);
    assert!(!classifier.is_retryable(&error));
}

#[test]
fn when_each_kind_is_checked_only_transient_kinds_are_retryable() {
    let retryable = ErrorKind::ALL
        .into_iter()
        .filter(|kind| AppError::new(*kind, "x").is_retryable())
        .collect::<Vec<_>>();

    assert_eq!(
        retryable,
        vec![ErrorKind::RateLimit, ErrorKind::NetworkError, ErrorKind::Timeout]
    );
}

#[test]
fn when_server_sends_a_message_it_is_preserved_for_api_errors() {
    // Given: A 502 with a JSON error body
    let response = HttpResponse::new(502, r#"{"status":"ERROR","message":"bad gateway upstream"}"#);

    // When: It is classified
    let error = ErrorClassifier::default().classify(RawError::from_response(&response));

    // Then: The server message is kept
    assert_eq!(error.kind(), ErrorKind::ApiError);
    assert_eq!(error.message(), "bad gateway upstream");
    assert_eq!(error.http_status(), Some(502));
}

#[test]
fn when_the_client_is_offline_no_response_is_a_network_error() {
    // Given: A connectivity flag reporting offline
    let flag = NetworkFlag::new(false);
    let classifier = ErrorClassifier::new(Arc::new(flag.clone()));

    // When: A request gets no response
    let offline = classifier.classify(HttpError::no_response("dns lookup failed"));
    flag.set_online(true);
    let online = classifier.classify(HttpError::no_response("deadline elapsed"));

    // Then: Offline means NETWORK_ERROR, online means TIMEOUT
    assert_eq!(offline.kind(), ErrorKind::NetworkError);
    assert_eq!(offline.user_message(), "Please check your internet connection");
    assert_eq!(online.kind(), ErrorKind::Timeout);
}

#[test]
fn when_an_app_error_is_classified_again_it_is_unchanged() {
    let classifier = ErrorClassifier::default();
    let original = AppError::new(ErrorKind::NotFound, "custom message").with_status(418);

    let reclassified = classifier.classify(original.clone());

    assert_eq!(reclassified, original);
}

#[test]
fn when_rate_limit_survives_retries_the_user_sees_a_distinct_message() {
    let rate_limited = ErrorClassifier::default().classify(status(429));
    let api_error = ErrorClassifier::default().classify(status(500));

    assert_eq!(rate_limited.title(), "RATE LIMIT");
    assert_ne!(rate_limited.user_message(), api_error.user_message());
    assert_eq!(api_error.user_message(), "API request failed");
}

// =============================================================================
// Retry
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_failures_are_always_retryable_attempts_equal_max_retries_plus_one() {
    // Given: An attempt that always times out
    let calls = AtomicU32::new(0);
    let start = Instant::now();

    // When: It is wrapped with the default retry policy
    let error = policy(RetryConfig::default())
        .with_retry(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(HttpError::no_response("timed out")) }
        })
        .await
        .expect_err("retries exhausted");

    // Then: Four attempts, 14s of backoff, and a classified error
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(start.elapsed(), Duration::from_millis(14_000));
    assert_eq!(error.kind(), ErrorKind::Timeout);
    assert_eq!(error.message(), "Request timeout");
}

#[tokio::test(start_paused = true)]
async fn when_max_retries_is_zero_only_one_attempt_is_made() {
    let calls = AtomicU32::new(0);

    let error = policy(RetryConfig::no_retry())
        .with_retry(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(status(429)) }
        })
        .await
        .expect_err("no retries");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(error.kind(), ErrorKind::RateLimit);
}

// =============================================================================
// Through the façade
// =============================================================================

fn client(
    http: &Arc<ScriptedHttpClient>,
    flag: &NetworkFlag,
    retry: RetryConfig,
) -> MarketDataClient {
    MarketDataClient::builder(
        ClientConfig::new("test-key")
            .with_base_url(BASE_URL)
            .with_retry(retry),
    )
    .http_client(Arc::clone(http) as Arc<dyn stockgrid_core::HttpClient>)
    .clock(Arc::new(PinnedDateClock::new()))
    .network_status(Arc::new(flag.clone()))
    .build()
}

#[tokio::test(start_paused = true)]
async fn when_a_transient_failure_clears_the_caller_gets_data() {
    // Given: One timeout followed by a good page
    let http = shared(ScriptedHttpClient::new());
    http.push(Reply::Fail(HttpError::no_response("connection reset")))
        .respond(200, stockgrid_tests::ticker_page(&["IBM"], None));
    let client = client(&http, &NetworkFlag::default(), RetryConfig::default());

    // When: A listing is requested
    let page = client.fetch_stocks(Some("IBM"), None).await.expect("retried");

    // Then: The retry recovered transparently
    assert_eq!(page.results[0].ticker, "IBM");
    assert_eq!(http.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn when_offline_the_facade_reports_a_network_error() {
    // Given: An offline client and a transport that never answers
    let http = shared(ScriptedHttpClient::new());
    http.always(Reply::Fail(HttpError::no_response("network unreachable")));
    let flag = NetworkFlag::new(false);
    let client = client(&http, &flag, RetryConfig::exponential(1, Duration::from_millis(100)));

    // When: Details are requested
    let error = client
        .fetch_stock_details("AAPL")
        .await
        .expect_err("offline must fail");

    // Then: The failure is NETWORK_ERROR after the configured attempts
    assert_eq!(error.kind(), ErrorKind::NetworkError);
    assert_eq!(http.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn when_credentials_are_rejected_the_call_fails_immediately() {
    // Given: An upstream that rejects the API key
    let http = shared(ScriptedHttpClient::new());
    http.always(Reply::Respond(HttpResponse::new(
        401,
        r#"{"status":"ERROR","error":"Unknown API Key"}"#,
    )));
    let client = client(&http, &NetworkFlag::default(), RetryConfig::default());

    // When: A listing is requested
    let error = client.fetch_stocks(None, None).await.expect_err("auth fails");

    // Then: AUTH_ERROR is terminal and the upstream reason is kept as the cause
    assert_eq!(error.kind(), ErrorKind::AuthError);
    assert_eq!(error.message(), "Authentication failed");
    assert_eq!(error.cause(), Some("Unknown API Key"));
    assert_eq!(http.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn when_the_body_is_not_json_an_api_error_is_returned() {
    let http = shared(ScriptedHttpClient::new());
    http.respond(200, "<html>maintenance</html>");
    let client = client(&http, &NetworkFlag::default(), RetryConfig::default());

    let error = client.fetch_stocks(None, None).await.expect_err("malformed");

    assert_eq!(error.kind(), ErrorKind::ApiError);
    assert!(client.cache().is_empty().await);
}
