//! End-to-end tests through the axum router
//!
//! A wiremock server stands in for the downstream target; requests enter the
//! gateway exactly as they would over the wire and come back as envelopes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use executor_sdk::{
    AttemptContext, AttemptResult, Executor, ExecutorRegistry, Metrics, NormalizedRequest,
    Orchestrator, ResilienceConfig, SystemClock,
};
use gateway_service::{build_state, router, AppState};

fn quick_resilience() -> ResilienceConfig {
    ResilienceConfig {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
        default_attempt_timeout: Duration::from_secs(5),
    }
}

fn app() -> axum::Router {
    router(build_state(&quick_resilience(), "test-node".to_string()))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn end_to_end_local_echo() {
    let target = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/echo"))
        .and(query_param("hello", "world"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&target)
        .await;

    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/echo?hello=world")
                .header("X-Executor", "http")
                .header("X-Base-Url", target.uri())
                .header("X-Request-ID", "it-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-rre-request-id").unwrap(),
        "it-1"
    );
    assert_eq!(response.headers().get("x-rre-attempts").unwrap(), "1");

    let envelope = body_json(response).await;
    assert_eq!(envelope["status"], "Success");
    assert_eq!(envelope["attemptCount"], 1);
    assert_eq!(envelope["result"]["statusCode"], 200);
}

#[tokio::test]
async fn missing_base_url_is_rejected_with_zero_attempts() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/anything")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Transport-level success; the failure lives in the envelope
    assert_eq!(response.status(), StatusCode::OK);
    let envelope = body_json(response).await;
    assert_eq!(envelope["status"], "ValidationFailure");
    assert_eq!(envelope["attemptCount"], 0);
}

#[tokio::test]
async fn command_operation_round_trip() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/ops")
                .header("X-Executor", "command")
                .header("X-Command-Op", "ListMailboxes")
                .header("X-Command-Param-ResultSize", "5")
                .header("X-Tenant", "tenant-a")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let envelope = body_json(response).await;
    assert_eq!(envelope["status"], "Success");
    assert_eq!(envelope["result"]["command"], "Get-EXOMailbox");
}

#[tokio::test]
async fn disallowed_command_operation_fails_without_retries() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/ops")
                .header("X-Executor", "command")
                .header("X-Command-Op", "WipeTenant")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let envelope = body_json(response).await;
    assert_eq!(envelope["status"], "PermanentFailure");
    assert_eq!(envelope["attemptCount"], 1);
}

/// Executor that announces its first attempt and then parks until cancelled
struct HangingExecutor {
    started: Arc<Notify>,
}

#[async_trait]
impl Executor for HangingExecutor {
    fn kind(&self) -> &str {
        "http"
    }

    async fn execute(&self, _req: &NormalizedRequest, ctx: &AttemptContext) -> AttemptResult {
        self.started.notify_one();
        ctx.cancelled().await;
        AttemptResult::timeout("request cancelled by caller")
    }
}

#[tokio::test]
async fn dropped_connection_cancels_the_in_flight_run() {
    let started = Arc::new(Notify::new());
    let metrics = Arc::new(Metrics::new());
    let registry = ExecutorRegistry::new().register(Arc::new(HangingExecutor {
        started: Arc::clone(&started),
    }));
    let orchestrator = Arc::new(Orchestrator::new(
        registry,
        Arc::new(SystemClock),
        Arc::clone(&metrics),
        &quick_resilience(),
        "test-node".to_string(),
    ));
    let app = router(AppState {
        orchestrator,
        metrics: Arc::clone(&metrics),
    });

    let in_flight = tokio::spawn(
        app.oneshot(
            Request::builder()
                .uri("/api/echo")
                .header("X-Base-Url", "http://backend:9000")
                .body(Body::empty())
                .unwrap(),
        ),
    );

    // The client goes away while the executor is still working
    started.notified().await;
    in_flight.abort();

    // The detached run observes the cancellation and still records the request
    let mut recorded = false;
    for _ in 0..200 {
        let snapshot = metrics.snapshot();
        if snapshot.total == 1 && snapshot.failed == 1 {
            recorded = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(recorded, "cancelled run never reached the metrics");
    assert_eq!(metrics.snapshot().success, 0);
}

#[tokio::test]
async fn metrics_endpoint_reflects_handled_requests() {
    let app = app();

    let _ = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/nowhere")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let snapshot = body_json(response).await;
    assert_eq!(snapshot["total"], 1);
    assert_eq!(snapshot["failed"], 1);
    assert!(snapshot.get("avgLatencyMs").is_some());
}

#[tokio::test]
async fn ping_answers_pong() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/ping")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"pong");
}
