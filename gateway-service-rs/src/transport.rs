//! HTTP transport for the request gateway
//!
//! Normalizes inbound requests into the SDK's canonical shape and hands them
//! to the orchestrator. The transport always answers 200: operation-level
//! success or failure travels inside the envelope's status field, and a few
//! `X-RRE-*` response headers echo the envelope's summary fields.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use tokio_util::sync::CancellationToken;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use executor_sdk::{
    CommandSpec, HttpSpec, Metrics, NormalizedRequest, Orchestrator, COMMAND_EXECUTOR,
    HTTP_EXECUTOR,
};

/// Maximum accepted request payload size (10MB)
pub const MAX_PAYLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub metrics: Arc<Metrics>,
}

/// Build the service router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "request gateway" }))
        .route("/ping", get(|| async { "pong" }))
        .route("/metrics", get(metrics_snapshot))
        .route("/api/*path", any(relay))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAX_PAYLOAD_SIZE))
        .with_state(state)
}

async fn metrics_snapshot(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}

async fn relay(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let req = normalize_request(&method, &path, query, &headers, &body);

    // Per-request cancellation scope, the transport's side of the outer token.
    // The run itself lives on a spawned task; if the client disconnects, this
    // handler future is dropped and the guard cancels the token, so the task
    // stops retrying and still records its telemetry.
    let cancel = CancellationToken::new();
    let _abort_guard = cancel.clone().drop_guard();
    let orchestrator = Arc::clone(&state.orchestrator);
    let run = tokio::spawn(async move { orchestrator.handle(req, &cancel).await });
    let envelope = match run.await {
        Ok(envelope) => envelope,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let request_id = envelope.request_id.clone();
    let correlation_id = envelope.correlation_id.clone().unwrap_or_default();
    let executor_type = envelope.executor_type.clone();
    let attempt_count = envelope.attempt_count;

    let mut response = Json(envelope).into_response();
    let response_headers = response.headers_mut();
    insert_header(response_headers, "x-rre-request-id", &request_id);
    insert_header(response_headers, "x-rre-correlation-id", &correlation_id);
    insert_header(response_headers, "x-rre-executor", &executor_type);
    insert_header(response_headers, "x-rre-attempts", &attempt_count.to_string());
    response
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|v| !v.trim().is_empty())
}

/// Header names the gateway forwards to the HTTP backend verbatim
fn is_forwardable(name: &str) -> bool {
    matches!(name, "authorization" | "accept" | "content-type")
        || name.starts_with("x-forward-")
}

/// Build the canonical request from the wire request
///
/// The executor tag comes from `X-Executor` and defaults to `http`; the
/// type-specific spec is assembled from the matching `X-*` headers, the route
/// path, and the body. Missing required fields are left empty so validation
/// rejects them uniformly inside the engine.
pub fn normalize_request(
    method: &Method,
    path: &str,
    query: HashMap<String, String>,
    headers: &HeaderMap,
    body: &Bytes,
) -> NormalizedRequest {
    let executor =
        header_str(headers, "x-executor").unwrap_or_else(|| HTTP_EXECUTOR.to_string());

    let http = (executor == HTTP_EXECUTOR).then(|| {
        let forwarded: HashMap<String, String> = headers
            .iter()
            .filter(|(name, _)| is_forwardable(name.as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        HttpSpec {
            base_url: header_str(headers, "x-base-url").unwrap_or_default(),
            path: Some(path.to_string()),
            method: method.as_str().to_string(),
            query: (!query.is_empty()).then(|| query.clone()),
            headers: (!forwarded.is_empty()).then_some(forwarded),
            body: (!body.is_empty())
                .then(|| serde_json::from_slice(body).ok())
                .flatten(),
        }
    });

    let command = (executor == COMMAND_EXECUTOR).then(|| {
        let parameters: HashMap<String, String> = headers
            .iter()
            .filter_map(|(name, value)| {
                name.as_str()
                    .strip_prefix("x-command-param-")
                    .zip(value.to_str().ok())
                    .map(|(param, v)| (param.to_string(), v.to_string()))
            })
            .collect();
        CommandSpec {
            operation: header_str(headers, "x-command-op").unwrap_or_default(),
            parameters: (!parameters.is_empty()).then_some(parameters),
            paging: None,
            tenant_key: header_str(headers, "x-tenant"),
        }
    });

    NormalizedRequest {
        executor,
        request_id: header_str(headers, "x-request-id"),
        correlation_id: header_str(headers, "x-correlation-id"),
        timeout_ms: header_str(headers, "x-timeout-ms").and_then(|v| v.parse().ok()),
        http,
        command,
    }
}
