//! Top-level request coordination
//!
//! `Orchestrator::handle` is the one entry point: validate, resolve the
//! executor, drive the retry policy, then assemble the envelope, update the
//! metrics, and emit the per-request log line. Every path ends in a
//! well-formed `ResponseEnvelope`; pre-dispatch faults become zero-attempt
//! `ValidationFailure` envelopes instead of escaping to the transport.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::config::ResilienceConfig;
use crate::core::{Clock, ExecutorRegistry};
use crate::error::EngineError;
use crate::model::{AttemptOutcome, AttemptSummary, NormalizedRequest, ResponseEnvelope};
use crate::observability::Metrics;
use crate::resilience::RetryPolicy;
use crate::security::mask_credentials;

/// Status string for requests rejected before any attempt
const STATUS_VALIDATION_FAILURE: &str = "ValidationFailure";
/// Status string for requests the caller abandoned mid-flight
const STATUS_CANCELLED: &str = "Cancelled";

/// Coordinates validation, dispatch, retries, and envelope assembly
pub struct Orchestrator {
    registry: ExecutorRegistry,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,
    default_attempt_timeout: Duration,
    instance_id: String,
}

impl Orchestrator {
    pub fn new(
        registry: ExecutorRegistry,
        clock: Arc<dyn Clock>,
        metrics: Arc<Metrics>,
        config: &ResilienceConfig,
        instance_id: impl Into<String>,
    ) -> Self {
        let retry = RetryPolicy::new(
            Arc::clone(&clock),
            config.max_attempts,
            config.base_delay,
            config.max_delay,
        );
        Self {
            registry,
            retry,
            clock,
            metrics,
            default_attempt_timeout: config.default_attempt_timeout,
            instance_id: instance_id.into(),
        }
    }

    /// Handle one normalized request end to end
    pub async fn handle(
        &self,
        req: NormalizedRequest,
        outer: &CancellationToken,
    ) -> ResponseEnvelope {
        self.metrics.record_received();
        let started = self.clock.now_utc();
        let request_id = req
            .request_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

        if let Err(fault) = crate::model::validate(&req) {
            return self.reject(req, request_id, started, fault);
        }
        let executor = match self.registry.resolve(&req.executor) {
            Ok(executor) => executor,
            Err(fault) => return self.reject(req, request_id, started, fault),
        };

        let per_attempt_timeout = req
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(self.default_attempt_timeout);

        let req = Arc::new(req);
        let attempt_req = Arc::clone(&req);
        let run = self
            .retry
            .run(
                move |ctx| {
                    let executor = Arc::clone(&executor);
                    let req = Arc::clone(&attempt_req);
                    async move { executor.execute(&req, &ctx).await }
                },
                per_attempt_timeout,
                outer,
            )
            .await;
        let ended = self.clock.now_utc();

        let succeeded = run.final_result.outcome == AttemptOutcome::Success;
        let status = if run.cancelled_by_caller {
            STATUS_CANCELLED.to_string()
        } else {
            run.final_result.outcome.as_str().to_string()
        };

        if succeeded {
            self.metrics.record_succeeded();
        } else {
            self.metrics.record_failed();
        }
        if run.attempts.len() > 1 {
            self.metrics.record_retried();
        }
        for attempt in &run.attempts {
            self.metrics.observe_latency(attempt.duration_ms);
        }

        let attempts: Vec<AttemptSummary> = run
            .attempts
            .into_iter()
            .map(|mut attempt| {
                attempt.error = attempt.error.map(|e| mask_credentials(&e));
                attempt
            })
            .collect();
        let result = succeeded.then(|| {
            let mut payload = run.final_result.payload.clone();
            mask_value(&mut payload);
            payload
        });

        let total_ms = (ended - started).num_milliseconds();
        info!(
            instance = %self.instance_id,
            request_id = %request_id,
            executor = %req.executor,
            status = %status,
            attempts = attempts.len(),
            total_ms,
            "request handled"
        );

        ResponseEnvelope {
            request_id,
            correlation_id: req.correlation_id.clone(),
            executor_type: req.executor.clone(),
            started_utc: started,
            ended_utc: ended,
            status,
            attempt_count: attempts.len() as u32,
            attempts,
            result,
        }
    }

    /// Build the zero-attempt envelope for a pre-dispatch fault
    fn reject(
        &self,
        req: NormalizedRequest,
        request_id: String,
        started: chrono::DateTime<chrono::Utc>,
        fault: EngineError,
    ) -> ResponseEnvelope {
        self.metrics.record_failed();
        let ended = self.clock.now_utc();
        let error = mask_credentials(&fault.to_string());
        info!(
            instance = %self.instance_id,
            request_id = %request_id,
            executor = %req.executor,
            status = STATUS_VALIDATION_FAILURE,
            error = %error,
            "request rejected before dispatch"
        );
        ResponseEnvelope {
            request_id,
            correlation_id: req.correlation_id,
            executor_type: req.executor,
            started_utc: started,
            ended_utc: ended,
            status: STATUS_VALIDATION_FAILURE.to_string(),
            attempt_count: 0,
            attempts: Vec::new(),
            result: Some(json!({ "error": error })),
        }
    }
}

/// Mask credential-like substrings in every string of a payload
fn mask_value(value: &mut Value) {
    match value {
        Value::String(s) => {
            let masked = mask_credentials(s);
            if masked != *s {
                *s = masked;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(mask_value),
        Value::Object(map) => map.values_mut().for_each(mask_value),
        _ => {}
    }
}
