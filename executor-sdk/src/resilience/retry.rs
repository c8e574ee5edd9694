//! Retry with bounded exponential backoff and full jitter
//!
//! Drives the per-request attempt loop: each attempt runs under its own
//! deadline composed with the caller's cancellation, gets exactly one
//! `AttemptSummary` regardless of how it ends, and the wait between attempts
//! is a uniform random fraction of the capped exponential delay (full jitter,
//! which bounds retry storms while keeping the typical wait short).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::{AttemptContext, Clock};
use crate::model::{AttemptResult, AttemptSummary};

/// The outcome of a full retry run
#[derive(Debug)]
pub struct RetryRun {
    /// The last attempt's result
    pub final_result: AttemptResult,
    /// Ordered, append-only attempt telemetry
    pub attempts: Vec<AttemptSummary>,
    /// True when the caller's cancellation cut the loop short
    pub cancelled_by_caller: bool,
}

/// Bounded retry loop with exponential backoff and full jitter
pub struct RetryPolicy {
    clock: Arc<dyn Clock>,
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(
        clock: Arc<dyn Clock>,
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
    ) -> Self {
        Self {
            clock,
            // A request always gets at least one attempt
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Unjittered delay before attempt `attempt + 1`, for 1-based `attempt`
    ///
    /// `min(max_delay, base_delay * 2^(attempt-1))`; the actual wait is a
    /// uniform random fraction of this value.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as f64;
        let max_ms = self.max_delay.as_millis() as f64;
        let exp_ms = base_ms * 2.0_f64.powi(attempt.saturating_sub(1) as i32);
        Duration::from_millis(exp_ms.min(max_ms) as u64)
    }

    /// Run `attempt_fn` until it succeeds, fails permanently, the attempt
    /// budget is spent, or the caller cancels
    ///
    /// Each attempt runs under `per_attempt_timeout`; a deadline expiry is
    /// classified as a `Timeout` outcome and retried like a transient
    /// failure. A caller cancellation aborts the whole loop, after the
    /// in-flight attempt has been recorded.
    pub async fn run<F, Fut>(
        &self,
        attempt_fn: F,
        per_attempt_timeout: Duration,
        outer: &CancellationToken,
    ) -> RetryRun
    where
        F: Fn(AttemptContext) -> Fut,
        Fut: Future<Output = AttemptResult>,
    {
        let mut attempts = Vec::new();

        for attempt in 1..=self.max_attempts {
            let ctx = AttemptContext::new(outer);
            let started = tokio::time::Instant::now();
            let result =
                match tokio::time::timeout(per_attempt_timeout, attempt_fn(ctx.clone())).await {
                    Ok(result) => result,
                    Err(_elapsed) => {
                        ctx.abort();
                        AttemptResult::timeout(format!(
                            "attempt {attempt} exceeded {}ms deadline",
                            per_attempt_timeout.as_millis()
                        ))
                    }
                };
            let duration_ms = started.elapsed().as_millis() as u64;

            attempts.push(AttemptSummary {
                attempt,
                outcome: result.outcome,
                duration_ms,
                error: result.error.clone(),
            });

            if !result.outcome.is_retryable() {
                return RetryRun {
                    final_result: result,
                    attempts,
                    cancelled_by_caller: false,
                };
            }
            if outer.is_cancelled() {
                debug!(attempt, "caller cancelled, aborting retry loop");
                return RetryRun {
                    final_result: result,
                    attempts,
                    cancelled_by_caller: true,
                };
            }
            if attempt == self.max_attempts {
                return RetryRun {
                    final_result: result,
                    attempts,
                    cancelled_by_caller: false,
                };
            }

            let delay = self.backoff_delay(attempt);
            // Full jitter: wait a uniform random fraction of the capped delay.
            // The draw happens before the await so the rng never crosses it.
            let fraction: f64 = rand::thread_rng().gen_range(0.0..1.0);
            let wait = delay.mul_f64(fraction);
            warn!(
                attempt,
                outcome = result.outcome.as_str(),
                wait_ms = wait.as_millis() as u64,
                error = result.error.as_deref().unwrap_or(""),
                "attempt failed with retryable outcome, backing off"
            );
            self.clock.delay(wait, outer).await;
            if outer.is_cancelled() {
                debug!(attempt, "caller cancelled during backoff wait");
                return RetryRun {
                    final_result: result,
                    attempts,
                    cancelled_by_caller: true,
                };
            }
        }

        unreachable!("retry loop exits within max_attempts");
    }
}
