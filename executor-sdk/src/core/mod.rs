//! Core abstractions: clock, attempt scope, executor contract, dispatch
//!
//! These are the seams the rest of the engine is built against. The clock is
//! a trait so retry timing is substitutable in tests; executors are trait
//! objects selected through a type-keyed registry built once at startup.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::error::{EngineError, Result};
use crate::model::{AttemptResult, NormalizedRequest};

/// Wall-clock time and delay, substitutable for deterministic testing
#[async_trait]
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;

    /// Suspend for `duration`, returning early if `cancel` fires
    async fn delay(&self, duration: Duration, cancel: &CancellationToken);
}

/// Production clock backed by `tokio::time`
#[derive(Debug, Default, Clone)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn delay(&self, duration: Duration, cancel: &CancellationToken) {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = cancel.cancelled() => {}
        }
    }
}

/// Cancellation scope handed to each attempt
///
/// The attempt token is a child of the caller's token, so an executor racing
/// its I/O against `cancelled()` is interrupted promptly when the caller goes
/// away. The per-attempt deadline is enforced outside the executor by the
/// retry policy; `caller_gave_up()` lets the two sources be told apart.
#[derive(Debug, Clone)]
pub struct AttemptContext {
    token: CancellationToken,
    outer: CancellationToken,
}

impl AttemptContext {
    pub fn new(outer: &CancellationToken) -> Self {
        Self {
            token: outer.child_token(),
            outer: outer.clone(),
        }
    }

    /// Resolves when the attempt should stop
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True when the cancellation came from the caller rather than a deadline
    pub fn caller_gave_up(&self) -> bool {
        self.outer.is_cancelled()
    }

    /// Cancel this attempt's scope without touching the caller's token
    ///
    /// Used by the retry policy when the per-attempt deadline fires, so any
    /// work the executor left in flight stops promptly.
    pub fn abort(&self) {
        self.token.cancel();
    }
}

/// A pluggable backend capable of performing one attempt
#[async_trait]
pub trait Executor: Send + Sync {
    /// The type tag this executor is bound to
    fn kind(&self) -> &str;

    /// Perform one attempt of the request
    ///
    /// Implementations must honor `ctx` promptly and never panic on backend
    /// failures: every failure mode maps to an `AttemptResult` outcome.
    async fn execute(&self, req: &NormalizedRequest, ctx: &AttemptContext) -> AttemptResult;
}

impl std::fmt::Debug for dyn Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor").field("kind", &self.kind()).finish()
    }
}

/// Type-keyed executor dispatch, built once at startup
#[derive(Default, Clone)]
pub struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn Executor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an executor under its own type tag, replacing any previous binding
    pub fn register(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executors.insert(executor.kind().to_string(), executor);
        self
    }

    /// Resolve the executor bound to `kind`
    ///
    /// An unknown tag is a configuration fault, surfaced before any attempt
    /// runs rather than as one of the attempt outcomes.
    pub fn resolve(&self, kind: &str) -> Result<Arc<dyn Executor>> {
        self.executors.get(kind).cloned().ok_or_else(|| {
            EngineError::configuration(format!("no executor bound for type '{kind}'"))
        })
    }

    pub fn kinds(&self) -> Vec<&str> {
        self.executors.keys().map(String::as_str).collect()
    }
}
