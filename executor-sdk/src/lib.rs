//! # Executor SDK
//!
//! The execution-and-resilience engine behind the request gateway.
//!
//! This crate provides:
//!
//! - A canonical request/response model shared by every backend
//! - The `Executor` trait and a type-keyed registry for backend dispatch
//! - A retry loop with bounded exponential backoff and full jitter
//! - Per-attempt deadlines composed with caller cancellation
//! - Process-wide counters and a bounded latency window
//! - Credential redaction and outbound header filtering
//!
//! ## Architecture
//!
//! The SDK is designed around the following key abstractions:
//!
//! - `NormalizedRequest`: one uniform description of a unit of work
//! - `Executor`: performs a single attempt of a normalized request
//! - `RetryPolicy`: drives attempts, records telemetry, decides when to stop
//! - `Orchestrator`: validates, dispatches, and assembles the final envelope
//! - `Metrics`: shared counters plus an average/p95 latency snapshot

// Core abstractions: clock, executor trait, registry
pub mod core;
pub use core::{AttemptContext, Clock, Executor, ExecutorRegistry, SystemClock};

// Canonical data model and request validation
pub mod model;
pub use model::{
    validate, AttemptOutcome, AttemptResult, AttemptSummary, CommandSpec, HttpSpec,
    NormalizedRequest, Paging, ResponseEnvelope, COMMAND_EXECUTOR, HTTP_EXECUTOR,
};

// Error handling
pub mod error;
pub use error::{EngineError, Result};

// Resilience: retry loop and status classification
pub mod resilience;
pub use resilience::{is_retryable_http_status, RetryPolicy, RetryRun};

// Reference executors
pub mod executors;
pub use executors::{CommandExecutor, HttpExecutor};

// Observability
pub mod observability;
pub use observability::{Metrics, MetricsSnapshot};

// Security controls
pub mod security;
pub use security::{mask_credentials, HeaderFilter};

// Top-level coordination
pub mod orchestrator;
pub use orchestrator::Orchestrator;

// Engine configuration
pub mod config;
pub use config::ResilienceConfig;

#[cfg(test)]
mod tests;
