//! Resilience patterns for the attempt loop
//!
//! This module provides:
//!
//! - `RetryPolicy`: bounded exponential backoff with full jitter, per-attempt
//!   deadlines, and append-only attempt telemetry
//! - `is_retryable_http_status`: the pure status-code retryability verdict
//!   executors consult when classifying non-exceptional responses

pub mod classifier;
pub mod retry;

pub use classifier::is_retryable_http_status;
pub use retry::{RetryPolicy, RetryRun};
