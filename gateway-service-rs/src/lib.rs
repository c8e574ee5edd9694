//! # Gateway Service
//!
//! HTTP entry point for the resilient request-execution gateway. The engine
//! itself lives in `executor-sdk`; this crate binds it to an axum transport,
//! wires the process-wide dependencies, and reads service configuration from
//! the environment.

pub mod config;
pub mod transport;

pub use transport::{normalize_request, router, AppState};

use std::sync::Arc;

use executor_sdk::{
    CommandExecutor, ExecutorRegistry, HeaderFilter, HttpExecutor, Metrics, Orchestrator,
    ResilienceConfig, SystemClock,
};

/// Construct the fully wired application state
///
/// One clock, one metrics store, one executor registry, shared by every
/// request for the life of the process.
pub fn build_state(resilience: &ResilienceConfig, instance_id: String) -> AppState {
    let metrics = Arc::new(Metrics::new());
    let clock = Arc::new(SystemClock);

    let registry = ExecutorRegistry::new()
        .register(Arc::new(HttpExecutor::new(
            reqwest::Client::new(),
            HeaderFilter::default(),
        )))
        .register(Arc::new(CommandExecutor::default()));

    let orchestrator = Arc::new(Orchestrator::new(
        registry,
        clock,
        Arc::clone(&metrics),
        resilience,
        instance_id,
    ));

    AppState {
        orchestrator,
        metrics,
    }
}
