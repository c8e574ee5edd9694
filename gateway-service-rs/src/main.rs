// gateway-service-rs/src/main.rs
// Request Execution Gateway - HTTP entry point
//
// Accepts a normalized unit of work (outbound HTTP call or allowlisted
// remote-command operation), dispatches it to the bound executor, and retries
// transient failures with bounded exponential backoff and full jitter. Every
// response is a structured envelope carrying the full attempt history.

use executor_sdk::ResilienceConfig;
use gateway_service::{build_state, config, router};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let resilience = ResilienceConfig::from_env();
    let instance_id = config::instance_id();
    info!(
        instance = %instance_id,
        max_attempts = resilience.max_attempts,
        base_delay_ms = resilience.base_delay.as_millis() as u64,
        max_delay_ms = resilience.max_delay.as_millis() as u64,
        default_timeout_ms = resilience.default_attempt_timeout.as_millis() as u64,
        "starting gateway service"
    );

    let state = build_state(&resilience, instance_id);
    let app = router(state);

    let addr = config::bind_address();
    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
