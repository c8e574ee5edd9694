//! Engine configuration
//!
//! Tunables come from the environment with safe defaults, in the same
//! warn-and-fall-back style the rest of the platform uses for service
//! configuration.

use std::env;
use std::time::Duration;

/// Retry and timeout tunables for the engine
#[derive(Debug, Clone, PartialEq)]
pub struct ResilienceConfig {
    /// Attempt budget per request, including the first attempt
    pub max_attempts: u32,
    /// Backoff delay before the second attempt
    pub base_delay: Duration,
    /// Upper bound on the unjittered backoff delay
    pub max_delay: Duration,
    /// Per-attempt deadline used when the request does not override it
    pub default_attempt_timeout: Duration,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_millis(2000),
            default_attempt_timeout: Duration::from_millis(5000),
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("Invalid value in {}, using default {}", name, default);
            default
        }),
        Err(_) => default,
    }
}

impl ResilienceConfig {
    /// Load tunables from `GATEWAY_*` environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: env_u64("GATEWAY_MAX_ATTEMPTS", defaults.max_attempts as u64) as u32,
            base_delay: Duration::from_millis(env_u64(
                "GATEWAY_BASE_DELAY_MS",
                defaults.base_delay.as_millis() as u64,
            )),
            max_delay: Duration::from_millis(env_u64(
                "GATEWAY_MAX_DELAY_MS",
                defaults.max_delay.as_millis() as u64,
            )),
            default_attempt_timeout: Duration::from_millis(env_u64(
                "GATEWAY_DEFAULT_TIMEOUT_MS",
                defaults.default_attempt_timeout.as_millis() as u64,
            )),
        }
    }
}
