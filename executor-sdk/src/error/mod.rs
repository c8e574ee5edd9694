//! Error handling for the Executor SDK
//!
//! Backend failures are not errors here: they are `AttemptOutcome` values
//! captured inside the retry loop. `EngineError` covers only the faults that
//! stop a request before any attempt runs (bad input, missing wiring); the
//! orchestrator converts them into zero-attempt failure envelopes rather than
//! letting them escape.

use thiserror::Error;

/// Result type for Executor SDK operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Faults raised before any attempt is dispatched
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed or incomplete normalized request
    #[error("Validation error: {0}")]
    Validation(String),

    /// Broken process wiring, e.g. an executor type with no binding
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl EngineError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        EngineError::Configuration(message.into())
    }
}
