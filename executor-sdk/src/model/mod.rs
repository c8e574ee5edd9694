//! Canonical data model for the request gateway
//!
//! Every backend is normalized into the same shapes: a `NormalizedRequest`
//! going in, an ordered list of `AttemptSummary` records plus a final
//! `ResponseEnvelope` coming out. Wire names are camelCase to match the
//! gateway's public JSON contract.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EngineError, Result};

/// Type tag for the HTTP call executor
pub const HTTP_EXECUTOR: &str = "http";
/// Type tag for the remote-command executor
pub const COMMAND_EXECUTOR: &str = "command";

/// Canonical description of one unit of work
///
/// Exactly one of `http` / `command` must be present, and it must match the
/// declared `executor` tag. `validate` enforces this once, before dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRequest {
    /// Executor type tag selecting the backend
    pub executor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Per-attempt timeout override in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandSpec>,
}

/// Specification of an outbound HTTP call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpSpec {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// Specification of a remote-command invocation
///
/// `operation` is a logical name resolved through the executor's allowlist,
/// never a raw command string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSpec {
    pub operation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paging: Option<Paging>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_key: Option<String>,
}

/// Paging cursor for command operations that return collections
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
}

/// Classification of one execution attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    Success,
    TransientFailure,
    PermanentFailure,
    Timeout,
}

impl AttemptOutcome {
    /// Stable name used for envelope status strings and log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "Success",
            AttemptOutcome::TransientFailure => "TransientFailure",
            AttemptOutcome::PermanentFailure => "PermanentFailure",
            AttemptOutcome::Timeout => "Timeout",
        }
    }

    /// Whether the retry loop may run another attempt after this outcome
    pub fn is_retryable(&self) -> bool {
        matches!(self, AttemptOutcome::TransientFailure | AttemptOutcome::Timeout)
    }
}

/// The result of one execution attempt, immutable after creation
#[derive(Debug, Clone)]
pub struct AttemptResult {
    pub outcome: AttemptOutcome,
    /// Opaque structured payload, an empty object when the backend had
    /// nothing to report
    pub payload: Value,
    pub error: Option<String>,
}

impl AttemptResult {
    pub fn success(payload: Value) -> Self {
        Self {
            outcome: AttemptOutcome::Success,
            payload,
            error: None,
        }
    }

    pub fn transient(error: impl Into<String>) -> Self {
        Self::failed(AttemptOutcome::TransientFailure, error)
    }

    pub fn permanent(error: impl Into<String>) -> Self {
        Self::failed(AttemptOutcome::PermanentFailure, error)
    }

    pub fn timeout(error: impl Into<String>) -> Self {
        Self::failed(AttemptOutcome::Timeout, error)
    }

    fn failed(outcome: AttemptOutcome, error: impl Into<String>) -> Self {
        Self {
            outcome,
            payload: Value::Object(Default::default()),
            error: Some(error.into()),
        }
    }
}

/// Immutable log record of one attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSummary {
    /// 1-based attempt index
    pub attempt: u32,
    pub outcome: AttemptOutcome,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The caller-facing result, including the full attempt history
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub executor_type: String,
    pub started_utc: DateTime<Utc>,
    pub ended_utc: DateTime<Utc>,
    pub status: String,
    pub attempt_count: u32,
    pub attempts: Vec<AttemptSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Validate a normalized request before dispatch
///
/// Runs on every request path; a failure here short-circuits to a
/// zero-attempt envelope and never reaches an executor.
pub fn validate(req: &NormalizedRequest) -> Result<()> {
    if blank(&req.executor) {
        return Err(EngineError::validation("executor required"));
    }
    if req.executor != HTTP_EXECUTOR && req.executor != COMMAND_EXECUTOR {
        return Err(EngineError::validation(format!(
            "unsupported executor '{}'",
            req.executor
        )));
    }
    if req.executor == HTTP_EXECUTOR && req.http.is_none() {
        return Err(EngineError::validation("http spec required for http executor"));
    }
    if req.executor == COMMAND_EXECUTOR && req.command.is_none() {
        return Err(EngineError::validation(
            "command spec required for command executor",
        ));
    }
    if req.http.is_some() && req.command.is_some() {
        return Err(EngineError::validation(
            "exactly one of http or command spec allowed",
        ));
    }
    if let Some(http) = &req.http {
        if blank(&http.base_url) {
            return Err(EngineError::validation("http.baseUrl required"));
        }
        if blank(&http.method) {
            return Err(EngineError::validation("http.method required"));
        }
    }
    if let Some(command) = &req.command {
        if blank(&command.operation) {
            return Err(EngineError::validation("command.operation required"));
        }
    }
    Ok(())
}
