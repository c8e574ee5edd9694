//! Allowlisted remote-command executor
//!
//! The request names a logical operation, never a raw command string; the
//! allowlist maps it to the underlying command identifier and anything
//! unmapped is rejected outright. This is a security boundary: a caller can
//! only ever reach the operations the deployment chose to expose.
//!
//! The actual remote session (per-tenant connection, command invocation,
//! teardown) belongs to an external collaborator; this executor fixes the
//! input/output contract and returns simulated result objects.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::json;

use crate::core::{AttemptContext, Executor};
use crate::model::{AttemptResult, NormalizedRequest, COMMAND_EXECUTOR};

/// Executor for the `command` type tag
pub struct CommandExecutor {
    allowlist: HashMap<String, String>,
}

impl CommandExecutor {
    /// Build with the deployment-supplied operation allowlist
    pub fn new(allowlist: HashMap<String, String>) -> Self {
        Self { allowlist }
    }

    /// The commands a mapped operation resolves to
    pub fn allowed_operations(&self) -> Vec<&str> {
        self.allowlist.keys().map(String::as_str).collect()
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        let mut allowlist = HashMap::new();
        allowlist.insert("ListMailboxes".to_string(), "Get-EXOMailbox".to_string());
        allowlist.insert("ListGroups".to_string(), "Get-EXOGroup".to_string());
        Self::new(allowlist)
    }
}

#[async_trait]
impl Executor for CommandExecutor {
    fn kind(&self) -> &str {
        COMMAND_EXECUTOR
    }

    async fn execute(&self, req: &NormalizedRequest, _ctx: &AttemptContext) -> AttemptResult {
        let Some(spec) = &req.command else {
            return AttemptResult::permanent("command spec missing");
        };

        let Some(command) = self.allowlist.get(&spec.operation) else {
            return AttemptResult::permanent(format!(
                "Operation '{}' not allowed",
                spec.operation
            ));
        };

        let objects = json!([
            { "displayName": "Sample Mailbox", "primarySmtpAddress": "sample@example.com" },
            { "displayName": "Another", "primarySmtpAddress": "another@example.com" },
        ]);

        AttemptResult::success(json!({
            "command": command,
            "parameters": spec.parameters.clone().unwrap_or_default(),
            "stdout": "(simulated)",
            "stderr": "",
            "objects": objects,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttemptOutcome, CommandSpec};
    use tokio_util::sync::CancellationToken;

    fn request(operation: &str) -> NormalizedRequest {
        NormalizedRequest {
            executor: COMMAND_EXECUTOR.to_string(),
            request_id: None,
            correlation_id: None,
            timeout_ms: None,
            http: None,
            command: Some(CommandSpec {
                operation: operation.to_string(),
                parameters: Some(HashMap::from([(
                    "ResultSize".to_string(),
                    "10".to_string(),
                )])),
                paging: None,
                tenant_key: Some("tenant-a".to_string()),
            }),
        }
    }

    #[tokio::test]
    async fn allowlisted_operation_succeeds_with_mapped_command() {
        let executor = CommandExecutor::default();
        let ctx = AttemptContext::new(&CancellationToken::new());
        let result = executor.execute(&request("ListMailboxes"), &ctx).await;

        assert_eq!(result.outcome, AttemptOutcome::Success);
        assert_eq!(result.payload["command"], "Get-EXOMailbox");
        assert_eq!(result.payload["parameters"]["ResultSize"], "10");
    }

    #[tokio::test]
    async fn unlisted_operation_is_a_permanent_failure() {
        let executor = CommandExecutor::default();
        let ctx = AttemptContext::new(&CancellationToken::new());
        let result = executor.execute(&request("Remove-Everything"), &ctx).await;

        assert_eq!(result.outcome, AttemptOutcome::PermanentFailure);
        assert!(result
            .error
            .as_deref()
            .unwrap()
            .contains("'Remove-Everything' not allowed"));
    }

    #[tokio::test]
    async fn custom_allowlist_replaces_the_default() {
        let executor = CommandExecutor::new(HashMap::from([(
            "ListUsers".to_string(),
            "Get-User".to_string(),
        )]));
        let ctx = AttemptContext::new(&CancellationToken::new());

        let ok = executor.execute(&request("ListUsers"), &ctx).await;
        assert_eq!(ok.outcome, AttemptOutcome::Success);

        let rejected = executor.execute(&request("ListMailboxes"), &ctx).await;
        assert_eq!(rejected.outcome, AttemptOutcome::PermanentFailure);
    }
}
