//! Spawning of hook commands and the exit-code contract.
//!
//! Each command line runs as `sh -c <line>` and receives one JSON payload on
//! stdin. Exit status 0 allows, status 2 blocks with the command's stderr as
//! the reason, and anything else (including spawn failures) is logged and
//! treated as allow. No timeout is imposed; a hung command stalls its
//! invocation.

use std::process::Stdio;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Context payload written to a hook command's stdin, one JSON object per
/// invocation terminated by a newline.
#[derive(Debug, Clone, Serialize)]
pub struct HookPayload {
    pub hook_event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<serde_json::Value>,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
}

impl HookPayload {
    /// Payload for a tool-call phase.
    pub fn for_tool(
        event: impl Into<String>,
        tool_name: impl Into<String>,
        tool_input: serde_json::Value,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            hook_event: event.into(),
            tool_name: Some(tool_name.into()),
            tool_input: Some(tool_input),
            session_id: session_id.into(),
            timestamp: Utc::now(),
        }
    }

    /// Payload for a generic event channel (no tool context).
    pub fn for_event(event: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            hook_event: event.into(),
            tool_name: None,
            tool_input: None,
            session_id: session_id.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Per-command result of the exit-code contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookVerdict {
    /// Exit 0: continue to the next matching rule.
    Allow,
    /// Exit 2: abort the invocation; `reason` carries the command's stderr.
    Block { reason: String },
    /// Any other exit: logged, treated as allow.
    Warn { status: i32 },
}

/// Run one hook command line to completion and map its exit status.
pub async fn run_command(command_line: &str, payload: &HookPayload) -> HookVerdict {
    let payload_json = match serde_json::to_string(payload) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(%e, "failed to serialize hook payload, allowing");
            return HookVerdict::Allow;
        }
    };

    let mut child = match Command::new("sh")
        .arg("-c")
        .arg(command_line)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            tracing::warn!(command = command_line, %e, "failed to spawn hook command, allowing");
            return HookVerdict::Allow;
        }
    };

    if let Some(mut stdin) = child.stdin.take() {
        // The command may exit without reading; a broken pipe here is fine.
        let _ = stdin.write_all(payload_json.as_bytes()).await;
        let _ = stdin.write_all(b"\n").await;
    }

    let output = match child.wait_with_output().await {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!(command = command_line, %e, "failed to wait for hook command, allowing");
            return HookVerdict::Allow;
        }
    };

    match output.status.code() {
        Some(0) => HookVerdict::Allow,
        Some(2) => {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = if stderr.is_empty() {
                format!("hook command blocked the invocation: {command_line}")
            } else {
                stderr
            };
            HookVerdict::Block { reason }
        }
        other => {
            let status = other.unwrap_or(-1);
            tracing::warn!(command = command_line, status, "hook command exited non-zero, allowing");
            HookVerdict::Warn { status }
        }
    }
}
