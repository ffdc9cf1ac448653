// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process execution errors.

/// Errors that can occur while launching or waiting on an external command.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The command ran and exited unsuccessfully.
    #[error("command `{command}` failed with exit code {}: {}", fmt_code(.code), .output.trim())]
    Failed { command: String, code: Option<i32>, output: String },

    /// Command not found or could not be spawned.
    #[error("failed to spawn `{command}`: {source}")]
    SpawnFailed { command: String, source: std::io::Error },

    /// A pre-start hook refused to launch the command.
    #[error("pre-start hook aborted `{command}`: {message}")]
    Hook { command: String, message: String },

    /// A background command ended before it reported as started.
    #[error("command `{command}` never started: {reason}")]
    NotStarted { command: String, reason: String },

    /// The caller's cancellation token fired; the process was killed.
    #[error("command `{command}` was cancelled")]
    Cancelled { command: String },

    /// The background task driving the process went away.
    #[error("command `{command}` was detached before completing")]
    Detached { command: String },
}

fn fmt_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string()).unwrap_or_else(|| "none (signalled)".to_string())
}

impl ExecError {
    /// Exit code of a command that ran to completion.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecError::Failed { code, .. } => *code,
            _ => None,
        }
    }

    /// Combined output of a failed command.
    pub fn output(&self) -> &str {
        match self {
            ExecError::Failed { output, .. } => output,
            _ => "",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExecError::Cancelled { .. })
    }
}
