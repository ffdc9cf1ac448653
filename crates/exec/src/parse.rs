// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parsers for CLI output.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("no revisions in rollout history output {0:?}")]
    NoRevision(String),

    #[error("invalid pid {0:?}")]
    Pid(String),
}

/// Highest revision number in `kubectl rollout history` output.
///
/// ```text
/// deployment.apps/web
/// REVISION  CHANGE-CAUSE
/// 1         <none>
/// 2         podbug patch
/// ```
pub fn parse_latest_revision(output: &str) -> Result<u32, ParseError> {
    output
        .lines()
        .filter_map(|l| l.split_whitespace().next())
        .filter_map(|word| word.parse::<u32>().ok())
        .max()
        .ok_or_else(|| ParseError::NoRevision(output.to_string()))
}

/// Pids printed by `pidof`, space or newline separated.
pub fn parse_pids(output: &str) -> Result<Vec<u32>, ParseError> {
    output
        .split_whitespace()
        .map(|p| p.parse::<u32>().map_err(|_| ParseError::Pid(p.to_string())))
        .collect()
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
