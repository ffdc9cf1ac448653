// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validation errors for operator input and cluster-reported names

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("bad format for mount {mount:?}, should be \":\" separated")]
    MountFormat { mount: String },

    #[error("bad format for mount {mount:?}, host path bad: {reason}")]
    MountHostPath { mount: String, reason: String },

    #[error("bad format for mount {mount:?}, mount path should be absolute")]
    MountPathNotAbsolute { mount: String },

    #[error("path {path:?} is invalid: {reason}")]
    Path { path: String, reason: String },

    #[error("invalid image value {0:?}")]
    Image(String),

    #[error("invalid platform {0:?}, expected os/arch")]
    Platform(String),

    #[error("invalid listen address {0:?}, expected host:port")]
    Listen(String),

    #[error("{kind} {name:?} not found{}, available: {}", in_scope(.scope), list(.available))]
    ResourceNotFound { kind: &'static str, name: String, scope: Option<String>, available: Vec<String> },
}

fn in_scope(scope: &Option<String>) -> String {
    scope.as_ref().map(|s| format!(" in {s}")).unwrap_or_default()
}

fn list(available: &[String]) -> String {
    if available.is_empty() {
        "none".to_string()
    } else {
        available.join(", ")
    }
}

/// Check `name` against the set the cluster reported.
pub fn validate_resource(
    kind: &'static str,
    name: &str,
    scope: Option<&str>,
    available: &[String],
) -> Result<(), ValidationError> {
    if available.iter().any(|a| a == name) {
        return Ok(());
    }
    Err(ValidationError::ResourceNotFound {
        kind,
        name: name.to_string(),
        scope: scope.map(str::to_string),
        available: available.to_vec(),
    })
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;
