// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error taxonomy

use podbug_adapters::{ClusterError, DelveError, ImageError, ToolchainError};
use podbug_core::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by patch, rollback and debug operations
#[derive(Debug, Error)]
pub enum Error {
    #[error("deployment {deployment} is not patched, run `podbug patch` first")]
    NotPatched { deployment: String },

    /// Operator input or a named resource was rejected. Resource lookups
    /// carry the cluster-reported alternatives.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("no running pod matches selector {selector:?}")]
    NoRunningPod { selector: String },

    #[error("no go.mod found above {}", .path.display())]
    NoModuleRoot { path: PathBuf },

    #[error("debugger at {addr} did not complete the handshake after {attempts} attempts")]
    StaleConnection { addr: String, attempts: u32 },

    #[error("debug build failed: {0}")]
    BuildFailed(#[source] ToolchainError),

    #[error("deploying binary to {pod} failed: {source}")]
    DeployFailed { pod: String, source: ClusterError },

    #[error("{} still running in {pod}/{container} after {attempts} kill attempts", .names.join(", "))]
    KillTimeout { pod: String, container: String, names: Vec<String>, attempts: u32 },

    #[error("no unpatched revision of {deployment} found walking back from revision {latest}")]
    RollbackExhausted { deployment: String, latest: u32 },

    #[error("debugger is down: {reason}")]
    DebuggerDown { reason: String },

    #[error("interrupt listener failed: {0}")]
    Interrupt(String),

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Delve(#[from] DelveError),

    #[error("snapshot json: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a named resource was missing from the cluster.
    pub fn is_resource_not_found(&self) -> bool {
        matches!(self, Error::Invalid(ValidationError::ResourceNotFound { .. }))
    }
}
