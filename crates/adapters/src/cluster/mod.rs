// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster adapter: everything podbug asks of Kubernetes.
//!
//! # Module layout
//!
//! - `k8s` — real implementation; reads and config objects go through the
//!   API client, rollout history, exec, copy and port-forward through `kubectl`
//! - `fake` — in-memory cluster with revision history (`test-support`)
//!
//! An adapter is bound to one namespace. Deployments are never cached: every
//! call that returns one fetches it fresh.

mod k8s;

pub use k8s::KubeCluster;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use podbug_core::ListenAddr;
use podbug_exec::{ExecError, ParseError, Running};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Condition `shell` waits for before attaching.
pub const CONTAINERS_READY: &str = "condition=ContainersReady";

/// Line `kubectl port-forward` prints once it is listening.
pub const FORWARDING_READY: &str = "Forwarding from";

/// What `kubectl rollout undo` prints for a revision missing from history.
pub const MISSING_REVISION: &str = "unable to find specified revision";

/// Errors from cluster operations
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("kubernetes api: {0}")]
    Api(#[from] kube::Error),

    #[error("{kind} {name:?} not found")]
    NotFound { kind: &'static str, name: String },

    #[error("unexpected kubectl output: {0}")]
    Parse(#[from] ParseError),

    #[error("invalid object json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("port-forward to {pod} not listening after {}ms", .timeout.as_millis())]
    PortForwardTimeout { pod: String, timeout: Duration },

    #[error("port-forward to {pod} exited before listening: {reason}")]
    PortForwardExited { pod: String, reason: String },
}

impl ClusterError {
    /// Whether an in-container command exited with `code`.
    pub fn is_exit_code(&self, code: i32) -> bool {
        matches!(self, ClusterError::Exec(e) if e.exit_code() == Some(code))
    }

    /// Whether `rollout undo` failed because the revision was pruned.
    pub fn is_missing_revision(&self) -> bool {
        matches!(self, ClusterError::Exec(e) if e.exit_code() == Some(1) && e.output().contains(MISSING_REVISION))
    }
}

/// Adapter for the Kubernetes cluster, bound to one namespace.
#[async_trait]
pub trait ClusterAdapter: Clone + Send + Sync + 'static {
    fn namespace(&self) -> &str;

    /// All namespace names in the cluster.
    async fn namespaces(&self) -> Result<Vec<String>, ClusterError>;

    /// Deployment names in the bound namespace.
    async fn deployments(&self) -> Result<Vec<String>, ClusterError>;

    /// Fetch a deployment. Always goes to the cluster.
    async fn get_deployment(&self, name: &str) -> Result<Deployment, ClusterError>;

    /// Pod names matching a `k=v,...` label selector.
    async fn pods(&self, selector: &str) -> Result<Vec<String>, ClusterError>;

    /// The running pod matching `selector` that started last.
    async fn most_recent_running_pod(&self, selector: &str) -> Result<Option<String>, ClusterError>;

    /// Block until the deployment's rollout completes.
    async fn wait_for_rollout(&self, deployment: &str, timeout: Duration) -> Result<(), ClusterError>;

    async fn wait_for_pod(&self, pod: &str, condition: &str, timeout: Duration) -> Result<(), ClusterError>;

    /// Apply a strategic merge patch to a deployment.
    async fn patch_deployment(&self, deployment: &str, patch: &serde_json::Value) -> Result<(), ClusterError>;

    /// Highest revision in the deployment's rollout history.
    async fn latest_revision(&self, deployment: &str) -> Result<u32, ClusterError>;

    async fn rollout_undo(&self, deployment: &str, revision: u32) -> Result<(), ClusterError>;

    async fn annotate_change_cause(&self, deployment: &str, cause: &str) -> Result<(), ClusterError>;

    async fn create_config_map(&self, name: &str, data: BTreeMap<String, String>) -> Result<(), ClusterError>;

    /// Returns `false` when there was nothing to delete.
    async fn delete_config_map(&self, name: &str) -> Result<bool, ClusterError>;

    async fn config_map_key(&self, name: &str, key: &str) -> Result<String, ClusterError>;

    /// Run a command in a container and return its output.
    async fn exec(&self, pod: &str, container: &str, command: &[String]) -> Result<String, ClusterError>;

    /// Run a command in a container in the background.
    fn exec_background(&self, pod: &str, container: &str, command: &[String]) -> Running;

    async fn copy_to_pod(
        &self,
        pod: &str,
        container: &str,
        source: &Path,
        destination: &str,
    ) -> Result<(), ClusterError>;

    /// Forward `addr` to the same port on `pod`.
    ///
    /// Returns only once the forward is listening.
    async fn port_forward(&self, pod: &str, addr: &ListenAddr, ready_timeout: Duration) -> Result<Running, ClusterError>;

    /// Returns `false` when there was nothing to delete.
    async fn delete_service(&self, name: &str) -> Result<bool, ClusterError>;

    /// Attach an interactive shell to a ready container.
    async fn shell(&self, pod: &str, container: &str, ready_timeout: Duration) -> Result<(), ClusterError>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{ClusterCall, FakeCluster};
