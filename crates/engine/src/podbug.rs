// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operations exposed to the command line, each validated against the
//! cluster before anything is changed.

use crate::env::Timing;
use crate::interrupt::Control;
use crate::patch::{PatchReport, PatchRequest, Patcher};
use crate::session::{Cleaner, DebugSession, Deps, SessionConfig};
use crate::{source, validate, Error};
use podbug_adapters::{ClusterAdapter, EditorLauncher, ImageAdapter, Toolchain};
use podbug_core::{is_patched, Clock, ListenAddr, WorkloadRef};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Deployment, pod and container an operation acts on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub deployment: String,
    /// Defaults to the most recently started running pod.
    pub pod: Option<String>,
    /// Defaults to the deployment name.
    pub container: Option<String>,
}

/// Inputs of a debug session.
#[derive(Debug, Clone)]
pub struct DelveRequest {
    pub target: Target,
    /// Source file or package directory to build.
    pub source: PathBuf,
    pub args: Vec<String>,
    pub listen: ListenAddr,
    pub continue_on_start: bool,
    pub launch_editor: bool,
}

struct Resolved {
    workload: WorkloadRef,
    pod: String,
    container: String,
}

/// Patch, rollback and debug operations against one namespace.
pub struct Podbug<K, I, T, E, C: Clock> {
    deps: Deps<K, I, T, E>,
    clock: C,
    timing: Timing,
    repository: Option<String>,
}

impl<K, I, T, E, C> Podbug<K, I, T, E, C>
where
    K: ClusterAdapter,
    I: ImageAdapter,
    T: Toolchain,
    E: EditorLauncher,
    C: Clock,
{
    pub fn new(deps: Deps<K, I, T, E>, clock: C, timing: Timing) -> Self {
        Self { deps, clock, timing, repository: None }
    }

    /// Registry prefix for patch images.
    pub fn with_repository(mut self, repository: Option<String>) -> Self {
        self.repository = repository;
        self
    }

    fn patcher(&self) -> Patcher<K, I> {
        Patcher::new(self.deps.cluster.clone(), self.deps.images.clone(), self.timing.clone())
            .with_repository(self.repository.clone())
    }

    pub async fn patch(&self, deployment: &str, request: &PatchRequest) -> Result<PatchReport, Error> {
        validate::namespace(&self.deps.cluster).await?;
        self.patcher().patch(deployment, request).await
    }

    pub async fn rollback(&self, deployment: &str) -> Result<u32, Error> {
        validate::namespace(&self.deps.cluster).await?;
        self.patcher().rollback(deployment).await
    }

    /// Interactive shell in the patched container.
    pub async fn shell(&self, target: &Target) -> Result<(), Error> {
        let resolved = self.resolve(target, true).await?;
        tracing::info!(pod = %resolved.pod, container = %resolved.container, "opening shell");
        self.deps.cluster.shell(&resolved.pod, &resolved.container, self.timing.rollout_timeout).await?;
        Ok(())
    }

    /// Run a debug session until `controls` says exit or the debugger dies.
    pub async fn delve(&self, request: DelveRequest, controls: mpsc::UnboundedReceiver<Control>) -> Result<(), Error> {
        let resolved = self.resolve(&request.target, true).await?;
        let source = source::resolve(&request.source)?;
        let listen = request.listen.resolve_free_port()?;
        tracing::info!(workload = %resolved.workload, pod = %resolved.pod, %listen, "starting debug session");

        let config = SessionConfig {
            workload: resolved.workload,
            pod: resolved.pod,
            container: resolved.container,
            source,
            args: request.args,
            listen,
            continue_on_start: request.continue_on_start,
            launch_editor: request.launch_editor,
        };
        let session = DebugSession::new(self.deps.clone(), self.clock.clone(), self.timing.clone(), config)?;
        session.run(controls).await
    }

    /// Remove debugger leftovers from a pod; a no-op when nothing runs.
    pub async fn cleanup(&self, target: &Target) -> Result<(), Error> {
        let resolved = self.resolve(target, false).await?;
        let cleaner = Cleaner::new(
            self.deps.cluster.clone(),
            &resolved.workload,
            &resolved.pod,
            &resolved.container,
            self.timing.clone(),
        );
        cleaner.run("cleanup requested").await?;
        Ok(())
    }

    async fn resolve(&self, target: &Target, require_patched: bool) -> Result<Resolved, Error> {
        let cluster = &self.deps.cluster;
        validate::namespace(cluster).await?;
        let deployment = validate::deployment(cluster, &target.deployment).await?;
        if require_patched && !is_patched(&deployment) {
            return Err(Error::NotPatched { deployment: target.deployment.clone() });
        }
        let container = validate::container(&deployment, target.container.as_deref())?;
        let pod = validate::pod(cluster, &deployment, target.pod.as_deref()).await?;
        Ok(Resolved { workload: WorkloadRef::new(cluster.namespace(), &target.deployment), pod, container })
    }
}

#[cfg(test)]
#[path = "podbug_tests.rs"]
mod tests;
