// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Debug session orchestrator.
//!
//! Each load builds the binary while the previous instance is cleaned up,
//! moves it into the container, starts a headless Delve server, makes sure
//! the port-forward is up, health-checks the server through it and then
//! watches it in the background. Control messages reload or end the
//! session; every way out runs the cleanup.

use crate::env::Timing;
use crate::interrupt::Control;
use crate::source::SourceTarget;
use crate::{health, pids, Error};
use k8s_openapi::api::apps::v1::Deployment;
use podbug_adapters::{
    remote_path_for, AttachConfig, ClusterAdapter, DelveClient, DelveCommand, DelveServer, EditorLauncher, Health,
    ImageAdapter, Toolchain,
};
use podbug_core::workload::{container_names, find_container, image_of, SNAPSHOT_KEY};
use podbug_core::{validate_resource, Clock, ContainerArgs, ListenAddr, WorkloadRef};
use podbug_exec::Running;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Process name of the debugger inside the container.
pub const DLV: &str = "dlv";

/// Polls between "dlv is up" log lines.
const UP_LOG_EVERY: u64 = 20;

/// Adapters the engine drives.
#[derive(Clone)]
pub struct Deps<K, I, T, E> {
    pub cluster: K,
    pub images: I,
    pub toolchain: T,
    pub editor: E,
}

/// Resolved inputs of one debug session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub workload: WorkloadRef,
    pub pod: String,
    pub container: String,
    pub source: SourceTarget,
    /// Arguments for the debugged program. Empty means "as deployed".
    pub args: Vec<String>,
    pub listen: ListenAddr,
    pub continue_on_start: bool,
    pub launch_editor: bool,
}

/// Removes everything a session leaves in a container.
///
/// Clones share one lock: a cleanup that finds another in progress returns
/// immediately instead of running twice.
#[derive(Clone)]
pub struct Cleaner<K> {
    cluster: K,
    pod: String,
    container: String,
    binary: String,
    timing: Timing,
    guard: Arc<tokio::sync::Mutex<()>>,
}

impl<K: ClusterAdapter> Cleaner<K> {
    pub fn new(cluster: K, workload: &WorkloadRef, pod: &str, container: &str, timing: Timing) -> Self {
        Self {
            cluster,
            pod: pod.to_string(),
            container: container.to_string(),
            binary: workload.name.clone(),
            timing,
            guard: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Delete the exposing service and kill the binary and debugger.
    ///
    /// Returns `false` when another cleanup was already running.
    pub async fn run(&self, reason: &str) -> Result<bool, Error> {
        let Ok(_guard) = self.guard.try_lock() else {
            tracing::warn!(pod = %self.pod, %reason, "cleanup already in progress");
            return Ok(false);
        };
        tracing::info!(pod = %self.pod, container = %self.container, %reason, "cleaning up");

        match self.cluster.delete_service(&self.pod).await {
            Ok(true) => tracing::info!(service = %self.pod, "service deleted"),
            Ok(false) => {}
            Err(e) => tracing::warn!(service = %self.pod, error = %e, "could not delete service"),
        }

        pids::kill_until_gone(
            &self.cluster,
            &self.pod,
            &self.container,
            &[self.binary.as_str(), DLV],
            self.timing.kill_attempts,
            self.timing.kill_backoff,
        )
        .await?;
        Ok(true)
    }
}

/// Background poller of the debugger state.
struct Watch {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    down: oneshot::Receiver<String>,
}

impl Watch {
    fn spawn(mut client: DelveClient, interval: Duration) -> Self {
        let cancel = CancellationToken::new();
        let (tx, down) = oneshot::channel();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            let mut polls: u64 = 0;
            loop {
                let polled = tokio::select! {
                    _ = token.cancelled() => return,
                    polled = async {
                        tokio::time::sleep(interval).await;
                        client.state().await
                    } => polled,
                };
                let state = match polled {
                    Ok(state) => state,
                    Err(e) => {
                        tracing::error!(error = %e, "dlv seems to be down");
                        let _ = tx.send(format!("lost connection to dlv: {e}"));
                        return;
                    }
                };
                match state.health() {
                    Health::Exited => {
                        tracing::error!(status = state.exit_status, "debugged process exited");
                        let _ = tx.send(format!("debugged process exited with status {}", state.exit_status));
                        return;
                    }
                    Health::Halted if polls % UP_LOG_EVERY == 0 => {
                        tracing::info!(pid = state.pid, "dlv is up, process halted (breakpoint or zombie)")
                    }
                    Health::Running if polls % UP_LOG_EVERY == 0 => tracing::info!(pid = state.pid, "dlv is up"),
                    _ => {}
                }
                polls += 1;
            }
        });
        Self { cancel, task, down }
    }

    async fn stop(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

/// Resolves once the watched debugger goes down; never without a watch.
async fn watch_down(watch: &mut Option<Watch>) -> String {
    match watch {
        Some(w) => (&mut w.down).await.unwrap_or_else(|_| "watch stopped".to_string()),
        None => std::future::pending().await,
    }
}

enum Step {
    Loaded(Result<(), Error>),
    Control(Option<Control>),
}

enum Next {
    Control(Option<Control>),
    Down(String),
}

/// One debug session against a patched pod.
pub struct DebugSession<K, I, T, E, C> {
    deps: Deps<K, I, T, E>,
    clock: C,
    timing: Timing,
    config: SessionConfig,
    cleaner: Cleaner<K>,
    build_dir: tempfile::TempDir,
    server: Option<DelveServer>,
    forward: Option<Running>,
    watch: Option<Watch>,
}

impl<K, I, T, E, C> DebugSession<K, I, T, E, C>
where
    K: ClusterAdapter,
    I: ImageAdapter,
    T: Toolchain,
    E: EditorLauncher,
    C: Clock,
{
    pub fn new(deps: Deps<K, I, T, E>, clock: C, timing: Timing, config: SessionConfig) -> Result<Self, Error> {
        let cleaner =
            Cleaner::new(deps.cluster.clone(), &config.workload, &config.pod, &config.container, timing.clone());
        Ok(Self {
            deps,
            clock,
            timing,
            config,
            cleaner,
            build_dir: tempfile::tempdir()?,
            server: None,
            forward: None,
            watch: None,
        })
    }

    /// Shares the session's cleanup lock.
    pub fn cleaner(&self) -> Cleaner<K> {
        self.cleaner.clone()
    }

    pub async fn cleanup(&self, reason: &str) -> Result<bool, Error> {
        self.cleaner.run(reason).await
    }

    /// Load the debugger and keep it running until told to stop.
    ///
    /// A control message arriving mid-load abandons that load. The session
    /// ends with `Ok` on exit (or when `controls` closes) and with the cause
    /// when a load fails or the debugger goes down.
    pub async fn run(mut self, mut controls: mpsc::UnboundedReceiver<Control>) -> Result<(), Error> {
        if self.config.args.is_empty() {
            self.config.args = self.snapshot_args().await?;
        }

        let mut reason = "initial load".to_string();
        loop {
            let step = tokio::select! {
                loaded = self.load(&reason) => Step::Loaded(loaded),
                control = controls.recv() => Step::Control(control),
            };

            let next = match step {
                Step::Loaded(Ok(())) => tokio::select! {
                    control = controls.recv() => Next::Control(control),
                    reason = watch_down(&mut self.watch) => Next::Down(reason),
                },
                Step::Loaded(Err(e)) => {
                    tracing::error!(pod = %self.config.pod, error = %e, "debug session failed");
                    self.shutdown_logged("load failed").await;
                    return Err(e);
                }
                Step::Control(control) => Next::Control(control),
            };

            match next {
                Next::Control(Some(Control::Reload(r))) => reason = r,
                Next::Control(Some(Control::Exit) | None) => return self.shutdown("termination").await,
                Next::Control(Some(Control::Error(e))) => {
                    self.shutdown_logged("interrupt listener failed").await;
                    return Err(Error::Interrupt(e));
                }
                Next::Down(reason) => {
                    self.shutdown_logged(&reason).await;
                    return Err(Error::DebuggerDown { reason });
                }
            }
        }
    }

    async fn load(&mut self, reason: &str) -> Result<(), Error> {
        tracing::info!(pod = %self.config.pod, %reason, "loading debug binary");
        if let Some(watch) = self.watch.take() {
            watch.stop().await;
        }
        let previous = self.server.take();

        let output = self.build_dir.path().join(&self.config.workload.name);
        let (cleaned, built) = tokio::join!(self.cleaner.run(reason), self.build(&output));
        if let Some(server) = previous {
            if let Err(e) = server.stop().await {
                tracing::warn!(error = %e, "previous delve exec ended badly");
            }
        }
        cleaned?;
        built?;

        self.deploy(&output).await?;
        self.start_server().await?;
        self.expose().await?;

        let addr = self.config.listen.to_string();
        // without --continue dlv holds the target at its entry point
        let halted_ok = !self.config.continue_on_start;
        let client = health::connect_healthy(&addr, &self.timing, halted_ok).await?;
        self.watch = Some(Watch::spawn(client, self.timing.watch_interval));
        tracing::info!(pod = %self.config.pod, %addr, "debugger ready");

        if self.config.launch_editor {
            self.launch_editor();
        }
        Ok(())
    }

    async fn build(&self, output: &Path) -> Result<(), Error> {
        let deployment = self.deps.cluster.get_deployment(&self.config.workload.name).await?;
        let image = image_of(&deployment, &self.config.container).unwrap_or_default();
        let platform = self.deps.images.platform(&image).await?;
        let source = &self.config.source;
        tracing::info!(package = %source.package, %platform, "building debug binary");
        self.deps
            .toolchain
            .build(&source.module_root, &source.package, output, &platform)
            .await
            .map_err(Error::BuildFailed)
    }

    async fn deploy(&self, binary: &Path) -> Result<(), Error> {
        let (pod, container) = (&self.config.pod, &self.config.container);
        let staging = self.config.workload.staging_binary_path();
        let target = self.config.workload.binary_path();
        let failed = |source| Error::DeployFailed { pod: pod.clone(), source };

        tracing::info!(%pod, %container, %target, "copying binary");
        self.deps.cluster.copy_to_pod(pod, container, binary, &staging).await.map_err(failed)?;
        let mv = vec!["mv".to_string(), staging, target];
        self.deps.cluster.exec(pod, container, &mv).await.map_err(failed)?;
        Ok(())
    }

    async fn start_server(&mut self) -> Result<(), Error> {
        let command = DelveCommand::new(self.config.workload.binary_path(), self.config.listen.port)
            .continue_on_start(self.config.continue_on_start)
            .args(self.config.args.clone());
        let server = DelveServer::start(&self.deps.cluster, &self.config.pod, &self.config.container, &command).await?;
        self.server = Some(server);
        Ok(())
    }

    /// Start the port-forward unless the previous one is still alive.
    async fn expose(&mut self) -> Result<(), Error> {
        if self.forward.as_ref().is_some_and(|f| !f.is_finished()) {
            return Ok(());
        }
        let forward = self
            .deps
            .cluster
            .port_forward(&self.config.pod, &self.config.listen, self.timing.port_forward_ready)
            .await?;
        self.forward = Some(forward);
        Ok(())
    }

    /// Program arguments of the container as recorded before patching.
    async fn snapshot_args(&self) -> Result<Vec<String>, Error> {
        let snapshot = self.config.workload.snapshot_name();
        let json = self.deps.cluster.config_map_key(&snapshot, SNAPSHOT_KEY).await?;
        let deployment: Deployment = serde_json::from_str(&json)?;
        let Some(container) = find_container(&deployment, &self.config.container) else {
            let scope = format!("config snapshot {snapshot:?}");
            validate_resource("container", &self.config.container, Some(&scope), &container_names(&deployment))?;
            return Ok(Vec::new());
        };
        let args = ContainerArgs::of(container).program_args();
        tracing::debug!(?args, "arguments recovered from snapshot");
        Ok(args)
    }

    fn launch_editor(&self) {
        let root = self.config.source.module_root.clone();
        let attach = AttachConfig::new(
            format!("{}-{}", self.config.workload.name, self.clock.unix_secs()),
            remote_path_for(&root),
            self.config.listen.host.clone(),
            self.config.listen.port,
        );
        let editor = self.deps.editor.clone();
        tokio::spawn(async move {
            if let Err(e) = editor.launch(&root, &attach).await {
                tracing::warn!(error = %e, "could not launch editor");
            }
        });
    }

    async fn shutdown(&mut self, reason: &str) -> Result<(), Error> {
        if let Some(watch) = self.watch.take() {
            watch.stop().await;
        }
        let cleaned = self.cleaner.run(reason).await;
        if let Some(server) = self.server.take() {
            if let Err(e) = server.stop().await {
                tracing::warn!(error = %e, "delve exec ended badly");
            }
        }
        if let Some(forward) = self.forward.take() {
            forward.terminate();
        }
        cleaned.map(|_| ())
    }

    async fn shutdown_logged(&mut self, reason: &str) {
        if let Err(e) = self.shutdown(reason).await {
            tracing::warn!(error = %e, "cleanup failed");
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
