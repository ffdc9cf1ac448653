// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::client::API_VERSION;
use super::DelveError;
use crate::cluster::ClusterAdapter;
use podbug_exec::Running;

/// `dlv exec` invocation for a headless, multi-client server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelveCommand {
    program: String,
    binary: String,
    port: u16,
    continue_on_start: bool,
    args: Vec<String>,
}

impl DelveCommand {
    pub fn new(binary: impl Into<String>, port: u16) -> Self {
        Self { program: "dlv".to_string(), binary: binary.into(), port, continue_on_start: false, args: Vec::new() }
    }

    podbug_core::setters! {
        into { program: String }
        set { continue_on_start: bool, args: Vec<String> }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Full argument vector, program first.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![
            self.program.clone(),
            "exec".to_string(),
            self.binary.clone(),
            format!("--api-version={API_VERSION}"),
            "--headless".to_string(),
            format!("--listen=:{}", self.port),
            "--accept-multiclient".to_string(),
        ];
        if self.continue_on_start {
            argv.push("--continue".to_string());
        }
        if !self.args.is_empty() {
            argv.push("--".to_string());
            argv.extend(self.args.iter().cloned());
        }
        argv
    }
}

/// A Delve server running inside a container.
pub struct DelveServer {
    pod: String,
    container: String,
    running: Running,
}

impl DelveServer {
    /// Launch `command` in the container and wait until the exec has started.
    pub async fn start<C: ClusterAdapter>(
        cluster: &C,
        pod: &str,
        container: &str,
        command: &DelveCommand,
    ) -> Result<Self, DelveError> {
        let argv = command.argv();
        tracing::info!(%pod, %container, port = command.port(), "starting delve");
        let mut running = cluster.exec_background(pod, container, &argv);
        running.wait_started().await?;
        Ok(Self { pod: pod.to_string(), container: container.to_string(), running })
    }

    /// Stop the local exec and collect its output.
    ///
    /// The remote process is killed separately by pid; a cancelled exec is
    /// the expected outcome here, not an error.
    pub async fn stop(self) -> Result<String, DelveError> {
        tracing::debug!(pod = %self.pod, container = %self.container, "stopping delve exec");
        self.running.terminate();
        match self.running.wait().await {
            Ok(out) => Ok(out),
            Err(e) if e.is_cancelled() => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }
}
