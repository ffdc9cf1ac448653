// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `kubectl` invocations, one builder method per cluster operation.

use crate::cmd::Cmd;
use std::time::Duration;

/// Namespaced `kubectl` command factory.
#[derive(Debug, Clone)]
pub struct KubectlCmd {
    program: String,
    namespace: String,
}

impl KubectlCmd {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self { program: "kubectl".to_string(), namespace: namespace.into() }
    }

    /// Use a different binary (tests point this at a stub script).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn base(&self) -> Cmd {
        Cmd::new(&self.program).args(["-n", self.namespace.as_str()])
    }

    pub fn rollout_status(&self, deployment: &str, timeout: Duration) -> Cmd {
        self.base().args([
            "rollout".to_string(),
            "status".to_string(),
            format!("deployment/{deployment}"),
            "-w".to_string(),
            "--timeout".to_string(),
            format!("{}ms", timeout.as_millis()),
        ])
    }

    pub fn rollout_history(&self, deployment: &str) -> Cmd {
        self.base().args(["rollout".to_string(), "history".to_string(), format!("deployment/{deployment}")])
    }

    pub fn rollout_undo(&self, deployment: &str, revision: u32) -> Cmd {
        self.base().args([
            "rollout".to_string(),
            "undo".to_string(),
            format!("deployment/{deployment}"),
            "--to-revision".to_string(),
            revision.to_string(),
        ])
    }

    pub fn annotate_change_cause(&self, deployment: &str, cause: &str) -> Cmd {
        self.base().args([
            "annotate".to_string(),
            "--overwrite".to_string(),
            format!("deployment/{deployment}"),
            format!("{}={cause}", podbug_core::marker::CHANGE_CAUSE_ANNOTATION),
        ])
    }

    pub fn wait_for_pod(&self, pod: &str, condition: &str, timeout: Duration) -> Cmd {
        self.base().args([
            "wait".to_string(),
            format!("pod/{pod}"),
            format!("--for={condition}"),
            format!("--timeout={}ms", timeout.as_millis()),
        ])
    }

    pub fn exec(&self, pod: &str, container: &str, command: &[String]) -> Cmd {
        self.base().args(["exec", pod, "-c", container, "--"]).args(command.iter().cloned())
    }

    /// Interactive shell rooted at `dir`.
    pub fn exec_shell(&self, pod: &str, container: &str, dir: &str) -> Cmd {
        self.base()
            .args([
                "exec".to_string(),
                "-it".to_string(),
                format!("pod/{pod}"),
                "-c".to_string(),
                container.to_string(),
                "--".to_string(),
                "/bin/sh".to_string(),
                "-c".to_string(),
                format!("cd {dir} && /bin/sh"),
            ])
            .interactive()
    }

    pub fn copy_to_pod(&self, pod: &str, container: &str, source: &str, destination: &str) -> Cmd {
        self.base().args([
            "cp".to_string(),
            source.to_string(),
            format!("{pod}:{destination}"),
            "-c".to_string(),
            container.to_string(),
        ])
    }

    pub fn port_forward(&self, pod: &str, address: &str, port: u16) -> Cmd {
        self.base().args([
            "port-forward".to_string(),
            format!("--address={address}"),
            format!("pods/{pod}"),
            format!("{port}:{port}"),
        ])
    }
}

#[cfg(test)]
#[path = "kubectl_tests.rs"]
mod tests;
