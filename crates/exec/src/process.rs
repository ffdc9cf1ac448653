// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handles to launched processes.

use crate::error::ExecError;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::future::Future;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// OS-level reference to a started process.
///
/// Processes faked in tests have no pid; signalling them is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    pid: Option<u32>,
}

impl ProcessHandle {
    pub fn new(pid: Option<u32>) -> Self {
        Self { pid }
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Send SIGTERM.
    pub fn terminate(&self) -> nix::Result<()> {
        self.signal(Signal::SIGTERM)
    }

    /// Send SIGKILL.
    pub fn kill(&self) -> nix::Result<()> {
        self.signal(Signal::SIGKILL)
    }

    fn signal(&self, signal: Signal) -> nix::Result<()> {
        let Some(pid) = self.pid else {
            return Ok(());
        };
        let raw = i32::try_from(pid).map_err(|_| nix::Error::EINVAL)?;
        match kill(Pid::from_raw(raw), signal) {
            // Already gone
            Err(nix::Error::ESRCH) => Ok(()),
            other => other,
        }
    }
}

/// Lifecycle published by a non-blocking invocation.
#[derive(Debug, Clone, Default)]
pub(crate) struct Status {
    pub(crate) started: Option<ProcessHandle>,
    pub(crate) spawn_error: Option<String>,
    pub(crate) done: bool,
}

/// A command running in the background.
///
/// Exposes a "started" signal ([`Running::wait_started`]) and a "done"
/// signal ([`Running::wait`]). Dropping it does not stop the process; call
/// [`Running::terminate`] for that.
#[derive(Debug)]
pub struct Running {
    command: String,
    status: watch::Receiver<Status>,
    task: JoinHandle<Result<String, ExecError>>,
    cancel: CancellationToken,
}

impl Running {
    pub(crate) fn new(
        command: String,
        status: watch::Receiver<Status>,
        task: JoinHandle<Result<String, ExecError>>,
        cancel: CancellationToken,
    ) -> Self {
        Self { command, status, task, cancel }
    }

    /// Wrap a future as a started background process without a pid.
    ///
    /// Used by in-memory adapters so callers see the same start/done protocol
    /// as for real processes. The future is dropped on [`Running::terminate`].
    pub fn from_future<F>(command: impl Into<String>, fut: F) -> Self
    where
        F: Future<Output = Result<String, ExecError>> + Send + 'static,
    {
        let command = command.into();
        let cancel = CancellationToken::new();
        let (tx, rx) = watch::channel(Status { started: Some(ProcessHandle::new(None)), ..Status::default() });
        let token = cancel.clone();
        let name = command.clone();
        let task = tokio::spawn(async move {
            let result = tokio::select! {
                result = fut => result,
                _ = token.cancelled() => Err(ExecError::Cancelled { command: name }),
            };
            tx.send_modify(|s| s.done = true);
            result
        });
        Self::new(command, rx, task, cancel)
    }

    /// Block until the process has been launched.
    ///
    /// Fails if the process could not be spawned or its task ended first.
    pub async fn wait_started(&mut self) -> Result<ProcessHandle, ExecError> {
        let status = self
            .status
            .wait_for(|s| s.started.is_some() || s.done)
            .await
            .map_err(|_| ExecError::Detached { command: self.command.clone() })?;
        if let Some(handle) = &status.started {
            return Ok(handle.clone());
        }
        Err(ExecError::NotStarted {
            command: self.command.clone(),
            reason: status.spawn_error.clone().unwrap_or_else(|| "exited before start".to_string()),
        })
    }

    /// Handle of the launched process, if it has started.
    pub fn process(&self) -> Option<ProcessHandle> {
        self.status.borrow().started.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Ask the driving task to kill the process.
    pub fn terminate(&self) {
        self.cancel.cancel();
    }

    /// Wait for the process to exit and return its combined output.
    pub async fn wait(self) -> Result<String, ExecError> {
        match self.task.await {
            Ok(result) => result,
            Err(_) => Err(ExecError::Detached { command: self.command }),
        }
    }
}
