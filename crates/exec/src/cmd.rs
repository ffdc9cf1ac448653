// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builder-style external command invocation.
//!
//! A [`Cmd`] accumulates program, arguments, environment, working directory,
//! output sinks and lifecycle hooks, then runs either blocking ([`Cmd::run`])
//! or in the background ([`Cmd::spawn`]).
//!
//! All output is collected into one in-memory buffer returned to the caller.
//! Each stdout line is also logged at TRACE and each stderr line at WARN,
//! both with a `cmd` field, and forwarded to any registered line sinks.

use crate::error::ExecError;
use crate::process::{ProcessHandle, Running, Status};
use parking_lot::Mutex;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Receives each output line of a command.
pub type LineSink = mpsc::UnboundedSender<String>;

type PreStartHook = Box<dyn FnOnce() -> Result<(), String> + Send>;
type PostStartHook = Box<dyn FnOnce(&ProcessHandle) + Send>;
type PostEndHook = Box<dyn FnOnce(&Result<String, ExecError>) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Io {
    /// stdin closed, stdout/stderr piped and captured
    Captured,
    /// stdio inherited from this process (interactive shells)
    Inherit,
}

/// One external process launch.
pub struct Cmd {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    cwd: Option<PathBuf>,
    io: Io,
    stdout_sinks: Vec<LineSink>,
    stderr_sinks: Vec<LineSink>,
    pre_start: Vec<PreStartHook>,
    post_start: Vec<PostStartHook>,
    post_end: Vec<PostEndHook>,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
            io: Io::Captured,
            stdout_sinks: Vec::new(),
            stderr_sinks: Vec::new(),
            pre_start: Vec::new(),
            post_start: Vec::new(),
            post_end: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Close stdin and capture output (the default).
    pub fn stdin_null(mut self) -> Self {
        self.io = Io::Captured;
        self
    }

    /// Inherit the terminal; nothing is captured.
    pub fn interactive(mut self) -> Self {
        self.io = Io::Inherit;
        self
    }

    pub fn stdout_lines(mut self, sink: LineSink) -> Self {
        self.stdout_sinks.push(sink);
        self
    }

    pub fn stderr_lines(mut self, sink: LineSink) -> Self {
        self.stderr_sinks.push(sink);
        self
    }

    /// Runs before launch; an `Err` aborts the invocation.
    pub fn pre_start(mut self, hook: impl FnOnce() -> Result<(), String> + Send + 'static) -> Self {
        self.pre_start.push(Box::new(hook));
        self
    }

    /// Receives the live process handle right after launch.
    pub fn post_start(mut self, hook: impl FnOnce(&ProcessHandle) + Send + 'static) -> Self {
        self.post_start.push(Box::new(hook));
        self
    }

    /// Runs after exit. Only fires for [`Cmd::run`].
    pub fn post_end(mut self, hook: impl FnOnce(&Result<String, ExecError>) + Send + 'static) -> Self {
        self.post_end.push(Box::new(hook));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn environment(&self) -> &[(String, String)] {
        &self.env
    }

    /// Run to completion and return combined stdout/stderr.
    ///
    /// The process is killed if `cancel` fires first.
    pub async fn run(mut self, cancel: &CancellationToken) -> Result<String, ExecError> {
        let post_end = std::mem::take(&mut self.post_end);
        let (status, _rx) = watch::channel(Status::default());
        let result = self.execute(cancel.clone(), status).await;
        for hook in post_end {
            hook(&result);
        }
        result
    }

    /// Launch in the background.
    ///
    /// Returns immediately; use [`Running::wait_started`] before trusting the
    /// process is up. Post-end hooks are dropped.
    pub fn spawn(mut self) -> Running {
        self.post_end.clear();
        let command = self.to_string();
        let cancel = CancellationToken::new();
        let (status, rx) = watch::channel(Status::default());
        let token = cancel.clone();
        let task = tokio::spawn(async move { self.execute(token, status).await });
        Running::new(command, rx, task, cancel)
    }

    async fn execute(
        self,
        cancel: CancellationToken,
        status: watch::Sender<Status>,
    ) -> Result<String, ExecError> {
        let result = self.execute_inner(&cancel, &status).await;
        status.send_modify(|s| {
            if s.started.is_none() {
                s.spawn_error = result.as_ref().err().map(|e| e.to_string());
            }
            s.done = true;
        });
        result
    }

    async fn execute_inner(
        self,
        cancel: &CancellationToken,
        status: &watch::Sender<Status>,
    ) -> Result<String, ExecError> {
        let line = self.to_string();
        for hook in self.pre_start {
            hook().map_err(|message| ExecError::Hook { command: line.clone(), message })?;
        }

        tracing::debug!(cmd = %self.program, args = ?self.args, "launching");

        let mut process = tokio::process::Command::new(&self.program);
        process.args(&self.args);
        process.envs(self.env.iter().map(|(k, v)| (k, v)));
        if let Some(dir) = &self.cwd {
            process.current_dir(dir);
        }
        process.kill_on_drop(true);
        match self.io {
            Io::Captured => {
                process.stdin(Stdio::null());
                process.stdout(Stdio::piped());
                process.stderr(Stdio::piped());
            }
            Io::Inherit => {
                process.stdin(Stdio::inherit());
                process.stdout(Stdio::inherit());
                process.stderr(Stdio::inherit());
            }
        }

        let mut child = process
            .spawn()
            .map_err(|source| ExecError::SpawnFailed { command: line.clone(), source })?;

        let handle = ProcessHandle::new(child.id());
        for hook in self.post_start {
            hook(&handle);
        }
        status.send_modify(|s| s.started = Some(handle));

        let buffer = Arc::new(Mutex::new(String::new()));
        let mut pumps = Vec::new();
        if let Some(out) = child.stdout.take() {
            pumps.push(pump(out, Stream::Stdout, self.program.clone(), buffer.clone(), self.stdout_sinks));
        }
        if let Some(err) = child.stderr.take() {
            pumps.push(pump(err, Stream::Stderr, self.program.clone(), buffer.clone(), self.stderr_sinks));
        }

        let exit = tokio::select! {
            exit = child.wait() => exit,
            _ = cancel.cancelled() => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(cmd = %self.program, error = %e, "failed to kill cancelled command");
                }
                for p in pumps {
                    p.abort();
                }
                return Err(ExecError::Cancelled { command: line });
            }
        };
        let exit = exit.map_err(|source| ExecError::SpawnFailed { command: line.clone(), source })?;

        for p in pumps {
            let _ = p.await;
        }
        let output = std::mem::take(&mut *buffer.lock());

        tracing::debug!(cmd = %self.program, code = ?exit.code(), "exited");
        if exit.success() {
            Ok(output)
        } else {
            Err(ExecError::Failed { command: line, code: exit.code(), output })
        }
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cmd")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("env", &self.env)
            .field("cwd", &self.cwd)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn pump<R>(
    reader: R,
    stream: Stream,
    program: String,
    buffer: Arc<Mutex<String>>,
    sinks: Vec<LineSink>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut raw = Vec::new();
        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(cmd = %program, error = %e, "output pipe read failed");
                    break;
                }
            }
            // non-UTF-8 output is kept lossily so the pipe keeps draining
            let line = String::from_utf8_lossy(trim_newline(&raw)).into_owned();
            match stream {
                Stream::Stdout => tracing::trace!(cmd = %program, "{line}"),
                Stream::Stderr => tracing::warn!(cmd = %program, "{line}"),
            }
            {
                let mut buf = buffer.lock();
                buf.push_str(&line);
                buf.push('\n');
            }
            for sink in &sinks {
                // Receiver gone means the caller stopped listening.
                let _ = sink.send(line.clone());
            }
        }
    })
}

fn trim_newline(raw: &[u8]) -> &[u8] {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    raw.strip_suffix(b"\r").unwrap_or(raw)
}

#[cfg(test)]
#[path = "cmd_tests.rs"]
mod tests;
