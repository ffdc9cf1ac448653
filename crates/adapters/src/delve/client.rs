// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::DelveError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// RPC API version negotiated on connect.
pub const API_VERSION: u32 = 2;

/// Execution state reported by `RPCServer.State`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebuggerState {
    #[serde(rename = "Pid", default)]
    pub pid: u32,
    #[serde(rename = "Running", default)]
    pub running: bool,
    #[serde(rename = "exited", default)]
    pub exited: bool,
    #[serde(rename = "exitStatus", default)]
    pub exit_status: i32,
}

/// Coarse classification of a [`DebuggerState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Running,
    /// Stopped at a breakpoint, or a zombie.
    Halted,
    Exited,
}

podbug_core::simple_display! {
    Health {
        Running => "running",
        Halted => "halted",
        Exited => "exited",
    }
}

impl DebuggerState {
    pub fn health(&self) -> Health {
        if self.exited {
            Health::Exited
        } else if self.running {
            Health::Running
        } else {
            Health::Halted
        }
    }
}

#[derive(Serialize)]
struct Request<'a> {
    method: &'a str,
    params: [Value; 1],
    id: u64,
}

#[derive(Deserialize)]
struct Response {
    id: u64,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct StateOut {
    #[serde(rename = "State")]
    state: DebuggerState,
}

#[derive(Deserialize)]
struct PidOut {
    #[serde(rename = "Pid")]
    pid: u32,
}

/// JSON-RPC client for a headless Delve server.
#[derive(Debug)]
pub struct DelveClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    next_id: u64,
}

impl DelveClient {
    /// Connect and negotiate the API version.
    ///
    /// A tunnelled connection can be accepted locally while nothing answers
    /// behind it, so the handshake runs on its own task under `handshake_timeout`.
    /// On timeout the task is aborted, which drops and closes the socket.
    pub async fn connect(addr: &str, handshake_timeout: Duration) -> Result<Self, DelveError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| DelveError::Connect { addr: addr.to_string(), source })?;

        let mut handshake = tokio::spawn(async move {
            let mut client = Self::over(stream);
            client.call("RPCServer.SetApiVersion", json!({ "APIVersion": API_VERSION })).await?;
            Ok::<_, DelveError>(client)
        });

        match tokio::time::timeout(handshake_timeout, &mut handshake).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(DelveError::Closed),
            Err(_) => {
                handshake.abort();
                tracing::warn!(%addr, "debugger handshake timed out");
                Err(DelveError::StaleConnection { addr: addr.to_string(), timeout: handshake_timeout })
            }
        }
    }

    fn over(stream: TcpStream) -> Self {
        let (read, writer) = stream.into_split();
        Self { reader: BufReader::new(read), writer, next_id: 0 }
    }

    /// Current state without blocking on a running target.
    pub async fn state(&mut self) -> Result<DebuggerState, DelveError> {
        let out: StateOut = self.call_as("RPCServer.State", json!({ "NonBlocking": true })).await?;
        Ok(out.state)
    }

    /// Pid of the debugged process.
    pub async fn process_pid(&mut self) -> Result<u32, DelveError> {
        let out: PidOut = self.call_as("RPCServer.ProcessPid", json!({})).await?;
        Ok(out.pid)
    }

    async fn call_as<T: serde::de::DeserializeOwned>(&mut self, method: &str, params: Value) -> Result<T, DelveError> {
        let result = self.call(method, params).await?;
        Ok(serde_json::from_value(result)?)
    }

    async fn call(&mut self, method: &str, params: Value) -> Result<Value, DelveError> {
        let id = self.next_id;
        self.next_id += 1;

        let mut line = serde_json::to_vec(&Request { method, params: [params], id })?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;

        let mut buf = String::new();
        if self.reader.read_line(&mut buf).await? == 0 {
            return Err(DelveError::Closed);
        }
        let response: Response = serde_json::from_str(&buf)?;
        if response.id != id {
            return Err(DelveError::UnexpectedId { method: method.to_string(), expected: id, got: response.id });
        }
        if let Some(message) = response.error {
            return Err(DelveError::Rpc { method: method.to_string(), message });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }
}
