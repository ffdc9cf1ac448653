// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP server speaking enough of the Delve JSON-RPC protocol for tests.

use super::client::DebuggerState;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct FakeDelveState {
    state: DebuggerState,
    stale: bool,
    methods: Vec<String>,
}

/// Fake headless Delve server.
///
/// Answers `SetApiVersion`, `State` and `ProcessPid`. In stale mode it
/// accepts connections and never replies. Stops when dropped.
pub struct FakeDelveServer {
    addr: SocketAddr,
    inner: Arc<Mutex<FakeDelveState>>,
    shutdown: CancellationToken,
}

impl FakeDelveServer {
    /// Bind `addr` (use port 0 for a free port) and start serving.
    pub async fn bind(addr: &str) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let inner = Arc::new(Mutex::new(FakeDelveState {
            state: DebuggerState { pid: 42, running: true, ..DebuggerState::default() },
            ..FakeDelveState::default()
        }));
        let shutdown = CancellationToken::new();

        let state = Arc::clone(&inner);
        let token = shutdown.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { break };
                        tokio::spawn(serve(stream, Arc::clone(&state), token.clone()));
                    }
                }
            }
        });

        Ok(Self { addr, inner, shutdown })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn set_state(&self, state: DebuggerState) {
        self.inner.lock().state = state;
    }

    /// Accept connections without ever answering.
    pub fn set_stale(&self, stale: bool) {
        self.inner.lock().stale = stale;
    }

    /// RPC methods received so far.
    pub fn methods(&self) -> Vec<String> {
        self.inner.lock().methods.clone()
    }
}

impl Drop for FakeDelveServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn serve(stream: TcpStream, state: Arc<Mutex<FakeDelveState>>, shutdown: CancellationToken) {
    if state.lock().stale {
        shutdown.cancelled().await;
        return;
    }
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => return,
            line = lines.next_line() => line,
        };
        let Ok(Some(line)) = line else { return };
        let Ok(request) = serde_json::from_str::<Value>(&line) else { return };
        let method = request["method"].as_str().unwrap_or_default().to_string();
        let id = request["id"].clone();

        let (result, error) = {
            let mut state = state.lock();
            state.methods.push(method.clone());
            match method.as_str() {
                "RPCServer.SetApiVersion" => (json!({}), Value::Null),
                "RPCServer.State" => (json!({ "State": state.state }), Value::Null),
                "RPCServer.ProcessPid" => (json!({ "Pid": state.state.pid }), Value::Null),
                other => (Value::Null, json!(format!("rpc: can't find method {other}"))),
            }
        };
        let mut reply = json!({ "id": id, "result": result, "error": error }).to_string();
        reply.push('\n');
        if write.write_all(reply.as_bytes()).await.is_err() {
            return;
        }
    }
}
