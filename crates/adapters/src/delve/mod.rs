// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delve: headless server handle and JSON-RPC state client.
//!
//! # Module layout
//!
//! - `server` — builds the `dlv exec` invocation and runs it in a container
//! - `client` — line-delimited JSON-RPC over TCP with a bounded handshake
//! - `fake` — TCP server answering state queries (`test-support`)

mod client;
mod server;

pub use client::{DebuggerState, DelveClient, Health, API_VERSION};
pub use server::{DelveCommand, DelveServer};

use crate::cluster::ClusterError;
use podbug_exec::ExecError;
use std::time::Duration;
use thiserror::Error;

/// Errors from Delve operations
#[derive(Debug, Error)]
pub enum DelveError {
    #[error("connect to debugger at {addr}: {source}")]
    Connect { addr: String, source: std::io::Error },

    #[error("debugger at {addr} accepted the connection but no handshake after {}ms", .timeout.as_millis())]
    StaleConnection { addr: String, timeout: Duration },

    #[error("debugger connection closed")]
    Closed,

    #[error("rpc {method} failed: {message}")]
    Rpc { method: String, message: String },

    #[error("rpc {method}: response id {got}, expected {expected}")]
    UnexpectedId { method: String, expected: u64, got: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid rpc payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

#[cfg(any(test, feature = "test-support"))]
mod fake;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeDelveServer;

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;

#[cfg(test)]
#[path = "server_tests.rs"]
mod server_tests;
