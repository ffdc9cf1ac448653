// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health of a remote Delve server, seen through the local forward.

use crate::env::Timing;
use crate::retry::retry;
use crate::Error;
use podbug_adapters::{DebuggerState, DelveClient, DelveError, Health};

/// A running target is healthy. A halted one is too when `halted_ok`,
/// which is how dlv leaves a target started without `--continue`.
pub fn validate_state(state: &DebuggerState, halted_ok: bool) -> Result<(), Error> {
    match state.health() {
        Health::Running => Ok(()),
        Health::Halted if halted_ok => Ok(()),
        Health::Exited => Err(Error::DebuggerDown {
            reason: format!("debugged process has exited with status {}", state.exit_status),
        }),
        // a breakpoint on a zombie is not handled gracefully by dlv
        Health::Halted => Err(Error::DebuggerDown {
            reason: "debugged process is not running (zombie or breakpoint)".to_string(),
        }),
    }
}

/// Connect to `addr` and wait for a healthy target.
///
/// Retries with fixed backoff. A handshake that keeps timing out is reported
/// as [`Error::StaleConnection`].
pub async fn connect_healthy(addr: &str, timing: &Timing, halted_ok: bool) -> Result<DelveClient, Error> {
    let attempts = timing.health_attempts;
    let handshake = timing.rpc_handshake;
    let result = retry("delve health check", attempts, timing.health_backoff, |attempt| async move {
        tracing::info!(%addr, attempt, attempts, "checking delve server");
        let mut client = DelveClient::connect(addr, handshake).await?;
        let state = client.state().await?;
        validate_state(&state, halted_ok)?;
        let pid = client.process_pid().await?;
        Ok::<_, Error>((client, pid, state.health()))
    })
    .await;

    match result {
        Ok((client, pid, health)) => {
            tracing::info!(%addr, pid, %health, "delve server connection and state ok");
            Ok(client)
        }
        Err(Error::Delve(DelveError::StaleConnection { .. })) => {
            Err(Error::StaleConnection { addr: addr.to_string(), attempts })
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
