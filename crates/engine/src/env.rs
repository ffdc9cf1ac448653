// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the engine crate.

use std::time::Duration;

/// Timeouts, retry counts and intervals used by patch and debug flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timing {
    /// `kubectl rollout status --timeout`
    pub rollout_timeout: Duration,
    /// Hard limit on the Delve RPC handshake
    pub rpc_handshake: Duration,
    pub health_attempts: u32,
    pub health_backoff: Duration,
    pub kill_attempts: u32,
    pub kill_backoff: Duration,
    /// Delve state poll interval while watching
    pub watch_interval: Duration,
    /// Window in which a second interrupt means exit
    pub reload_debounce: Duration,
    /// Wait for port-forward to report it is listening
    pub port_forward_ready: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            rollout_timeout: Duration::from_secs(30),
            rpc_handshake: Duration::from_secs(1),
            health_attempts: 10,
            health_backoff: Duration::from_secs(1),
            kill_attempts: 10,
            kill_backoff: Duration::from_millis(200),
            watch_interval: Duration::from_secs(1),
            reload_debounce: Duration::from_secs(2),
            port_forward_ready: Duration::from_secs(10),
        }
    }
}

impl Timing {
    /// Defaults overridden by `PODBUG_*` variables.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            rollout_timeout: millis("PODBUG_ROLLOUT_TIMEOUT_MS").unwrap_or(d.rollout_timeout),
            rpc_handshake: millis("PODBUG_RPC_HANDSHAKE_MS").unwrap_or(d.rpc_handshake),
            health_attempts: count("PODBUG_HEALTH_ATTEMPTS").unwrap_or(d.health_attempts),
            health_backoff: millis("PODBUG_HEALTH_BACKOFF_MS").unwrap_or(d.health_backoff),
            kill_attempts: count("PODBUG_KILL_ATTEMPTS").unwrap_or(d.kill_attempts),
            kill_backoff: millis("PODBUG_KILL_BACKOFF_MS").unwrap_or(d.kill_backoff),
            watch_interval: millis("PODBUG_WATCH_INTERVAL_MS").unwrap_or(d.watch_interval),
            reload_debounce: millis("PODBUG_RELOAD_DEBOUNCE_MS").unwrap_or(d.reload_debounce),
            port_forward_ready: millis("PODBUG_PORT_FORWARD_READY_MS").unwrap_or(d.port_forward_ready),
        }
    }

    podbug_core::setters! {
        set {
            rollout_timeout: Duration,
            rpc_handshake: Duration,
            health_attempts: u32,
            health_backoff: Duration,
            kill_attempts: u32,
            kill_backoff: Duration,
            watch_interval: Duration,
            reload_debounce: Duration,
            port_forward_ready: Duration,
        }
    }
}

/// Registry prefix for the patch image (`PODBUG_IMAGE_REPOSITORY`).
///
/// Overrides the repository parsed from the deployed image.
pub fn image_repository() -> Option<String> {
    std::env::var("PODBUG_IMAGE_REPOSITORY").ok().filter(|s| !s.is_empty())
}

fn millis(var: &str) -> Option<Duration> {
    std::env::var(var).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

fn count(var: &str) -> Option<u32> {
    std::env::var(var).ok().and_then(|s| s.parse::<u32>().ok()).filter(|n| *n > 0)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
