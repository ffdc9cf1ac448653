// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Find and kill processes inside a container.
//!
//! `kill` inside a container returns before the process is gone, so
//! termination is only trusted once `pidof` stops reporting the pid.

use crate::Error;
use podbug_adapters::{ClusterAdapter, ClusterError};
use podbug_exec::parse_pids;
use std::collections::BTreeMap;
use std::time::Duration;

/// Pids of processes called `name`; empty when none run.
pub async fn find<K: ClusterAdapter>(cluster: &K, pod: &str, container: &str, name: &str) -> Result<Vec<u32>, Error> {
    let command = vec!["pidof".to_string(), name.to_string()];
    match cluster.exec(pod, container, &command).await {
        Ok(out) => Ok(parse_pids(&out).map_err(ClusterError::from)?),
        // pidof exits 1 when nothing matches
        Err(e) if e.is_exit_code(1) => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Kill every process called one of `names` and wait until they are gone.
///
/// The first round sends SIGTERM, later rounds SIGKILL. Kill failures are
/// logged and retried; only processes still alive after `attempts` rounds
/// fail the call.
pub async fn kill_until_gone<K: ClusterAdapter>(
    cluster: &K,
    pod: &str,
    container: &str,
    names: &[&str],
    attempts: u32,
    backoff: Duration,
) -> Result<(), Error> {
    let mut targets = BTreeMap::new();
    for name in names {
        targets.insert(*name, find(cluster, pod, container, name).await?);
    }

    for attempt in 0..attempts {
        for (name, pids) in targets.iter_mut() {
            if pids.is_empty() {
                continue;
            }
            let alive = find(cluster, pod, container, name).await?;
            pids.retain(|pid| alive.contains(pid));
            for pid in pids.iter() {
                let mut command = vec!["kill".to_string()];
                if attempt > 0 {
                    command.extend(["-s".to_string(), "9".to_string()]);
                }
                command.push(pid.to_string());
                if let Err(e) = cluster.exec(pod, container, &command).await {
                    tracing::warn!(%pod, %name, pid, error = %e, "kill failed");
                }
            }
        }
        if targets.values().all(Vec::is_empty) {
            return Ok(());
        }
        tokio::time::sleep(backoff).await;
    }

    // the last round's kills get one more look before giving up
    let mut names = Vec::new();
    for (name, pids) in &targets {
        if pids.is_empty() {
            continue;
        }
        let alive = find(cluster, pod, container, name).await?;
        if pids.iter().any(|pid| alive.contains(pid)) {
            names.push(name.to_string());
        }
    }
    if names.is_empty() {
        return Ok(());
    }
    Err(Error::KillTimeout { pod: pod.to_string(), container: container.to_string(), names, attempts })
}

#[cfg(test)]
#[path = "pids_tests.rs"]
mod tests;
