// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::cluster::{ClusterAdapter, ClusterCall, FakeCluster};
use podbug_core::test_support::DeploymentBuilder;

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

#[test]
fn argv_for_plain_server() {
    assert_eq!(
        DelveCommand::new("/web", 2345).argv(),
        strings(&["dlv", "exec", "/web", "--api-version=2", "--headless", "--listen=:2345", "--accept-multiclient"])
    );
}

#[test]
fn argv_with_continue_and_program_args() {
    let argv = DelveCommand::new("/web", 40000)
        .continue_on_start(true)
        .args(strings(&["--port", "8080"]))
        .argv();
    assert_eq!(
        argv,
        strings(&[
            "dlv",
            "exec",
            "/web",
            "--api-version=2",
            "--headless",
            "--listen=:40000",
            "--accept-multiclient",
            "--continue",
            "--",
            "--port",
            "8080",
        ])
    );
}

#[tokio::test]
async fn start_runs_in_container_and_stop_ends_exec() {
    let cluster = FakeCluster::new("default")
        .with_deployment(DeploymentBuilder::new("web").container("app", "alpine:latest").build());
    let server = DelveServer::start(&cluster, "web-0", "app", &DelveCommand::new("/web", 2345)).await.unwrap();
    assert_eq!(cluster.processes("web-0", "app"), vec!["web", "dlv"]);
    assert!(cluster
        .calls()
        .iter()
        .any(|c| matches!(c, ClusterCall::ExecBackground { command, .. } if command[0] == "dlv")));

    assert_eq!(server.stop().await.unwrap(), "");
    // Local exec stopped; the remote process is left for pid-based cleanup
    assert!(cluster.exec("web-0", "app", &strings(&["pidof", "dlv"])).await.is_ok());
}
