// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use podbug_adapters::{ClusterCall, FakeCluster};
use podbug_core::test_support::DeploymentBuilder;

fn cluster() -> FakeCluster {
    FakeCluster::new("default").with_deployment(DeploymentBuilder::new("web").container("web", "alpine").build())
}

fn kills(cluster: &FakeCluster) -> Vec<Vec<String>> {
    cluster
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            ClusterCall::Exec { command, .. } if command[0] == "kill" => Some(command),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn find_returns_empty_when_nothing_runs() {
    assert!(find(&cluster(), "web-0", "web", "dlv").await.unwrap().is_empty());
}

#[tokio::test]
async fn find_lists_all_matching_pids() {
    let cluster = cluster();
    let a = cluster.add_process("web-0", "web", "web");
    let b = cluster.add_process("web-0", "web", "web");
    cluster.add_process("web-0", "web", "dlv");
    assert_eq!(find(&cluster, "web-0", "web", "web").await.unwrap(), vec![a, b]);
}

#[tokio::test]
async fn nothing_to_kill_is_ok() {
    let cluster = cluster();
    kill_until_gone(&cluster, "web-0", "web", &["web", "dlv"], 3, Duration::ZERO).await.unwrap();
    assert!(kills(&cluster).is_empty());
}

#[tokio::test]
async fn first_round_terminates_then_escalates() {
    let cluster = cluster();
    let pid = cluster.add_process("web-0", "web", "dlv");
    cluster.set_kill_resistance(1);

    kill_until_gone(&cluster, "web-0", "web", &["dlv"], 5, Duration::ZERO).await.unwrap();
    assert!(cluster.processes("web-0", "web").is_empty());
    assert_eq!(
        kills(&cluster),
        vec![vec!["kill".to_string(), pid.to_string()], vec!["kill".into(), "-s".into(), "9".into(), pid.to_string()]]
    );
}

#[tokio::test]
async fn stubborn_process_times_out() {
    let cluster = cluster();
    cluster.add_process("web-0", "web", "web");
    cluster.add_process("web-0", "web", "dlv");
    cluster.set_kill_resistance(100);

    let err = kill_until_gone(&cluster, "web-0", "web", &["web", "dlv"], 3, Duration::ZERO).await.unwrap_err();
    match err {
        Error::KillTimeout { names, attempts, .. } => {
            assert_eq!(names, vec!["dlv", "web"]);
            assert_eq!(attempts, 3);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn process_dying_on_last_round_is_not_a_timeout() {
    let cluster = cluster();
    cluster.add_process("web-0", "web", "dlv");

    kill_until_gone(&cluster, "web-0", "web", &["dlv"], 1, Duration::ZERO).await.unwrap();
    assert!(cluster.processes("web-0", "web").is_empty());
}

#[tokio::test]
async fn escalated_kill_on_last_round_is_not_a_timeout() {
    let cluster = cluster();
    cluster.add_process("web-0", "web", "dlv");
    cluster.set_kill_resistance(1);

    kill_until_gone(&cluster, "web-0", "web", &["dlv"], 2, Duration::ZERO).await.unwrap();
    assert_eq!(kills(&cluster).len(), 2);
}
