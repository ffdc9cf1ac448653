// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use podbug_adapters::{ClusterCall, FakeCluster, FakeDelveServer, FakeEditor, FakeImages, FakeToolchain};
use podbug_core::test_support::DeploymentBuilder;
use podbug_core::FakeClock;
use std::time::Duration;

type TestPodbug = Podbug<FakeCluster, FakeImages, FakeToolchain, FakeEditor, FakeClock>;

fn setup() -> (FakeCluster, TestPodbug) {
    let cluster = FakeCluster::new("default").with_deployment(
        DeploymentBuilder::new("web").container_with_args("web", "alpine:3.20", &["/web"], &["--port", "80"]).build(),
    );
    let deps = Deps {
        cluster: cluster.clone(),
        images: FakeImages::new(),
        toolchain: FakeToolchain::new(),
        editor: FakeEditor::new(),
    };
    let timing = Timing::default()
        .health_attempts(2)
        .health_backoff(Duration::from_millis(5))
        .kill_backoff(Duration::ZERO)
        .watch_interval(Duration::from_millis(10));
    (cluster, Podbug::new(deps, FakeClock::new(), timing))
}

fn target() -> Target {
    Target { deployment: "web".into(), ..Target::default() }
}

#[tokio::test]
async fn shell_requires_patch() {
    let (cluster, podbug) = setup();
    let err = podbug.shell(&target()).await.unwrap_err();
    assert!(matches!(err, Error::NotPatched { .. }), "{err:?}");

    podbug.patch("web", &PatchRequest::default()).await.unwrap();
    podbug.shell(&target()).await.unwrap();
    assert!(cluster.calls().contains(&ClusterCall::Shell { pod: "web-0".into(), container: "web".into() }));
}

#[tokio::test]
async fn unknown_pod_lists_alternatives() {
    let (_cluster, podbug) = setup();
    podbug.patch("web", &PatchRequest::default()).await.unwrap();
    let err = podbug.shell(&Target { pod: Some("web-9".into()), ..target() }).await.unwrap_err();
    assert!(err.is_resource_not_found(), "{err:?}");
    assert!(err.to_string().contains("web-0"), "{err}");
}

#[tokio::test]
async fn missing_namespace_is_rejected() {
    let (cluster, podbug) = setup();
    cluster.remove_namespace("default");
    let err = podbug.rollback("web").await.unwrap_err();
    assert!(err.is_resource_not_found(), "{err:?}");
}

#[tokio::test]
async fn cleanup_works_on_unpatched_deployment() {
    let (cluster, podbug) = setup();
    cluster.add_process("web-0", "web", "dlv");
    podbug.cleanup(&target()).await.unwrap();
    assert!(cluster.processes("web-0", "web").is_empty());
}

#[tokio::test]
async fn delve_requires_patch() {
    let (_cluster, podbug) = setup();
    let dir = tempfile::tempdir().unwrap();
    let request = DelveRequest {
        target: target(),
        source: dir.path().to_path_buf(),
        args: Vec::new(),
        listen: ListenAddr::default(),
        continue_on_start: false,
        launch_editor: false,
    };
    let (_tx, rx) = mpsc::unbounded_channel();
    let err = podbug.delve(request, rx).await.unwrap_err();
    assert!(matches!(err, Error::NotPatched { .. }), "{err:?}");
}

#[tokio::test]
async fn patch_then_debug_then_rollback() {
    let (cluster, podbug) = setup();
    podbug.patch("web", &PatchRequest::default()).await.unwrap();

    let module = tempfile::tempdir().unwrap();
    std::fs::write(module.path().join("go.mod"), "module example.com/web\n").unwrap();
    let delve = FakeDelveServer::bind("127.0.0.1:0").await.unwrap();
    let request = DelveRequest {
        target: target(),
        source: module.path().to_path_buf(),
        args: Vec::new(),
        listen: ListenAddr::new("127.0.0.1", delve.port()),
        continue_on_start: true,
        launch_editor: false,
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let session = podbug.delve(request, rx);
    let stop = async {
        while !delve.methods().iter().any(|m| m == "RPCServer.State") {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tx.send(Control::Exit).unwrap();
    };
    let (result, ()) = tokio::join!(session, stop);
    result.unwrap();

    // launch args come from the pre-patch container
    let launch = cluster.calls().into_iter().find_map(|c| match c {
        ClusterCall::ExecBackground { command, .. } => Some(command),
        _ => None,
    });
    assert_eq!(launch.unwrap().last().map(String::as_str), Some("80"));

    assert_eq!(podbug.rollback("web").await.unwrap(), 1);
    assert!(cluster.processes("web-0", "web").is_empty());
}
