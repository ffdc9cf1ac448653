// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use podbug_adapters::{ClusterCall, DebuggerState, FakeCluster, FakeDelveServer, FakeEditor, FakeImages, FakeToolchain};
use podbug_core::test_support::DeploymentBuilder;
use podbug_core::{FakeClock, Platform};
use std::collections::BTreeMap;
use std::path::PathBuf;

type TestSession = DebugSession<FakeCluster, FakeImages, FakeToolchain, FakeEditor, FakeClock>;

struct Harness {
    deps: Deps<FakeCluster, FakeImages, FakeToolchain, FakeEditor>,
    delve: FakeDelveServer,
    config: SessionConfig,
}

fn timing() -> Timing {
    Timing::default()
        .health_attempts(3)
        .health_backoff(Duration::from_millis(5))
        .rpc_handshake(Duration::from_millis(100))
        .kill_backoff(Duration::from_millis(20))
        .watch_interval(Duration::from_millis(10))
}

async fn harness() -> Harness {
    let deployment =
        DeploymentBuilder::new("web").container_with_args("web", "alpine:3.20", &["/web", "serve"], &["-v"]).build();
    let cluster = FakeCluster::new("default").with_deployment(deployment.clone());
    let snapshot = BTreeMap::from([(SNAPSHOT_KEY.to_string(), serde_json::to_string(&deployment).unwrap())]);
    cluster.create_config_map("web-patch", snapshot).await.unwrap();

    let delve = FakeDelveServer::bind("127.0.0.1:0").await.unwrap();
    let config = SessionConfig {
        workload: WorkloadRef::new("default", "web"),
        pod: "web-0".into(),
        container: "web".into(),
        source: SourceTarget { module_root: PathBuf::from("/src/web"), package: "./cmd/web".into() },
        args: Vec::new(),
        listen: ListenAddr::new("127.0.0.1", delve.port()),
        continue_on_start: true,
        launch_editor: false,
    };
    let deps = Deps { cluster, images: FakeImages::new(), toolchain: FakeToolchain::new(), editor: FakeEditor::new() };
    Harness { deps, delve, config }
}

impl Harness {
    fn session(&self) -> TestSession {
        DebugSession::new(self.deps.clone(), FakeClock::new(), timing(), self.config.clone()).unwrap()
    }

    fn state_polls(&self) -> usize {
        self.delve.methods().iter().filter(|m| *m == "RPCServer.State").count()
    }

    fn dlv_launches(&self) -> Vec<Vec<String>> {
        self.deps
            .cluster
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                ClusterCall::ExecBackground { command, .. } => Some(command),
                _ => None,
            })
            .collect()
    }
}

async fn eventually(what: &str, mut done: impl FnMut() -> bool) {
    for _ in 0..500 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

#[tokio::test]
async fn loads_and_exits_cleanly() {
    let h = harness().await;
    let (tx, rx) = mpsc::unbounded_channel();
    let run = tokio::spawn(h.session().run(rx));

    // health check plus at least one watch poll
    eventually("watch", || h.state_polls() >= 2).await;
    assert_eq!(h.deps.cluster.processes("web-0", "web"), vec!["web".to_string(), "dlv".to_string()]);
    assert!(h.deps.cluster.has_file("web-0", "web", "/web"));
    assert!(!h.deps.cluster.has_file("web-0", "web", "/web-build"));

    tx.send(Control::Exit).unwrap();
    run.await.unwrap().unwrap();
    assert!(h.deps.cluster.processes("web-0", "web").is_empty());
    assert!(h.deps.cluster.calls().contains(&ClusterCall::DeleteService { name: "web-0".into() }));
}

#[tokio::test]
async fn launch_arguments_come_from_snapshot() {
    let h = harness().await;
    let (tx, rx) = mpsc::unbounded_channel();
    let run = tokio::spawn(h.session().run(rx));
    eventually("health check", || h.state_polls() >= 1).await;
    tx.send(Control::Exit).unwrap();
    run.await.unwrap().unwrap();

    let launch = &h.dlv_launches()[0];
    let port = format!("--listen=:{}", h.delve.port());
    assert_eq!(&launch[..3], ["dlv", "exec", "/web"]);
    assert!(launch.contains(&port));
    assert!(launch.contains(&"--continue".to_string()));
    assert_eq!(&launch[launch.len() - 3..], ["--", "serve", "-v"]);
}

#[tokio::test]
async fn build_targets_deployed_platform() {
    let h = harness().await;
    h.deps.images.set_platform(Platform::new("linux", "arm64"));
    let (tx, rx) = mpsc::unbounded_channel();
    let run = tokio::spawn(h.session().run(rx));
    eventually("health check", || h.state_polls() >= 1).await;
    tx.send(Control::Exit).unwrap();
    run.await.unwrap().unwrap();

    let builds = h.deps.toolchain.calls();
    assert_eq!(builds.len(), 1);
    assert_eq!(builds[0].package, "./cmd/web");
    assert_eq!(builds[0].platform, Platform::new("linux", "arm64"));
}

#[tokio::test]
async fn reload_rebuilds_and_restarts_debugger() {
    let h = harness().await;
    let (tx, rx) = mpsc::unbounded_channel();
    let run = tokio::spawn(h.session().run(rx));
    eventually("first load", || h.state_polls() >= 1).await;

    tx.send(Control::Reload("interrupt => reload".into())).unwrap();
    eventually("second load", || h.dlv_launches().len() == 2 && h.state_polls() >= 3).await;
    assert_eq!(h.deps.toolchain.calls().len(), 2);
    // one dlv and one binary, the first pair was killed
    assert_eq!(h.deps.cluster.processes("web-0", "web").len(), 2);

    tx.send(Control::Exit).unwrap();
    run.await.unwrap().unwrap();
    let forwards = h.deps.cluster.calls().into_iter().filter(|c| matches!(c, ClusterCall::PortForward { .. })).count();
    assert_eq!(forwards, 1);
}

#[tokio::test]
async fn target_halted_at_entry_is_a_working_session() {
    let mut h = harness().await;
    h.config.continue_on_start = false;
    h.delve.set_state(DebuggerState { pid: 42, running: false, exited: false, exit_status: 0 });
    let (tx, rx) = mpsc::unbounded_channel();
    let run = tokio::spawn(h.session().run(rx));

    eventually("watch", || h.state_polls() >= 3).await;
    assert!(!h.dlv_launches()[0].contains(&"--continue".to_string()));

    tx.send(Control::Exit).unwrap();
    run.await.unwrap().unwrap();
}

#[tokio::test]
async fn exited_target_ends_session_with_cleanup() {
    let h = harness().await;
    let (_tx, rx) = mpsc::unbounded_channel();
    let run = tokio::spawn(h.session().run(rx));
    eventually("watch", || h.state_polls() >= 2).await;

    h.delve.set_state(DebuggerState { pid: 42, running: false, exited: true, exit_status: 3 });
    let err = run.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::DebuggerDown { ref reason } if reason.contains("status 3")), "{err:?}");
    assert!(h.deps.cluster.processes("web-0", "web").is_empty());
}

#[tokio::test]
async fn stale_debugger_fails_after_retries() {
    let h = harness().await;
    h.delve.set_stale(true);
    let (_tx, rx) = mpsc::unbounded_channel();
    let err = h.session().run(rx).await.unwrap_err();
    assert!(matches!(err, Error::StaleConnection { attempts: 3, .. }), "{err:?}");
    assert!(h.deps.cluster.processes("web-0", "web").is_empty());
}

#[tokio::test]
async fn build_failure_stops_before_deploy() {
    let h = harness().await;
    h.deps.toolchain.set_fail(true);
    let (_tx, rx) = mpsc::unbounded_channel();
    let err = h.session().run(rx).await.unwrap_err();
    assert!(matches!(err, Error::BuildFailed(_)), "{err:?}");
    assert!(h.dlv_launches().is_empty());
    assert!(!h.deps.cluster.calls().iter().any(|c| matches!(c, ClusterCall::Copy { .. })));
}

#[tokio::test]
async fn editor_gets_attach_config() {
    let mut h = harness().await;
    h.config.launch_editor = true;
    let (tx, rx) = mpsc::unbounded_channel();
    let run = tokio::spawn(h.session().run(rx));
    eventually("editor launch", || !h.deps.editor.launches().is_empty()).await;
    tx.send(Control::Exit).unwrap();
    run.await.unwrap().unwrap();

    let launch = &h.deps.editor.launches()[0];
    assert_eq!(launch.workspace, PathBuf::from("/src/web"));
    assert_eq!(launch.config.name, "web-1700000000");
    assert_eq!(launch.config.port, h.delve.port());
    assert_eq!(launch.config.host, "127.0.0.1");
}

#[tokio::test]
async fn explicit_args_skip_snapshot() {
    let mut h = harness().await;
    h.deps.cluster.delete_config_map("web-patch").await.unwrap();
    h.config.args = vec!["--debug".into()];
    let (tx, rx) = mpsc::unbounded_channel();
    let run = tokio::spawn(h.session().run(rx));
    eventually("health check", || h.state_polls() >= 1).await;
    tx.send(Control::Exit).unwrap();
    run.await.unwrap().unwrap();
    assert_eq!(h.dlv_launches()[0].last().map(String::as_str), Some("--debug"));
}

#[tokio::test]
async fn missing_snapshot_is_an_error() {
    let h = harness().await;
    h.deps.cluster.delete_config_map("web-patch").await.unwrap();
    let (_tx, rx) = mpsc::unbounded_channel();
    let err = h.session().run(rx).await.unwrap_err();
    assert!(matches!(err, Error::Cluster(_)), "{err:?}");
}

#[tokio::test]
async fn cleanup_with_nothing_running_is_ok() {
    let h = harness().await;
    let session = h.session();
    assert!(session.cleanup("manual").await.unwrap());
    assert!(session.cleanup("manual").await.unwrap());
}

#[tokio::test]
async fn concurrent_cleanup_runs_once() {
    let h = harness().await;
    h.deps.cluster.add_process("web-0", "web", "dlv");
    h.deps.cluster.set_kill_resistance(1);
    let cleaner = h.session().cleaner();

    let (a, b) = tokio::join!(cleaner.run("exit"), cleaner.run("watch"));
    let ran = [a.unwrap(), b.unwrap()];
    assert_eq!(ran.iter().filter(|r| **r).count(), 1);
    assert!(h.deps.cluster.processes("web-0", "web").is_empty());
}
