// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

fn sh(script: &str) -> Cmd {
    Cmd::new("/bin/sh").args(["-c", script])
}

// ---------------------------------------------------------------------------
// Blocking mode
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_returns_combined_output() {
    let out = sh("echo out; echo err >&2").run(&CancellationToken::new()).await.unwrap();
    assert!(out.contains("out\n"));
    assert!(out.contains("err\n"));
}

#[tokio::test]
async fn run_passes_env_and_cwd() {
    let dir = tempfile::tempdir().unwrap();
    let out = sh("echo $GREETING; pwd")
        .env("GREETING", "hello")
        .cwd(dir.path())
        .run(&CancellationToken::new())
        .await
        .unwrap();
    let mut lines = out.lines();
    assert_eq!(lines.next(), Some("hello"));
    let pwd = std::path::PathBuf::from(lines.next().unwrap());
    assert_eq!(pwd.canonicalize().unwrap(), dir.path().canonicalize().unwrap());
}

#[yare::parameterized(
    one = { 1 },
    three = { 3 },
)]
fn non_zero_exit_is_failed(code: i32) {
    tokio::runtime::Runtime::new().unwrap().block_on(async {
        let err = sh(&format!("echo boom; exit {code}")).run(&CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.exit_code(), Some(code));
        assert_eq!(err.output(), "boom\n");
        assert!(err.to_string().contains("boom"));
    });
}

#[tokio::test]
async fn missing_program_is_spawn_failure() {
    let err = Cmd::new("/definitely/not/a/program").run(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, ExecError::SpawnFailed { .. }), "{err:?}");
}

#[tokio::test]
async fn cancel_kills_running_command() {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });
    let err = Cmd::new("sleep").arg("30").run(&cancel).await.unwrap_err();
    assert!(err.is_cancelled());
}

// ---------------------------------------------------------------------------
// Hooks and sinks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pre_start_error_aborts_launch() {
    let started = Arc::new(AtomicBool::new(false));
    let flag = started.clone();
    let err = Cmd::new("true")
        .pre_start(|| Err("not today".to_string()))
        .post_start(move |_| flag.store(true, Ordering::SeqCst))
        .run(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExecError::Hook { ref message, .. } if message == "not today"));
    assert!(!started.load(Ordering::SeqCst));
}

#[tokio::test]
async fn post_start_receives_pid_and_post_end_sees_result() {
    let pid = Arc::new(AtomicU32::new(0));
    let ended = Arc::new(Mutex::new(None));
    let (p, e) = (pid.clone(), ended.clone());
    sh("echo done")
        .post_start(move |h| p.store(h.pid().unwrap_or_default(), Ordering::SeqCst))
        .post_end(move |r| *e.lock() = Some(r.as_ref().cloned().map_err(|e| e.to_string())))
        .run(&CancellationToken::new())
        .await
        .unwrap();
    assert_ne!(pid.load(Ordering::SeqCst), 0);
    assert_eq!(ended.lock().clone(), Some(Ok("done\n".to_string())));
}

#[tokio::test]
async fn line_sinks_split_streams() {
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    let (err_tx, mut err_rx) = mpsc::unbounded_channel();
    sh("echo a; echo b >&2; echo c")
        .stdout_lines(out_tx)
        .stderr_lines(err_tx)
        .run(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(out_rx.recv().await.as_deref(), Some("a"));
    assert_eq!(out_rx.recv().await.as_deref(), Some("c"));
    assert_eq!(err_rx.recv().await.as_deref(), Some("b"));
}

#[test]
fn display_joins_program_and_args() {
    let cmd = Cmd::new("kubectl").args(["get", "pods"]).env("A", "b");
    assert_eq!(cmd.to_string(), "kubectl get pods");
    assert_eq!(cmd.environment(), &[("A".to_string(), "b".to_string())]);
}

// ---------------------------------------------------------------------------
// Background mode
// ---------------------------------------------------------------------------

#[tokio::test]
async fn spawn_signals_started_then_done() {
    let mut running = sh("sleep 0.1; echo finished").spawn();
    let handle = running.wait_started().await.unwrap();
    assert!(handle.pid().is_some());
    assert_eq!(running.process(), Some(handle));
    assert_eq!(running.wait().await.unwrap(), "finished\n");
}

#[tokio::test]
async fn spawn_of_missing_program_never_starts() {
    let mut running = Cmd::new("/definitely/not/a/program").spawn();
    let err = running.wait_started().await.unwrap_err();
    assert!(matches!(err, ExecError::NotStarted { .. }), "{err:?}");
}

#[tokio::test]
async fn terminate_stops_background_command() {
    let mut running = Cmd::new("sleep").arg("30").spawn();
    running.wait_started().await.unwrap();
    assert!(!running.is_finished());
    running.terminate();
    let err = running.wait().await.unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn process_handle_terminate_ends_process() {
    let mut running = Cmd::new("sleep").arg("30").spawn();
    let handle = running.wait_started().await.unwrap();
    handle.terminate().unwrap();
    let err = running.wait().await.unwrap_err();
    assert_eq!(err.exit_code(), None);
    assert!(matches!(err, ExecError::Failed { .. }));
}

#[tokio::test]
async fn from_future_reports_started_without_pid() {
    let mut running = Running::from_future("fake", async { Ok("ok".to_string()) });
    assert_eq!(running.wait_started().await.unwrap().pid(), None);
    assert_eq!(running.wait().await.unwrap(), "ok");
}

#[tokio::test]
async fn from_future_terminate_drops_future() {
    let running = Running::from_future("fake", std::future::pending());
    running.terminate();
    assert!(running.wait().await.unwrap_err().is_cancelled());
}

#[tokio::test]
async fn invalid_utf8_output_keeps_draining() {
    let out = sh(r"printf 'a\377b\n'; head -c 300000 /dev/zero | tr '\0' x; echo; echo tail")
        .run(&CancellationToken::new())
        .await
        .unwrap();
    let mut lines = out.lines();
    assert_eq!(lines.next(), Some("a\u{FFFD}b"));
    assert_eq!(lines.next().map(str::len), Some(300_000));
    assert_eq!(lines.next(), Some("tail"));
}

#[tokio::test]
async fn crlf_line_endings_are_trimmed() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    sh(r"printf 'one\r\ntwo\n'").stdout_lines(tx).run(&CancellationToken::new()).await.unwrap();
    assert_eq!(rx.recv().await.as_deref(), Some("one"));
    assert_eq!(rx.recv().await.as_deref(), Some("two"));
}
