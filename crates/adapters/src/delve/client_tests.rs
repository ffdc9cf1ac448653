// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use yare::parameterized;

const HANDSHAKE: Duration = Duration::from_millis(500);

#[parameterized(
    running = { DebuggerState { running: true, ..Default::default() }, Health::Running },
    halted = { DebuggerState::default(), Health::Halted },
    exited = { DebuggerState { exited: true, exit_status: 2, ..Default::default() }, Health::Exited },
    exited_wins_over_running = { DebuggerState { running: true, exited: true, ..Default::default() }, Health::Exited },
)]
fn classifies_state(state: DebuggerState, expected: Health) {
    assert_eq!(state.health(), expected);
}

#[test]
fn state_reads_wire_field_names() {
    let state: DebuggerState =
        serde_json::from_str(r#"{"Pid":7,"Running":false,"exited":true,"exitStatus":3,"When":""}"#).unwrap();
    assert_eq!(state, DebuggerState { pid: 7, running: false, exited: true, exit_status: 3 });
}

#[tokio::test]
async fn connect_negotiates_version_and_reads_state() {
    let server = FakeDelveServer::bind("127.0.0.1:0").await.unwrap();
    let mut client = DelveClient::connect(&server.addr().to_string(), HANDSHAKE).await.unwrap();

    let state = client.state().await.unwrap();
    assert_eq!(state.health(), Health::Running);
    assert_eq!(client.process_pid().await.unwrap(), 42);
    assert_eq!(
        server.methods(),
        vec!["RPCServer.SetApiVersion", "RPCServer.State", "RPCServer.ProcessPid"]
    );
}

#[tokio::test]
async fn state_changes_are_visible_on_open_connection() {
    let server = FakeDelveServer::bind("127.0.0.1:0").await.unwrap();
    let mut client = DelveClient::connect(&server.addr().to_string(), HANDSHAKE).await.unwrap();
    server.set_state(DebuggerState { exited: true, ..Default::default() });
    assert_eq!(client.state().await.unwrap().health(), Health::Exited);
}

#[tokio::test]
async fn accepted_but_silent_connection_is_stale() {
    let server = FakeDelveServer::bind("127.0.0.1:0").await.unwrap();
    server.set_stale(true);

    let err = DelveClient::connect(&server.addr().to_string(), Duration::from_millis(100)).await.unwrap_err();
    assert!(matches!(err, DelveError::StaleConnection { .. }), "{err:?}");
}

#[tokio::test]
async fn refused_connection_is_connect_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let err = DelveClient::connect(&addr.to_string(), HANDSHAKE).await.unwrap_err();
    assert!(matches!(err, DelveError::Connect { .. }), "{err:?}");
}

#[tokio::test]
async fn closed_server_surfaces_on_next_call() {
    let server = FakeDelveServer::bind("127.0.0.1:0").await.unwrap();
    let mut client = DelveClient::connect(&server.addr().to_string(), HANDSHAKE).await.unwrap();
    drop(server);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(client.state().await.is_err());
}
