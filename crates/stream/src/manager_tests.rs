// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use loghoi_core::session::SessionState;
use loghoi_remote::FakeExecutor;
use tokio::sync::mpsc;

use super::*;

fn manager(executor: Arc<FakeExecutor>) -> SessionManager<FakeExecutor> {
    SessionManager::new(executor, Duration::from_secs(300), DEFAULT_MAX_LINES_PER_SECOND)
}

#[tokio::test]
async fn on_connect_starts_in_connected_state() {
    let mgr = manager(Arc::new(FakeExecutor::new()));
    let id = mgr.on_connect();
    assert_eq!(mgr.state(&id).unwrap(), SessionState::Connected);
}

#[tokio::test]
async fn heartbeat_on_unknown_session_is_not_found() {
    let mgr = manager(Arc::new(FakeExecutor::new()));
    let err = mgr.heartbeat(&SessionId::generate()).unwrap_err();
    assert!(matches!(err, SessionError::NotFound(_)));
}

#[tokio::test]
async fn add_ssh_transitions_to_ssh_ready() {
    let mgr = manager(Arc::new(FakeExecutor::new()));
    let id = mgr.on_connect();
    mgr.add_ssh(&id, "cvm-1").await.unwrap();
    assert_eq!(mgr.state(&id).unwrap(), SessionState::SshReady);
}

#[tokio::test]
async fn add_ssh_retries_after_a_transient_auth_failure() {
    let executor = Arc::new(FakeExecutor::new());
    executor.fail_auth("cvm-flaky");
    let mgr = manager(executor);
    let id = mgr.on_connect();

    mgr.add_ssh(&id, "cvm-flaky").await.unwrap();
    assert_eq!(mgr.state(&id).unwrap(), SessionState::SshReady);
}

#[tokio::test]
async fn start_monitor_requires_ssh_ready() {
    let mgr = manager(Arc::new(FakeExecutor::new()));
    let id = mgr.on_connect();
    let (tx, _rx) = mpsc::channel(8);

    let err = mgr
        .start_monitor(&id, "/var/log/messages", "label", tx)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::NoSshChannel(_)));
}

#[tokio::test]
async fn start_monitor_streams_records_to_sink() {
    let executor = Arc::new(FakeExecutor::new());
    let mgr = manager(executor.clone());
    let id = mgr.on_connect();
    mgr.add_ssh(&id, "cvm-1").await.unwrap();

    // Each `connect` call consumes that host's pending script, and
    // `start_monitor` opens its own dedicated channel — so the tail
    // command is scripted here, after `add_ssh` already connected once.
    executor.script_command(
        "cvm-1",
        "tail -f /var/log/messages",
        vec!["line one".to_string(), "line two".to_string()],
        0,
    );

    let (tx, mut rx) = mpsc::channel(8);
    mgr.start_monitor(&id, "/var/log/messages", "messages", tx).await.unwrap();
    assert_eq!(mgr.state(&id).unwrap(), SessionState::Streaming);

    let first = rx.recv().await.expect("first line should arrive");
    assert_eq!(first.line, "line one");
    assert_eq!(first.sequence, 1);
    let second = rx.recv().await.expect("second line should arrive");
    assert_eq!(second.line, "line two");
    assert_eq!(second.sequence, 2);
}

#[tokio::test]
async fn start_monitor_rejects_a_second_concurrent_monitor() {
    let executor = Arc::new(FakeExecutor::new());
    let mgr = manager(executor);
    let id = mgr.on_connect();
    mgr.add_ssh(&id, "cvm-1").await.unwrap();

    let (tx, _rx) = mpsc::channel(8);
    mgr.start_monitor(&id, "/a", "a", tx).await.unwrap();

    let (tx2, _rx2) = mpsc::channel(8);
    let err = mgr.start_monitor(&id, "/a", "a", tx2).await.unwrap_err();
    assert!(matches!(err, SessionError::MonitorAlreadyRunning(_)));
}

#[tokio::test]
async fn stop_all_is_idempotent() {
    let executor = Arc::new(FakeExecutor::new());
    let mgr = manager(executor);
    let id = mgr.on_connect();
    mgr.add_ssh(&id, "cvm-1").await.unwrap();

    mgr.stop_all(&id).await.unwrap();
    mgr.stop_all(&id).await.unwrap();
    assert!(matches!(mgr.state(&id), Err(SessionError::NotFound(_))));
}

#[tokio::test]
async fn on_disconnect_tears_down_an_active_monitor() {
    let executor = Arc::new(FakeExecutor::new());
    let mgr = manager(executor.clone());
    let id = mgr.on_connect();
    mgr.add_ssh(&id, "cvm-1").await.unwrap();
    executor.script_command("cvm-1", "tail -f /a", vec!["x".to_string()], 0);
    let (tx, mut rx) = mpsc::channel(8);
    mgr.start_monitor(&id, "/a", "a", tx).await.unwrap();
    rx.recv().await.expect("line should arrive before teardown");

    mgr.on_disconnect(&id).await.unwrap();
    assert!(matches!(mgr.state(&id), Err(SessionError::NotFound(_))));
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn session_that_ran_a_monitor_survives_past_its_idle_timeout() {
    // idle_timeout=0 means connected_at is already "expired" the instant
    // the watcher's first tick runs; a session that never streamed would
    // be torn down within ~1s. One that streamed must not be.
    let executor = Arc::new(FakeExecutor::new());
    let mgr = SessionManager::new(executor.clone(), Duration::from_secs(0), DEFAULT_MAX_LINES_PER_SECOND);
    let id = mgr.on_connect();
    mgr.add_ssh(&id, "cvm-1").await.unwrap();
    executor.script_command("cvm-1", "tail -f /a", vec!["x".to_string()], 0);
    let (tx, mut rx) = mpsc::channel(8);
    mgr.start_monitor(&id, "/a", "a", tx).await.unwrap();
    rx.recv().await.expect("line should arrive");
    drop(rx);

    // Let the monitor end (sink dropped) and the idle watcher tick a few
    // times; the session must still be present, parked at SshReady.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(mgr.state(&id).unwrap(), SessionState::SshReady);

    mgr.on_disconnect(&id).await.unwrap();
}

#[tokio::test]
async fn session_with_no_monitor_is_torn_down_after_idle_timeout() {
    let executor = Arc::new(FakeExecutor::new());
    let mgr = SessionManager::new(executor, Duration::from_millis(50), DEFAULT_MAX_LINES_PER_SECOND);
    let id = mgr.on_connect();

    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert!(matches!(mgr.state(&id), Err(SessionError::NotFound(_))));
}

#[tokio::test]
async fn concurrent_operations_on_the_same_session_are_declined() {
    let executor = Arc::new(FakeExecutor::new());
    executor.fail_auth("cvm-slow");
    let mgr = Arc::new(manager(executor));
    let id = mgr.on_connect();

    let mgr_a = mgr.clone();
    let id_a = id.clone();
    let slow = tokio::spawn(async move { mgr_a.add_ssh(&id_a, "cvm-slow").await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    let err = mgr.add_ssh(&id, "cvm-slow").await.unwrap_err();
    assert!(matches!(err, SessionError::OperationInProgress(_)));

    slow.await.unwrap().unwrap();
}
