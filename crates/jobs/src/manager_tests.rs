// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use loghoi_core::capture::CaptureItem;
use loghoi_core::job::JobState;
use loghoi_remote::FakeExecutor;

use super::*;

fn paths(dir: &tempfile::TempDir) -> JobPaths {
    JobPaths {
        log_dir: dir.path().join("log"),
        zip_dir: dir.path().join("zip"),
    }
}

async fn wait_for_terminal<E: RemoteExecutor>(manager: &JobManager<E>, id: &JobId) -> CollectionJob {
    for _ in 0..200 {
        let job = manager.get(id).unwrap();
        if job.state.is_terminal() {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {id} never reached a terminal state");
}

#[tokio::test]
async fn successful_run_produces_an_archive() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(FakeExecutor::new());
    executor.script_file("cvm-1", "/var/log/messages", b"line one\nline two\n".to_vec());
    executor.script_command("cvm-1", "uptime", vec!["up 3 days".to_string()], 0);

    let manager = JobManager::new(executor, paths(&dir));
    let id = manager.submit(
        "cvm-1",
        vec![CaptureItem::FileCapture {
            remote_path: "/var/log/messages".to_string(),
        }],
        vec![CaptureItem::CommandCapture {
            name: "uptime".to_string(),
            command: "uptime".to_string(),
        }],
    );

    let job = wait_for_terminal(&manager, &id).await;
    assert_eq!(job.state, JobState::Completed);
    let archive_path = job.archive_path.expect("completed job must have an archive path");
    assert!(archive_path.exists());

    let file = std::fs::File::open(&archive_path).unwrap();
    let archive = zip::ZipArchive::new(file).unwrap();
    assert_eq!(archive.len(), 2);
}

#[tokio::test]
async fn connect_failure_marks_job_failed() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(FakeExecutor::new());
    executor.fail_auth("cvm-down");

    let manager = JobManager::new(executor, paths(&dir));
    let id = manager.submit("cvm-down", Vec::new(), Vec::new());

    let job = wait_for_terminal(&manager, &id).await;
    assert_eq!(job.state, JobState::Failed);
    assert!(job.error_message.is_some());
}

#[tokio::test]
async fn unknown_fetch_target_does_not_abort_the_job() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(FakeExecutor::new());
    // No file scripted for this path; sftp_get, then scp, then ssh-cat all fail.
    let manager = JobManager::new(executor, paths(&dir));
    let id = manager.submit(
        "cvm-2",
        vec![CaptureItem::FileCapture {
            remote_path: "/var/log/missing".to_string(),
        }],
        Vec::new(),
    );

    let job = wait_for_terminal(&manager, &id).await;
    assert_eq!(job.state, JobState::Completed);
}

#[tokio::test]
async fn subscribers_observe_monotonic_stage_progress() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(FakeExecutor::new());
    executor.script_file("cvm-3", "/var/log/messages", b"hello".to_vec());

    let manager = JobManager::new(executor, paths(&dir));
    let id = manager.submit(
        "cvm-3",
        vec![CaptureItem::FileCapture {
            remote_path: "/var/log/messages".to_string(),
        }],
        Vec::new(),
    );
    let mut rx = manager.subscribe(&id).expect("job should exist immediately after submit");

    let mut last = ProgressDescriptor::new(Stage::Logfiles, 0, 0, "pending");
    loop {
        let update = rx.recv().await.expect("progress channel closed unexpectedly");
        assert!(last.validate_transition(&update.progress).is_ok());
        last = update.progress.clone();
        if last.stage == Stage::Done {
            break;
        }
    }
}

#[tokio::test]
async fn get_on_unknown_job_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(FakeExecutor::new());
    let manager = JobManager::new(executor, paths(&dir));
    let err = manager.get(&JobId::generate());
    assert!(matches!(err, Err(JobError::NotFound(_))));
}
