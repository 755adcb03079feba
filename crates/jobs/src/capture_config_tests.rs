// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use loghoi_core::capture::CaptureItem;

#[test]
fn loads_and_flattens_both_configs() {
    let dir = tempfile::tempdir().unwrap();
    let logfile_path = dir.path().join("col_logfile.json");
    let command_path = dir.path().join("col_command.json");

    std::fs::write(
        &logfile_path,
        r#"{"LOGFILE_LIST":[{"src_path":"/var/log/messages"},{"src_path":"/var/log/dmesg"}]}"#,
    )
    .unwrap();
    std::fs::write(
        &command_path,
        r#"{"COMMAND_LIST":[{"name":"uptime","command":"uptime"}]}"#,
    )
    .unwrap();

    let (files, commands) = load_capture_list(&logfile_path, &command_path).unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(commands.len(), 1);
    assert!(matches!(&files[0], CaptureItem::FileCapture { remote_path } if remote_path == "/var/log/messages"));
    assert!(matches!(&commands[0], CaptureItem::CommandCapture { name, .. } if name == "uptime"));
}

#[test]
fn missing_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_capture_list(&dir.path().join("missing.json"), &dir.path().join("missing2.json"));
    assert!(matches!(err, Err(JobError::CaptureListConfig(_))));
}
