// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Optional ownership normalization: if `HOST_UID`/`HOST_GID` are set,
//! `chown` every produced file so files created inside a container are
//! owned by the host user that will later read them. Failure is logged
//! and otherwise ignored.

use std::path::Path;

use tokio::process::Command;
use tracing::warn;

/// Reads `HOST_UID`/`HOST_GID` from the environment. Returns `None` if
/// either is unset or non-numeric, in which case normalization is skipped
/// entirely.
fn host_owner() -> Option<(String, String)> {
    parse_host_owner(std::env::var("HOST_UID").ok(), std::env::var("HOST_GID").ok())
}

/// Pure core of [`host_owner`], split out so the numeric-validation rule
/// can be tested without touching process environment state.
fn parse_host_owner(uid: Option<String>, gid: Option<String>) -> Option<(String, String)> {
    let uid = uid?;
    let gid = gid?;
    if uid.parse::<u32>().is_ok() && gid.parse::<u32>().is_ok() {
        Some((uid, gid))
    } else {
        None
    }
}

/// Chown `paths` to `HOST_UID:HOST_GID` if configured. Recurses (`-R`) so
/// that a directory path also re-owns every produced file inside it, per
/// the component design's "every produced file, the directory, and the
/// archive" requirement — harmless when `path` names a plain file (the
/// archive), where `-R` behaves the same as a non-recursive chown. Never
/// returns an error: a failed chown is logged and the job proceeds to
/// finalize regardless, per the component design's "non-fatal" contract.
pub async fn normalize(paths: &[&Path]) {
    let Some((uid, gid)) = host_owner() else {
        return;
    };

    for path in paths {
        let status = Command::new("chown")
            .arg("-R")
            .arg(format!("{uid}:{gid}"))
            .arg(path)
            .status()
            .await;

        match status {
            Ok(status) if status.success() => {}
            Ok(status) => warn!(path = %path.display(), %status, "chown exited non-zero"),
            Err(e) => warn!(path = %path.display(), error = %e, "chown failed to spawn"),
        }
    }
}
