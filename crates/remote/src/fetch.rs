// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tri-tier fetch fallback: SFTP get -> `scp` subprocess -> `ssh ... cat`.
//!
//! Each tier's failure is captured and folded into the final error if all
//! three fail; the first success short-circuits the rest.

use std::path::Path;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::RemoteError;
use crate::executor::{ChannelId, RemoteExecutor};

/// SCP subprocess timeout, per the component design.
const SCP_TIMEOUT: Duration = Duration::from_secs(60);

/// Fetch `remote_path` on the host behind `channel` into `local_path`,
/// trying SFTP, then `scp`, then `ssh ... cat`, in that order.
pub async fn fetch<E: RemoteExecutor + ?Sized>(
    executor: &E,
    channel: &ChannelId,
    remote_path: &str,
    local_path: &Path,
) -> Result<(), RemoteError> {
    let mut attempts = Vec::with_capacity(3);

    match executor.sftp_get(channel, remote_path, local_path).await {
        Ok(()) => return Ok(()),
        Err(e) => {
            debug!(remote_path, error = %e, "sftp fetch failed, falling back to scp");
            attempts.push(format!("sftp: {e}"));
        }
    }

    match fetch_via_scp(executor, channel, remote_path, local_path).await {
        Ok(()) => return Ok(()),
        Err(e) => {
            debug!(remote_path, error = %e, "scp fetch failed, falling back to ssh cat");
            attempts.push(format!("scp: {e}"));
        }
    }

    match fetch_via_ssh_cat(executor, channel, remote_path, local_path).await {
        Ok(()) => return Ok(()),
        Err(e) => {
            warn!(remote_path, error = %e, "all fetch tiers exhausted");
            attempts.push(format!("ssh cat: {e}"));
        }
    }

    Err(RemoteError::FetchExhausted {
        remote_path: remote_path.to_string(),
        attempts: attempts.join("; "),
    })
}

async fn fetch_via_scp<E: RemoteExecutor + ?Sized>(
    executor: &E,
    channel: &ChannelId,
    remote_path: &str,
    local_path: &Path,
) -> Result<(), RemoteError> {
    let host = executor
        .host_of(channel)
        .ok_or_else(|| RemoteError::UnknownChannel(channel.to_string()))?;
    let key_path = executor.key_path().to_path_buf();
    let user = executor.remote_user().to_string();

    let mut cmd = Command::new("scp");
    cmd.arg("-O")
        .arg("-o")
        .arg("StrictHostKeyChecking=no")
        .arg("-i")
        .arg(&key_path)
        .arg(format!("{user}@{host}:{remote_path}"))
        .arg(local_path);

    let output = timeout(SCP_TIMEOUT, cmd.output())
        .await
        .map_err(|_| RemoteError::Timeout {
            host: host.clone(),
            seconds: SCP_TIMEOUT.as_secs(),
        })??;

    if output.status.success() {
        Ok(())
    } else {
        Err(RemoteError::Channel(format!(
            "scp exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        )))
    }
}

async fn fetch_via_ssh_cat<E: RemoteExecutor + ?Sized>(
    executor: &E,
    channel: &ChannelId,
    remote_path: &str,
    local_path: &Path,
) -> Result<(), RemoteError> {
    let output = executor.exec(channel, &format!("cat {remote_path}")).await?;
    let mut lines = output.lines;
    let mut contents = String::new();
    while let Some(line) = lines.next_line().await {
        contents.push_str(&line);
        contents.push('\n');
    }
    tokio::fs::write(local_path, contents).await?;
    Ok(())
}
