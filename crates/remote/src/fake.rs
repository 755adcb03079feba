// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake [`RemoteExecutor`] for testing: records every call and lets tests
//! script canned stdout/exit codes per channel without touching a network.
#![cfg_attr(coverage_nightly, coverage(off))]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use crate::error::RemoteError;
use crate::executor::{ChannelId, ExecOutput, LineStream, RemoteExecutor};

/// Recorded executor call, inspectable via [`FakeExecutor::calls`].
#[derive(Debug, Clone)]
pub enum ExecutorCall {
    Connect { host: String },
    Exec { channel: String, command: String },
    Stream { channel: String, command: String },
    SftpGet { channel: String, remote_path: String },
    Close { channel: String },
}

#[derive(Debug, Clone, Default)]
struct FakeChannel {
    host: String,
    exec_lines: HashMap<String, Vec<String>>,
    exit_code: i32,
    sftp_contents: HashMap<String, Vec<u8>>,
    sftp_fails: bool,
    auth_fails: bool,
}

struct FakeState {
    channels: HashMap<ChannelId, FakeChannel>,
    calls: Vec<ExecutorCall>,
    next_id: u64,
}

/// In-memory stand-in for [`crate::ssh::SshExecutor`].
#[derive(Clone)]
pub struct FakeExecutor {
    inner: Arc<Mutex<FakeState>>,
    key_path: PathBuf,
    remote_user: String,
}

impl Default for FakeExecutor {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                channels: HashMap::new(),
                calls: Vec::new(),
                next_id: 0,
            })),
            key_path: PathBuf::from("/fake/key"),
            remote_user: "nutanix".to_string(),
        }
    }
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ExecutorCall> {
        self.inner.lock().calls.clone()
    }

    /// Script the line output and exit code that `exec`/`stream` will
    /// produce for `command` on a channel connected to `host`, once
    /// connected. Looked up by host rather than channel id since tests
    /// script before `connect` is called.
    pub fn script_command(&self, host: &str, command: &str, lines: Vec<String>, exit_code: i32) {
        let mut inner = self.inner.lock();
        let entry = inner
            .channels
            .entry(ChannelId::new(format!("pending:{host}")))
            .or_insert_with(|| FakeChannel {
                host: host.to_string(),
                ..Default::default()
            });
        entry.exec_lines.insert(command.to_string(), lines);
        entry.exit_code = exit_code;
    }

    /// Script the bytes `sftp_get` will return for `remote_path` on `host`.
    pub fn script_file(&self, host: &str, remote_path: &str, contents: impl Into<Vec<u8>>) {
        let mut inner = self.inner.lock();
        let entry = inner
            .channels
            .entry(ChannelId::new(format!("pending:{host}")))
            .or_insert_with(|| FakeChannel {
                host: host.to_string(),
                ..Default::default()
            });
        entry
            .sftp_contents
            .insert(remote_path.to_string(), contents.into());
    }

    /// Force `sftp_get` to fail for `host`, forcing callers down to the
    /// scp/ssh-cat fallback tiers.
    pub fn fail_sftp(&self, host: &str) {
        let mut inner = self.inner.lock();
        let entry = inner
            .channels
            .entry(ChannelId::new(format!("pending:{host}")))
            .or_insert_with(|| FakeChannel {
                host: host.to_string(),
                ..Default::default()
            });
        entry.sftp_fails = true;
    }

    /// Force `connect` to fail for `host` with [`RemoteError::auth_hint`].
    pub fn fail_auth(&self, host: &str) {
        let mut inner = self.inner.lock();
        let entry = inner
            .channels
            .entry(ChannelId::new(format!("pending:{host}")))
            .or_insert_with(|| FakeChannel {
                host: host.to_string(),
                ..Default::default()
            });
        entry.auth_fails = true;
    }
}

#[async_trait]
impl RemoteExecutor for FakeExecutor {
    async fn connect(&self, host: &str) -> Result<ChannelId, RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ExecutorCall::Connect {
            host: host.to_string(),
        });

        let pending_key = ChannelId::new(format!("pending:{host}"));
        let mut channel = inner.channels.remove(&pending_key).unwrap_or_default();
        channel.host = host.to_string();

        if channel.auth_fails {
            return Err(RemoteError::auth_hint(host));
        }

        inner.next_id += 1;
        let id = ChannelId::new(format!("fake-{}", inner.next_id));
        inner.channels.insert(id.clone(), channel);
        Ok(id)
    }

    async fn exec(&self, channel: &ChannelId, command: &str) -> Result<ExecOutput, RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ExecutorCall::Exec {
            channel: channel.to_string(),
            command: command.to_string(),
        });

        let entry = inner
            .channels
            .get(channel)
            .ok_or_else(|| RemoteError::UnknownChannel(channel.to_string()))?;
        let lines = entry.exec_lines.get(command).cloned().unwrap_or_default();
        let exit_code = entry.exit_code;
        drop(inner);

        let (tx, rx) = mpsc::channel(lines.len().max(1));
        let (exit_tx, exit_rx) = oneshot::channel();
        for line in lines {
            let _ = tx.send(line).await;
        }
        let _ = exit_tx.send(exit_code);

        Ok(ExecOutput {
            lines: LineStream(rx),
            exit_code: exit_rx,
        })
    }

    async fn stream(&self, channel: &ChannelId, command: &str) -> Result<LineStream, RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ExecutorCall::Stream {
            channel: channel.to_string(),
            command: command.to_string(),
        });

        let entry = inner
            .channels
            .get(channel)
            .ok_or_else(|| RemoteError::UnknownChannel(channel.to_string()))?;
        let lines = entry.exec_lines.get(command).cloned().unwrap_or_default();
        drop(inner);

        let (tx, rx) = mpsc::channel(lines.len().max(1));
        for line in lines {
            let _ = tx.send(line).await;
        }
        Ok(LineStream(rx))
    }

    async fn sftp_get(
        &self,
        channel: &ChannelId,
        remote_path: &str,
        local_path: &Path,
    ) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ExecutorCall::SftpGet {
            channel: channel.to_string(),
            remote_path: remote_path.to_string(),
        });

        let entry = inner
            .channels
            .get(channel)
            .ok_or_else(|| RemoteError::UnknownChannel(channel.to_string()))?;
        if entry.sftp_fails {
            return Err(RemoteError::Channel("sftp disabled by test".to_string()));
        }
        let contents = entry
            .sftp_contents
            .get(remote_path)
            .cloned()
            .ok_or_else(|| RemoteError::Channel(format!("no such remote file: {remote_path}")))?;
        drop(inner);

        tokio::fs::write(local_path, contents).await?;
        Ok(())
    }

    async fn close(&self, channel: &ChannelId) {
        let mut inner = self.inner.lock();
        inner.calls.push(ExecutorCall::Close {
            channel: channel.to_string(),
        });
        inner.channels.remove(channel);
    }

    fn host_of(&self, channel: &ChannelId) -> Option<String> {
        self.inner.lock().channels.get(channel).map(|c| c.host.clone())
    }

    fn key_path(&self) -> &Path {
        &self.key_path
    }

    fn remote_user(&self) -> &str {
        &self.remote_user
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
