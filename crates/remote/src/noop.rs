// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op [`RemoteExecutor`] for deployments with remote collection disabled.

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::error::RemoteError;
use crate::executor::{ChannelId, ExecOutput, LineStream, RemoteExecutor};

/// Executor that never talks to a real host. Every `exec`/`stream` returns
/// an immediately-empty stream; `connect` always succeeds.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopExecutor;

impl NoopExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RemoteExecutor for NoopExecutor {
    async fn connect(&self, _host: &str) -> Result<ChannelId, RemoteError> {
        Ok(ChannelId::new("noop"))
    }

    async fn exec(&self, _channel: &ChannelId, _command: &str) -> Result<ExecOutput, RemoteError> {
        let (tx, rx) = mpsc::channel(1);
        let (exit_tx, exit_rx) = oneshot::channel();
        drop(tx);
        let _ = exit_tx.send(0);
        Ok(ExecOutput {
            lines: LineStream(rx),
            exit_code: exit_rx,
        })
    }

    async fn stream(&self, _channel: &ChannelId, _command: &str) -> Result<LineStream, RemoteError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(LineStream(rx))
    }

    async fn sftp_get(
        &self,
        _channel: &ChannelId,
        remote_path: &str,
        _local_path: &Path,
    ) -> Result<(), RemoteError> {
        Err(RemoteError::Channel(format!(
            "remote collection disabled, cannot fetch {remote_path}"
        )))
    }

    async fn close(&self, _channel: &ChannelId) {}

    fn host_of(&self, _channel: &ChannelId) -> Option<String> {
        None
    }

    fn key_path(&self) -> &Path {
        Path::new("")
    }

    fn remote_user(&self) -> &str {
        ""
    }
}
