// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote Executor (C1): the SSH port every other component programs
//! against. Channels are referenced by an opaque [`ChannelId`] rather than
//! a borrowed handle so the trait stays object-safe and testable.

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::error::RemoteError;

/// Handle to one open SSH channel. Opaque to callers; only the concrete
/// executor implementation knows how to map it back to a live connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A line-oriented, lazily-produced sequence of remote stdout lines.
/// Finite for a one-shot `exec`, infinite (until cancelled or the remote
/// closes) for a `tail -f` stream.
pub struct LineStream(pub mpsc::Receiver<String>);

impl LineStream {
    pub async fn next_line(&mut self) -> Option<String> {
        self.0.recv().await
    }
}

/// Result of a one-shot `exec`: the stdout line stream plus a future exit
/// code, resolved once the remote command terminates.
pub struct ExecOutput {
    pub lines: LineStream,
    pub exit_code: oneshot::Receiver<i32>,
}

/// Port over an authenticated SSH session to one CVM.
///
/// Implementations must be cheaply cloneable (an `Arc`-wrapped connection
/// pool or similar) since jobs and stream sessions hold their own clone for
/// the lifetime of one channel.
#[async_trait]
pub trait RemoteExecutor: Send + Sync + 'static {
    /// Open an authenticated channel to `host`. Applies a 10-second connect
    /// timeout and accepts unknown host keys — this is an operator tool
    /// against a controlled fleet, not a hardened client.
    async fn connect(&self, host: &str) -> Result<ChannelId, RemoteError>;

    /// Run `command` to completion, returning a line stream and the exit
    /// code once available.
    async fn exec(&self, channel: &ChannelId, command: &str) -> Result<ExecOutput, RemoteError>;

    /// Run `command` (typically `tail -f <path>`) and stream its stdout
    /// indefinitely. Terminates only when the channel closes or the
    /// returned stream is dropped.
    async fn stream(&self, channel: &ChannelId, command: &str) -> Result<LineStream, RemoteError>;

    /// Fetch one remote file via SFTP. This is tier one of [`crate::fetch::fetch`];
    /// implementations that cannot support SFTP should return
    /// [`RemoteError::Channel`] so the caller falls through to the next tier.
    async fn sftp_get(
        &self,
        channel: &ChannelId,
        remote_path: &str,
        local_path: &Path,
    ) -> Result<(), RemoteError>;

    /// Release a channel. Idempotent.
    async fn close(&self, channel: &ChannelId);

    /// The host a channel is connected to, used to build `scp`/`ssh`
    /// subprocess argv for fetch tiers two and three.
    fn host_of(&self, channel: &ChannelId) -> Option<String>;

    /// Path to the preconfigured private key, used for subprocess-based
    /// fetch tiers.
    fn key_path(&self) -> &Path;

    /// Remote SSH user, e.g. `nutanix`.
    fn remote_user(&self) -> &str;
}
