// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production [`RemoteExecutor`] backed by `russh`.
//!
//! Connections are keyed by [`ChannelId`] in an internal registry so the
//! trait stays object-safe; each entry owns one `russh` channel plus the
//! session handle that keeps it alive.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client::{self, Handle};
use russh::ChannelMsg;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, warn};

use crate::error::RemoteError;
use crate::executor::{ChannelId, ExecOutput, LineStream, RemoteExecutor};

/// SSH connect timeout, per the component design.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

struct Entry {
    host: String,
    session: Arc<Handle<Client>>,
}

/// Accepts any host key — this is an operator tool against a controlled,
/// already-trusted fleet, not a hardened client talking to arbitrary hosts.
struct Client;

#[async_trait]
impl client::Handler for Client {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh::keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// Production executor: loads the preconfigured private key once at
/// construction and opens a fresh `russh` session per [`connect`].
pub struct SshExecutor {
    key_path: PathBuf,
    remote_user: String,
    channels: Mutex<HashMap<ChannelId, Entry>>,
    next_id: std::sync::atomic::AtomicU64,
}

impl SshExecutor {
    pub fn new(key_path: impl Into<PathBuf>, remote_user: impl Into<String>) -> Self {
        Self {
            key_path: key_path.into(),
            remote_user: remote_user.into(),
            channels: Mutex::new(HashMap::new()),
            next_id: std::sync::atomic::AtomicU64::new(1),
        }
    }

    fn fresh_id(&self) -> ChannelId {
        let n = self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        ChannelId::new(format!("ssh-{n}"))
    }

    async fn entry_for(&self, channel: &ChannelId) -> Result<Arc<Handle<Client>>, RemoteError> {
        let channels = self.channels.lock().await;
        channels
            .get(channel)
            .map(|e| Arc::clone(&e.session))
            .ok_or_else(|| RemoteError::UnknownChannel(channel.to_string()))
    }
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    async fn connect(&self, host: &str) -> Result<ChannelId, RemoteError> {
        let key_pair = russh::keys::load_secret_key(&self.key_path, None)
            .map_err(|e| RemoteError::Key(e.to_string()))?;

        let config = Arc::new(client::Config {
            inactivity_timeout: Some(CONNECT_TIMEOUT),
            ..Default::default()
        });

        let connect_fut = client::connect(config, (host, 22), Client);
        let mut session = tokio::time::timeout(CONNECT_TIMEOUT, connect_fut)
            .await
            .map_err(|_| RemoteError::Timeout {
                host: host.to_string(),
                seconds: CONNECT_TIMEOUT.as_secs(),
            })?
            .map_err(|e| RemoteError::Channel(e.to_string()))?;

        let authenticated = session
            .authenticate_publickey(
                &self.remote_user,
                russh::keys::PrivateKeyWithHashAlg::new(Arc::new(key_pair), None),
            )
            .await
            .map_err(|e| RemoteError::Channel(e.to_string()))?;

        if !authenticated.success() {
            return Err(RemoteError::auth_hint(host));
        }

        let id = self.fresh_id();
        self.channels.lock().await.insert(
            id.clone(),
            Entry {
                host: host.to_string(),
                session: Arc::new(session),
            },
        );
        Ok(id)
    }

    async fn exec(&self, channel: &ChannelId, command: &str) -> Result<ExecOutput, RemoteError> {
        let session = self.entry_for(channel).await?;
        let mut ch = session
            .channel_open_session()
            .await
            .map_err(|e| RemoteError::Channel(e.to_string()))?;
        ch.exec(true, command)
            .await
            .map_err(|e| RemoteError::Channel(e.to_string()))?;

        let (tx, rx) = mpsc::channel(256);
        let (exit_tx, exit_rx) = oneshot::channel();

        tokio::spawn(async move {
            let mut buf = Vec::new();
            let mut exit_status = 0i32;
            while let Some(msg) = ch.wait().await {
                match msg {
                    ChannelMsg::Data { data } => {
                        buf.extend_from_slice(&data);
                        while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                            let line = String::from_utf8_lossy(&buf[..pos]).to_string();
                            buf.drain(..=pos);
                            if tx.send(line).await.is_err() {
                                return;
                            }
                        }
                    }
                    ChannelMsg::ExitStatus { exit_status: code } => {
                        exit_status = code as i32;
                    }
                    ChannelMsg::Eof | ChannelMsg::Close => break,
                    _ => {}
                }
            }
            if !buf.is_empty() {
                let _ = tx.send(String::from_utf8_lossy(&buf).to_string()).await;
            }
            let _ = exit_tx.send(exit_status);
        });

        Ok(ExecOutput {
            lines: LineStream(rx),
            exit_code: exit_rx,
        })
    }

    async fn stream(&self, channel: &ChannelId, command: &str) -> Result<LineStream, RemoteError> {
        let session = self.entry_for(channel).await?;
        let mut ch = session
            .channel_open_session()
            .await
            .map_err(|e| RemoteError::Channel(e.to_string()))?;
        ch.exec(true, command)
            .await
            .map_err(|e| RemoteError::Channel(e.to_string()))?;

        let (tx, rx) = mpsc::channel(1024);
        tokio::spawn(async move {
            let mut buf = Vec::new();
            while let Some(msg) = ch.wait().await {
                match msg {
                    ChannelMsg::Data { data } => {
                        buf.extend_from_slice(&data);
                        while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                            let line = String::from_utf8_lossy(&buf[..pos]).to_string();
                            buf.drain(..=pos);
                            if tx.send(line).await.is_err() {
                                return;
                            }
                        }
                    }
                    ChannelMsg::Eof | ChannelMsg::Close => break,
                    _ => {}
                }
            }
        });

        Ok(LineStream(rx))
    }

    async fn sftp_get(
        &self,
        channel: &ChannelId,
        remote_path: &str,
        local_path: &Path,
    ) -> Result<(), RemoteError> {
        let session = self.entry_for(channel).await?;
        let ch = session
            .channel_open_session()
            .await
            .map_err(|e| RemoteError::Channel(e.to_string()))?;
        ch.request_subsystem(true, "sftp")
            .await
            .map_err(|e| RemoteError::Channel(e.to_string()))?;
        let sftp = russh_sftp::client::SftpSession::new(ch.into_stream())
            .await
            .map_err(|e| RemoteError::Channel(e.to_string()))?;

        let mut remote_file = sftp
            .open(remote_path)
            .await
            .map_err(|e| RemoteError::Channel(e.to_string()))?;
        let mut contents = Vec::new();
        use tokio::io::AsyncReadExt;
        remote_file
            .read_to_end(&mut contents)
            .await
            .map_err(RemoteError::Io)?;
        tokio::fs::write(local_path, contents).await?;
        debug!(remote_path, "sftp fetch succeeded");
        Ok(())
    }

    async fn close(&self, channel: &ChannelId) {
        let mut channels = self.channels.lock().await;
        if let Some(entry) = channels.remove(channel) {
            if let Err(e) = entry
                .session
                .disconnect(russh::Disconnect::ByApplication, "", "en")
                .await
            {
                warn!(host = %entry.host, error = %e, "error disconnecting ssh session");
            }
        }
    }

    fn host_of(&self, channel: &ChannelId) -> Option<String> {
        // `try_lock` keeps this synchronous per the trait signature; a
        // contended lock here just means the caller falls through to the
        // next fetch tier, which is an acceptable best-effort outcome.
        self.channels
            .try_lock()
            .ok()
            .and_then(|c| c.get(channel).map(|e| e.host.clone()))
    }

    fn key_path(&self) -> &Path {
        &self.key_path
    }

    fn remote_user(&self) -> &str {
        &self.remote_user
    }
}
