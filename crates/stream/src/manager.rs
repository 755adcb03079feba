// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stream Session Manager (C5): owns the lifecycle of a session's SSH
//! channel and live `tail -f` monitor, per-session serialized so
//! overlapping start/stop requests from the same session are declined
//! rather than queued.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use loghoi_core::id::SessionId;
use loghoi_core::session::{SessionState, SessionTimestamps};
use loghoi_remote::{ChannelId, LineStream, RemoteExecutor};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::error::SessionError;
use crate::rate_limit::TokenBucket;
use crate::record::StreamRecord;

struct MonitorHandle {
    cancel: oneshot::Sender<()>,
}

struct SessionInner {
    state: SessionState,
    timestamps: SessionTimestamps,
    host: Option<String>,
    ssh_channel: Option<ChannelId>,
    monitor: Option<MonitorHandle>,
    /// Once a monitor has run, the idle timer is permanently suspended for
    /// this session (spec.md §4.5: "a session that ran a stream is kept
    /// until explicit disconnect") — ending the monitor does not re-arm it.
    ever_streamed: bool,
}

struct SessionEntry {
    /// Serializes `add_ssh`/`start_monitor`/`stop_all` for one session. A
    /// caller that finds this already held is declined, not queued.
    guard: tokio::sync::Mutex<()>,
    inner: Mutex<SessionInner>,
}

/// Tracks every live operator session: its SSH channel, its monitor task
/// if one is running, and its idle watcher.
#[derive(Clone)]
pub struct SessionManager<E: RemoteExecutor> {
    executor: Arc<E>,
    sessions: Arc<Mutex<HashMap<SessionId, Arc<SessionEntry>>>>,
    idle_timeout: Duration,
    rate_limit_capacity: u32,
}

impl<E: RemoteExecutor> SessionManager<E> {
    pub fn new(executor: Arc<E>, idle_timeout: Duration, rate_limit_capacity: u32) -> Self {
        Self {
            executor,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            idle_timeout,
            rate_limit_capacity,
        }
    }

    /// Create a session in `Connected`, record `connected_at`, and start
    /// its idle watcher.
    pub fn on_connect(&self) -> SessionId {
        let id = SessionId::generate();
        let now = Instant::now();
        let entry = Arc::new(SessionEntry {
            guard: tokio::sync::Mutex::new(()),
            inner: Mutex::new(SessionInner {
                state: SessionState::Connected,
                timestamps: SessionTimestamps::new(now),
                host: None,
                ssh_channel: None,
                monitor: None,
                ever_streamed: false,
            }),
        });
        self.sessions.lock().insert(id.clone(), entry);
        self.spawn_idle_watcher(id.clone());
        id
    }

    pub fn state(&self, id: &SessionId) -> Result<SessionState, SessionError> {
        Ok(self.get_entry(id)?.inner.lock().state)
    }

    pub fn heartbeat(&self, id: &SessionId) -> Result<(), SessionError> {
        self.get_entry(id)?.inner.lock().timestamps.touch(Instant::now());
        Ok(())
    }

    /// Idempotent: tearing down a session that is already gone is a no-op.
    pub async fn on_disconnect(&self, id: &SessionId) -> Result<(), SessionError> {
        self.stop_all(id).await
    }

    fn get_entry(&self, id: &SessionId) -> Result<Arc<SessionEntry>, SessionError> {
        self.sessions
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.clone()))
    }

    fn lock_guard<'a>(
        &self,
        id: &SessionId,
        entry: &'a SessionEntry,
    ) -> Result<tokio::sync::MutexGuard<'a, ()>, SessionError> {
        entry
            .guard
            .try_lock()
            .map_err(|_| SessionError::OperationInProgress(id.clone()))
    }

    /// Attach (or re-attach) an SSH channel to `id`. If a channel is
    /// already attached it is released first. Retries up to 5 times with
    /// linear backoff (`2 * attempt` seconds) before giving up.
    pub async fn add_ssh(&self, id: &SessionId, host: impl Into<String>) -> Result<(), SessionError> {
        let host = host.into();
        let entry = self.get_entry(id)?;
        let _guard = self.lock_guard(id, &entry)?;

        let existing = entry.inner.lock().ssh_channel.take();
        if let Some(channel) = existing {
            self.executor.close(&channel).await;
        }

        let mut last_err = None;
        let mut attached = None;
        for attempt in 1..=5u32 {
            match self.executor.connect(&host).await {
                Ok(channel) => {
                    attached = Some(channel);
                    break;
                }
                Err(e) => {
                    warn!(session_id = %id, host, attempt, error = %e, "ssh attach attempt failed");
                    last_err = Some(e);
                    if attempt < 5 {
                        tokio::time::sleep(Duration::from_secs(2 * attempt as u64)).await;
                    }
                }
            }
        }

        #[allow(clippy::expect_used)]
        let Some(channel) = attached else {
            return Err(SessionError::SshAttachFailed {
                host,
                source: last_err.expect("loop always records the last error on exhaustion"),
            });
        };

        let mut inner = entry.inner.lock();
        let next = inner.state.on_ssh_attached().map_err(|_| SessionError::IllegalState {
            operation: "add_ssh",
            session: id.clone(),
        })?;
        inner.state = next;
        inner.host = Some(host);
        inner.ssh_channel = Some(channel);
        Ok(())
    }

    /// Start a live `tail -f <path>` monitor over a fresh dedicated SSH
    /// channel, pushing [`StreamRecord`]s to `sink` until cancellation,
    /// sink closure, or upstream EOF.
    pub async fn start_monitor(
        &self,
        id: &SessionId,
        path: impl Into<String>,
        label: impl Into<String>,
        sink: mpsc::Sender<StreamRecord>,
    ) -> Result<(), SessionError> {
        let path = path.into();
        let label = label.into();
        let entry = self.get_entry(id)?;
        let _guard = self.lock_guard(id, &entry)?;

        let host = {
            let inner = entry.inner.lock();
            if inner.monitor.is_some() {
                return Err(SessionError::MonitorAlreadyRunning(id.clone()));
            }
            if inner.state != SessionState::SshReady {
                return Err(SessionError::NoSshChannel(id.clone()));
            }
            inner.host.clone().ok_or_else(|| SessionError::NoSshChannel(id.clone()))?
        };

        let channel = self
            .executor
            .connect(&host)
            .await
            .map_err(|e| SessionError::SshAttachFailed { host: host.clone(), source: e })?;
        let lines = match self.executor.stream(&channel, &format!("tail -f {path}")).await {
            Ok(lines) => lines,
            Err(e) => {
                self.executor.close(&channel).await;
                return Err(SessionError::SshAttachFailed { host, source: e });
            }
        };

        let (cancel_tx, cancel_rx) = oneshot::channel();
        {
            let mut inner = entry.inner.lock();
            let next = inner.state.on_monitor_started().map_err(|_| SessionError::IllegalState {
                operation: "start_monitor",
                session: id.clone(),
            })?;
            inner.state = next;
            inner.monitor = Some(MonitorHandle { cancel: cancel_tx });
            inner.ever_streamed = true;
        }

        let manager = self.clone();
        let session_id = id.clone();
        tokio::spawn(async move {
            manager.run_monitor(session_id, channel, lines, label, sink, cancel_rx).await;
        });

        Ok(())
    }

    async fn run_monitor(
        self,
        id: SessionId,
        channel: ChannelId,
        mut lines: LineStream,
        label: String,
        sink: mpsc::Sender<StreamRecord>,
        mut cancel_rx: oneshot::Receiver<()>,
    ) {
        let mut bucket = TokenBucket::new(self.rate_limit_capacity, Instant::now());
        let mut sequence: u64 = 0;

        loop {
            tokio::select! {
                _ = &mut cancel_rx => {
                    break;
                }
                maybe_line = lines.next_line() => {
                    let Some(line) = maybe_line else {
                        break;
                    };
                    if bucket.try_take(Instant::now()) {
                        sequence += 1;
                        let record = StreamRecord {
                            label: label.clone(),
                            line,
                            sequence,
                            timestamp: Utc::now(),
                        };
                        if sink.send(record).await.is_err() {
                            break;
                        }
                    }
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }

        self.executor.close(&channel).await;
        if let Some(entry) = self.sessions.lock().get(&id).cloned() {
            let mut inner = entry.inner.lock();
            inner.monitor = None;
            if inner.state == SessionState::Streaming {
                inner.state = SessionState::SshReady;
            }
        }
        info!(session_id = %id, "monitor task ended");
    }

    /// Cancel any monitor, release the SSH channel, and remove the
    /// session. Idempotent: a missing session is a no-op success.
    pub async fn stop_all(&self, id: &SessionId) -> Result<(), SessionError> {
        let Some(entry) = self.sessions.lock().get(id).cloned() else {
            return Ok(());
        };
        let _guard = self.lock_guard(id, &entry)?;

        let (channel, cancel) = {
            let mut inner = entry.inner.lock();
            let channel = inner.ssh_channel.take();
            let cancel = inner.monitor.take().map(|m| m.cancel);
            inner.state = inner.state.on_torn_down();
            (channel, cancel)
        };

        if let Some(cancel) = cancel {
            let _ = cancel.send(());
        }
        if let Some(channel) = channel {
            self.executor.close(&channel).await;
        }

        self.sessions.lock().remove(id);
        Ok(())
    }

    fn spawn_idle_watcher(&self, id: SessionId) {
        let manager = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(1)).await;

                let Some(entry) = manager.sessions.lock().get(&id).cloned() else {
                    return;
                };
                let (idle_expired, has_monitor, ever_streamed) = {
                    let inner = entry.inner.lock();
                    (
                        inner.timestamps.is_idle_expired(Instant::now(), manager.idle_timeout),
                        inner.monitor.is_some(),
                        inner.ever_streamed,
                    )
                };
                if has_monitor {
                    continue;
                }
                // A session that has ever run a monitor is kept until
                // explicit disconnect: the idle timer never re-arms, so
                // stop watching entirely rather than re-checking forever.
                if ever_streamed {
                    return;
                }
                if idle_expired {
                    let _ = manager.stop_all(&id).await;
                    return;
                }
            }
        });
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
