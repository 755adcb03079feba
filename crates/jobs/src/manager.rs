// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collection Job Manager (C4): spawns and tracks background bulk
//! collection jobs against one CVM, driving the progress state machine
//! and packaging results into a flat zip archive.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use loghoi_core::capture::CaptureItem;
use loghoi_core::id::JobId;
use loghoi_core::job::CollectionJob;
use loghoi_core::progress::{ProgressDescriptor, Stage};
use loghoi_remote::{fetch, ChannelId, RemoteExecutor};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::archive::build_archive;
use crate::error::JobError;
use crate::ownership;

/// Directory layout a [`JobManager`] writes into, mirroring the original
/// service's `output/log` and `output/zip` split.
#[derive(Debug, Clone)]
pub struct JobPaths {
    pub log_dir: PathBuf,
    pub zip_dir: PathBuf,
}

/// A sink for "a job just completed" notifications, so a job completion
/// can invalidate whatever read-side cache fronts the archived bundles it
/// just produced. §4.6: "on job completion, invalidate all keys matching
/// `^col:`"; §5: "the new archive is visible, because completion
/// invalidates the cache before returning Completed." `loghoi-jobs` has
/// no dependency on `loghoi-query` (and shouldn't grow one just for this),
/// so the composition root supplies an implementation that bridges to
/// `QueryService::invalidate_collection_cache`.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate(&self);
}

/// Broadcast progress update, fanned out to every subscriber of a job
/// (typically one HTTP/WebSocket connection per operator watching it).
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub job_id: JobId,
    pub progress: ProgressDescriptor,
}

struct JobEntry {
    job: CollectionJob,
    progress_tx: broadcast::Sender<ProgressUpdate>,
}

/// Tracks every [`CollectionJob`] submitted since process start. Jobs for
/// distinct CVMs run concurrently; nothing prevents two jobs targeting the
/// same CVM (operator discretion per the component design).
#[derive(Clone)]
pub struct JobManager<E: RemoteExecutor> {
    jobs: Arc<Mutex<HashMap<JobId, JobEntry>>>,
    executor: Arc<E>,
    paths: JobPaths,
    cache_invalidator: Option<Arc<dyn CacheInvalidator>>,
}

impl<E: RemoteExecutor> JobManager<E> {
    pub fn new(executor: Arc<E>, paths: JobPaths) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
            executor,
            paths,
            cache_invalidator: None,
        }
    }

    /// Attach a cache-invalidation sink, invoked once per job right before
    /// that job transitions to `Completed` (see [`CacheInvalidator`]).
    #[must_use]
    pub fn with_cache_invalidator(mut self, invalidator: Arc<dyn CacheInvalidator>) -> Self {
        self.cache_invalidator = Some(invalidator);
        self
    }

    /// Snapshot of a job's current record, or [`JobError::NotFound`].
    pub fn get(&self, id: &JobId) -> Result<CollectionJob, JobError> {
        self.jobs
            .lock()
            .get(id)
            .map(|entry| entry.job.clone())
            .ok_or_else(|| JobError::NotFound(id.clone()))
    }

    /// Subscribe to progress updates for `id`. Returns `None` if the job
    /// is unknown.
    pub fn subscribe(&self, id: &JobId) -> Option<broadcast::Receiver<ProgressUpdate>> {
        self.jobs.lock().get(id).map(|entry| entry.progress_tx.subscribe())
    }

    /// Start a new background collection run against `target_cvm`,
    /// returning the freshly generated [`JobId`] immediately; the
    /// algorithm runs on a spawned task.
    pub fn submit(
        &self,
        target_cvm: impl Into<String>,
        file_items: Vec<CaptureItem>,
        command_items: Vec<CaptureItem>,
    ) -> JobId {
        let target_cvm = target_cvm.into();
        let id = JobId::generate();
        let now = Utc::now();
        let folder_name = now.format("loghoi_%Y%m%d_%H%M%S").to_string();

        let (progress_tx, _rx) = broadcast::channel(256);
        let job = CollectionJob::new(id.clone(), target_cvm.clone(), folder_name.clone(), now);

        self.jobs.lock().insert(
            id.clone(),
            JobEntry {
                job,
                progress_tx: progress_tx.clone(),
            },
        );

        let manager = self.clone();
        let job_id = id.clone();
        tokio::spawn(async move {
            manager
                .run(job_id, target_cvm, folder_name, file_items, command_items, progress_tx)
                .await;
        });

        id
    }

    fn emit(&self, id: &JobId, tx: &broadcast::Sender<ProgressUpdate>, progress: ProgressDescriptor) {
        if let Some(entry) = self.jobs.lock().get_mut(id) {
            entry.job.progress = progress.clone();
        }
        let _ = tx.send(ProgressUpdate {
            job_id: id.clone(),
            progress,
        });
    }

    async fn run(
        &self,
        id: JobId,
        target_cvm: String,
        folder_name: String,
        file_items: Vec<CaptureItem>,
        command_items: Vec<CaptureItem>,
        progress_tx: broadcast::Sender<ProgressUpdate>,
    ) {
        let log_dir = self.paths.log_dir.join(&folder_name);
        if let Err(e) = std::fs::create_dir_all(&log_dir) {
            self.fail(&id, format!("failed to create output directory: {e}"));
            return;
        }

        {
            let mut jobs = self.jobs.lock();
            if let Some(entry) = jobs.get_mut(&id) {
                if entry.job.start(Utc::now()).is_err() {
                    error!(job_id = %id, "job already started, ignoring duplicate run");
                    return;
                }
            }
        }
        info!(job_id = %id, target_cvm, "collection job started");

        let channel = match self.executor.connect(&target_cvm).await {
            Ok(channel) => channel,
            Err(e) => {
                self.fail(&id, format!("ssh connect failed: {e}"));
                return;
            }
        };

        self.emit(
            &id,
            &progress_tx,
            ProgressDescriptor::new(Stage::Logfiles, 0, file_items.len() as u64, "downloading logfiles"),
        );
        self.fetch_stage(&id, &channel, &log_dir, &file_items, &progress_tx).await;

        self.emit(
            &id,
            &progress_tx,
            ProgressDescriptor::new(Stage::Commands, 0, command_items.len() as u64, "running commands"),
        );
        self.command_stage(&id, &channel, &log_dir, &command_items, &progress_tx).await;

        self.emit(&id, &progress_tx, ProgressDescriptor::new(Stage::Zip, 0, 100, "archiving"));
        let (zip_dir, archive_log_dir, archive_folder_name) =
            (self.paths.zip_dir.clone(), log_dir.clone(), folder_name.clone());
        let archive_result = tokio::task::spawn_blocking(move || {
            build_archive(&archive_log_dir, &zip_dir, &archive_folder_name)
        })
        .await;
        let archive_path = match archive_result {
            Ok(Ok(path)) => path,
            Ok(Err(e)) => {
                self.executor.close(&channel).await;
                self.fail(&id, format!("archive creation failed: {e}"));
                return;
            }
            Err(e) => {
                self.executor.close(&channel).await;
                self.fail(&id, format!("archive task panicked: {e}"));
                return;
            }
        };
        self.emit(&id, &progress_tx, ProgressDescriptor::new(Stage::Zip, 100, 100, "archive complete"));

        ownership::normalize(&[log_dir.as_path(), archive_path.as_path()]).await;

        self.executor.close(&channel).await;

        // Invalidate before marking the job Completed, per §5: a caller
        // that observes Completed must see the new archive in the next
        // listing call, not a stale cached one.
        if let Some(invalidator) = &self.cache_invalidator {
            invalidator.invalidate();
        }

        {
            let mut jobs = self.jobs.lock();
            if let Some(entry) = jobs.get_mut(&id) {
                if let Err(e) = entry.job.complete(archive_path, Utc::now()) {
                    error!(job_id = %id, error = %e, "failed to mark job completed");
                }
            }
        }
        self.emit(&id, &progress_tx, ProgressDescriptor::new(Stage::Done, 0, 0, "done"));
        info!(job_id = %id, "collection job completed");
    }

    async fn fetch_stage(
        &self,
        id: &JobId,
        channel: &ChannelId,
        log_dir: &Path,
        items: &[CaptureItem],
        progress_tx: &broadcast::Sender<ProgressUpdate>,
    ) {
        let mut current = 0u64;
        let total = items.len() as u64;
        for item in items {
            let CaptureItem::FileCapture { remote_path } = item else {
                continue;
            };
            let file_name = Path::new(remote_path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| remote_path.replace('/', "_"));
            let local_path = log_dir.join(&file_name);

            match fetch(self.executor.as_ref(), channel, remote_path, &local_path).await {
                Ok(()) => {
                    current += 1;
                }
                Err(e) => {
                    warn!(job_id = %id, remote_path, error = %e, "fetch failed, continuing");
                }
            }
            self.emit(
                id,
                progress_tx,
                ProgressDescriptor::new(Stage::Logfiles, current, total, remote_path.clone()),
            );
        }
    }

    async fn command_stage(
        &self,
        id: &JobId,
        channel: &ChannelId,
        log_dir: &Path,
        items: &[CaptureItem],
        progress_tx: &broadcast::Sender<ProgressUpdate>,
    ) {
        let mut current = 0u64;
        let total = items.len() as u64;
        for item in items {
            let CaptureItem::CommandCapture { name, command } = item else {
                continue;
            };

            match self.executor.exec(channel, command).await {
                Ok(mut output) => {
                    let mut contents = String::new();
                    while let Some(line) = output.lines.next_line().await {
                        contents.push_str(&line);
                        contents.push('\n');
                    }
                    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
                    let file_name = format!("{name}_{timestamp}.txt");
                    if let Err(e) = std::fs::write(log_dir.join(&file_name), contents.trim_end()) {
                        warn!(job_id = %id, name, error = %e, "failed to write command output");
                    }
                }
                Err(e) => {
                    warn!(job_id = %id, name, error = %e, "command execution failed, continuing");
                }
            }

            current += 1;
            self.emit(
                id,
                progress_tx,
                ProgressDescriptor::new(Stage::Commands, current, total, name.clone()),
            );
        }
    }

    fn fail(&self, id: &JobId, message: String) {
        error!(job_id = %id, message, "collection job failed");
        let mut jobs = self.jobs.lock();
        if let Some(entry) = jobs.get_mut(id) {
            let _ = entry.job.fail(message, Utc::now());
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
