// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query Service (C6): cache-fronted read operations layering [`TtlCache`]
//! over the [`IndexGateway`] and archived bundles on disk.

use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use loghoi_cache::TtlCache;
use loghoi_core::cluster::ClusterRecord;
use loghoi_core::syslog::{HostFilter, LogEntry};
use loghoi_core::time_fmt;
use loghoi_index::IndexGateway;
use loghoi_remote::RemoteExecutor;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::QueryError;

/// `list_zips`/`list_logs_in_zip` cache lifetime, per §4.6.
const LISTING_TTL: Duration = Duration::from_secs(10);

/// `get_log_content` paginated-mode total-line-count cache lifetime.
const TOTAL_LINES_TTL: Duration = Duration::from_secs(300);

/// Paginated-mode `page_size` clamp range, per §4.6.
const PAGE_SIZE_MIN: u64 = 100;
const PAGE_SIZE_MAX: u64 = 10_000;

/// Byte-range mode defaults, per §4.6.
const DEFAULT_RANGE_LENGTH: u64 = 10_000;

/// Prefix every cache key this service owns carries, so
/// `invalidate_collection_cache` can sweep them all with one regex.
const CACHE_PREFIX: &str = "col:";

/// Well-known local port `get_cvms` curls for Prism-leader resolution.
const PRISM_LEADER_COMMAND: &str = "curl -s localhost:2019/prism/leader";

/// Result of [`QueryService::get_cvms`]: the cluster record plus
/// best-effort leader resolution. `auth_hint` is populated rather than
/// the call failing outright — leader resolution never aborts the whole
/// operation (§4.6); the contract layer decides whether a present
/// `auth_hint` should surface as a 500 (§6 endpoint table, S2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvmList {
    pub cluster: ClusterRecord,
    pub leader: Option<String>,
    pub auth_hint: Option<String>,
}

/// Normalized `/api/sys/search` request, after datetimes have been parsed
/// from their wire form but before JST->UTC conversion.
#[derive(Debug, Clone)]
pub struct SyslogSearchRequest {
    pub keyword: String,
    pub start_datetime: String,
    pub end_datetime: String,
    pub cluster_name: Option<String>,
    pub hostnames: Vec<String>,
    pub block_serial: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZipListEntry {
    pub name: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ByteRangeContent {
    pub empty: bool,
    pub content: String,
    pub start: u64,
    pub length: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
    pub total_lines: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedContent {
    pub lines: Vec<String>,
    pub pagination: Pagination,
}

/// A request for `get_log_content`: either a byte-range read or a
/// paginated-line read (§4.6).
#[derive(Debug, Clone, Copy)]
pub enum ContentRequest {
    ByteRange { start: u64, length: u64 },
    Paginated { page: u64, page_size: u64 },
}

/// Wire shape for [`ContentRequest`]: every field optional so the
/// documented byte-range defaults (`start` default 0, `length` default
/// 10000, per §4.6) apply when a caller omits them. An untagged enum of
/// two all-required-field variants can't do this — it needs every field
/// of a variant present just to disambiguate which variant matched.
/// Presence of `page` is the discriminator: a body carrying `page` is a
/// paginated request, otherwise it's a byte-range request. `page_size`
/// has no documented default (§4.6 only states its clamp range), so an
/// omitted value defaults to the clamp floor.
impl<'de> Deserialize<'de> for ContentRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            start: Option<u64>,
            length: Option<u64>,
            page: Option<u64>,
            page_size: Option<u64>,
        }

        let raw = Raw::deserialize(deserializer)?;
        Ok(match raw.page {
            Some(page) => ContentRequest::Paginated {
                page,
                page_size: raw.page_size.unwrap_or(PAGE_SIZE_MIN),
            },
            None => ContentRequest::ByteRange {
                start: raw.start.unwrap_or(0),
                length: raw.length.unwrap_or(DEFAULT_RANGE_LENGTH),
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogContent {
    ByteRange(ByteRangeContent),
    Paginated(PaginatedContent),
}

/// Cache-fronted read layer (C6) over cluster metadata, syslog search,
/// and archived bundles.
pub struct QueryService<E: RemoteExecutor> {
    index: Arc<dyn IndexGateway>,
    cache: TtlCache,
    executor: Arc<E>,
    zip_dir: PathBuf,
}

impl<E: RemoteExecutor> QueryService<E> {
    pub fn new(index: Arc<dyn IndexGateway>, cache: TtlCache, executor: Arc<E>, zip_dir: PathBuf) -> Self {
        Self {
            index,
            cache,
            executor,
            zip_dir,
        }
    }

    /// Every cluster currently registered under `pc_ip`. Not cached: the
    /// component design states no cache by default for this operation.
    pub async fn get_cluster_list(&self, pc_ip: &str) -> Result<Vec<ClusterRecord>, QueryError> {
        Ok(self.index.list_clusters_by_pc(pc_ip).await?)
    }

    /// The cluster record for `cluster_name`, with best-effort Prism-leader
    /// resolution over SSH to the first CVM.
    pub async fn get_cvms(&self, cluster_name: &str) -> Result<CvmList, QueryError> {
        let cluster = self
            .index
            .latest_cluster(cluster_name)
            .await?
            .ok_or_else(|| QueryError::ClusterNotFound(cluster_name.to_string()))?;

        let Some(cvm_ip) = cluster.first_cvm_ip() else {
            return Ok(CvmList {
                cluster,
                leader: None,
                auth_hint: None,
            });
        };

        match self.resolve_leader(cvm_ip).await {
            Ok(leader) => Ok(CvmList {
                cluster,
                leader: Some(leader),
                auth_hint: None,
            }),
            Err(e) => {
                warn!(cluster_name, cvm_ip, error = %e, "prism-leader resolution failed");
                Ok(CvmList {
                    cluster,
                    leader: None,
                    auth_hint: Some(e.to_string()),
                })
            }
        }
    }

    async fn resolve_leader(&self, cvm_ip: &str) -> Result<String, QueryError> {
        let channel = self.executor.connect(cvm_ip).await?;
        let result = async {
            let mut output = self.executor.exec(&channel, PRISM_LEADER_COMMAND).await?;
            let mut lines = Vec::new();
            while let Some(line) = output.lines.next_line().await {
                lines.push(line);
            }
            Ok::<_, QueryError>(lines.join("\n").trim().to_string())
        }
        .await;
        self.executor.close(&channel).await;
        result
    }

    /// Syslog search, normalizing wire-form datetimes and resolving the
    /// host filter's precedence (`hostnames` -> `block_serial` ->
    /// `cluster_name`), looking up the cluster's registered block serial
    /// when only a cluster name was supplied.
    pub async fn search_syslog(&self, req: SyslogSearchRequest) -> Result<Vec<LogEntry>, QueryError> {
        if req.keyword.trim().is_empty() {
            return Err(QueryError::Validation("keyword must not be empty".to_string()));
        }

        let t_lo = self.normalize_operator_timestamp(&req.start_datetime)?;
        let t_hi = self.normalize_operator_timestamp(&req.end_datetime)?;

        let resolved_serial = if req.hostnames.is_empty() && req.block_serial.is_none() {
            match &req.cluster_name {
                Some(name) => self
                    .index
                    .latest_cluster(name)
                    .await?
                    .map(|c| c.block_serial),
                None => None,
            }
        } else {
            req.block_serial.clone()
        };

        let hosts = HostFilter::resolve(
            &req.hostnames,
            resolved_serial.as_deref(),
            req.cluster_name.as_deref(),
        );

        Ok(self.index.search_syslog(&req.keyword, t_lo, t_hi, hosts).await?)
    }

    /// Local (JST) ISO8601 timestamps are converted to UTC-naive; a
    /// `Z`-suffixed timestamp is already UTC and only needs reformatting.
    fn normalize_operator_timestamp(&self, raw: &str) -> Result<chrono::NaiveDateTime, QueryError> {
        if raw.trim().ends_with('Z') {
            Ok(time_fmt::parse_flexible(raw)?)
        } else {
            let utc_iso = time_fmt::to_index_ts(raw)?;
            Ok(time_fmt::parse_flexible(&utc_iso)?)
        }
    }

    /// Every archive under the zip output directory, cached 10s under
    /// `col:ziplist`.
    pub async fn list_zips(&self) -> Result<Vec<ZipListEntry>, QueryError> {
        let zip_dir = self.zip_dir.clone();
        let value = self
            .cache
            .get_or_set(&format!("{CACHE_PREFIX}ziplist"), LISTING_TTL, || async move {
                tokio::task::spawn_blocking(move || list_zip_files(&zip_dir))
                    .await
                    .map_err(|e| e.to_string())?
                    .map_err(|e| e.to_string())
                    .and_then(|entries| serde_json::to_value(entries).map_err(|e| e.to_string()))
            })
            .await
            .map_err(|e| QueryError::Archive(e.to_string()))?;
        Ok(serde_json::from_value(value).map_err(|e| QueryError::Archive(e.to_string()))?)
    }

    /// Every file name inside `<zip_name>`, cached 10s under
    /// `col:logs_in_zip:<zip_name>`.
    pub async fn list_logs_in_zip(&self, zip_name: &str) -> Result<Vec<String>, QueryError> {
        let zip_path = self.zip_path(zip_name);
        if !zip_path.is_file() {
            return Err(QueryError::ArchiveNotFound(zip_name.to_string()));
        }

        let key = format!("{CACHE_PREFIX}logs_in_zip:{zip_name}");
        let value = self
            .cache
            .get_or_set(&key, LISTING_TTL, || async move {
                tokio::task::spawn_blocking(move || list_entries_in_zip(&zip_path))
                    .await
                    .map_err(|e| e.to_string())?
                    .map_err(|e| e.to_string())
                    .and_then(|names| serde_json::to_value(names).map_err(|e| e.to_string()))
            })
            .await
            .map_err(|e| QueryError::Archive(e.to_string()))?;
        Ok(serde_json::from_value(value).map_err(|e| QueryError::Archive(e.to_string()))?)
    }

    /// `(bytes, megabytes)` size of one archived file.
    pub async fn get_log_size(&self, zip_name: &str, log_file: &str) -> Result<(u64, f64), QueryError> {
        let zip_path = self.zip_path(zip_name);
        let log_file = log_file.to_string();
        let bytes = tokio::task::spawn_blocking(move || entry_size(&zip_path, &log_file))
            .await
            .map_err(|e| QueryError::Archive(e.to_string()))??;
        Ok((bytes, bytes as f64 / 1_000_000.0))
    }

    /// Read one archived file's content, either a byte slice or a page of
    /// lines, per `mode`.
    pub async fn get_log_content(
        &self,
        zip_name: &str,
        log_file: &str,
        mode: ContentRequest,
    ) -> Result<LogContent, QueryError> {
        match mode {
            ContentRequest::ByteRange { start, length } => {
                self.read_byte_range(zip_name, log_file, start, length).await
            }
            ContentRequest::Paginated { page, page_size } => {
                self.read_paginated(zip_name, log_file, page, page_size).await
            }
        }
    }

    async fn read_byte_range(
        &self,
        zip_name: &str,
        log_file: &str,
        start: u64,
        length: u64,
    ) -> Result<LogContent, QueryError> {
        let length = if length == 0 { DEFAULT_RANGE_LENGTH } else { length };
        let bytes = self.read_entry_bytes(zip_name, log_file).await?;

        if start >= bytes.len() as u64 {
            return Ok(LogContent::ByteRange(ByteRangeContent {
                empty: true,
                content: String::new(),
                start,
                length,
            }));
        }

        let start_idx = start as usize;
        let end_idx = (start + length).min(bytes.len() as u64) as usize;
        let content = String::from_utf8_lossy(&bytes[start_idx..end_idx]).to_string();
        Ok(LogContent::ByteRange(ByteRangeContent {
            empty: false,
            content,
            start,
            length,
        }))
    }

    async fn read_paginated(
        &self,
        zip_name: &str,
        log_file: &str,
        page: u64,
        page_size: u64,
    ) -> Result<LogContent, QueryError> {
        let page = page.max(1);
        let page_size = page_size.clamp(PAGE_SIZE_MIN, PAGE_SIZE_MAX);

        let bytes = self.read_entry_bytes(zip_name, log_file).await?;
        let text = String::from_utf8_lossy(&bytes);
        let all_lines: Vec<&str> = text.lines().collect();

        let key = format!("{CACHE_PREFIX}total_lines:{zip_name}:{log_file}");
        let total_lines = all_lines.len() as u64;
        self.cache
            .set(&key, serde_json::json!(total_lines), TOTAL_LINES_TTL);

        let total_pages = total_lines.div_ceil(page_size).max(1);
        let start = (page - 1) * page_size;
        let end = (start + page_size).min(total_lines);

        let lines = if start >= total_lines {
            Vec::new()
        } else {
            all_lines[start as usize..end as usize]
                .iter()
                .map(|l| l.trim_end_matches('\r').to_string())
                .collect()
        };

        Ok(LogContent::Paginated(PaginatedContent {
            lines,
            pagination: Pagination {
                page,
                page_size,
                total_lines,
                total_pages,
                has_next: page < total_pages,
                has_prev: page > 1,
            },
        }))
    }

    async fn read_entry_bytes(&self, zip_name: &str, log_file: &str) -> Result<Vec<u8>, QueryError> {
        let zip_path = self.zip_path(zip_name);
        if !zip_path.is_file() {
            return Err(QueryError::ArchiveNotFound(zip_name.to_string()));
        }
        let log_file_owned = log_file.to_string();
        let zip_name_owned = zip_name.to_string();
        tokio::task::spawn_blocking(move || read_entry(&zip_path, &log_file_owned, &zip_name_owned))
            .await
            .map_err(|e| QueryError::Archive(e.to_string()))?
    }

    fn zip_path(&self, zip_name: &str) -> PathBuf {
        self.zip_dir.join(zip_name)
    }

    /// Invalidate every cached entry owned by this service, per §4.6: "on
    /// job completion, invalidate all keys matching `^col:`".
    pub fn invalidate_collection_cache(&self) -> usize {
        self.cache.invalidate_prefix(CACHE_PREFIX)
    }
}

fn list_zip_files(zip_dir: &Path) -> std::io::Result<Vec<ZipListEntry>> {
    if !zip_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(zip_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("zip") {
            continue;
        }
        let metadata = entry.metadata()?;
        entries.push(ZipListEntry {
            name: entry.file_name().to_string_lossy().to_string(),
            size_bytes: metadata.len(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

fn list_entries_in_zip(zip_path: &Path) -> Result<Vec<String>, String> {
    let file = std::fs::File::open(zip_path).map_err(|e| e.to_string())?;
    let archive = zip::ZipArchive::new(file).map_err(|e| e.to_string())?;
    Ok(archive.file_names().map(str::to_string).collect())
}

fn entry_size(zip_path: &Path, log_file: &str) -> Result<u64, QueryError> {
    let file = std::fs::File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| QueryError::Archive(e.to_string()))?;
    let entry = archive
        .by_name(log_file)
        .map_err(|_| QueryError::FileNotFound {
            zip_name: zip_path.display().to_string(),
            log_file: log_file.to_string(),
        })?;
    Ok(entry.size())
}

fn read_entry(zip_path: &Path, log_file: &str, zip_name: &str) -> Result<Vec<u8>, QueryError> {
    let file = std::fs::File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| QueryError::Archive(e.to_string()))?;
    let mut entry = archive.by_name(log_file).map_err(|_| QueryError::FileNotFound {
        zip_name: zip_name.to_string(),
        log_file: log_file.to_string(),
    })?;
    let mut contents = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut contents)?;
    debug!(zip_name, log_file, bytes = contents.len(), "read archived log entry");
    Ok(contents)
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
