// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request and response bodies for every HTTP endpoint.

use loghoi_core::{ClusterRecord, JobState, LogEntry, PcRecord};
use loghoi_query::{ContentRequest, SyslogSearchRequest};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPcRequest {
    pub prism_user: String,
    pub prism_pass: String,
    pub prism_ip: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterPcResponse {
    pub status: String,
    pub message: String,
    pub prism_ip: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PcListEntry {
    pub pc: PcRecord,
    pub clusters: Vec<ClusterRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PcClusterRequest {
    pub pcip: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CvmListRequest {
    pub cluster_name: String,
}

/// `/api/sys/search` body. Wire field names (`cluster`, `serial`) differ
/// from the service layer's (`cluster_name`, `block_serial`); this DTO is
/// the one place that mapping happens, matching every other request type
/// in this file that adapts an external wire shape to an internal one.
#[derive(Debug, Clone, Deserialize)]
pub struct SyslogSearchApiRequest {
    pub keyword: String,
    pub start_datetime: String,
    pub end_datetime: String,
    #[serde(default)]
    pub cluster: Option<String>,
    #[serde(default)]
    pub hostnames: Vec<String>,
    #[serde(default)]
    pub serial: Option<String>,
}

impl From<SyslogSearchApiRequest> for SyslogSearchRequest {
    fn from(req: SyslogSearchApiRequest) -> Self {
        SyslogSearchRequest {
            keyword: req.keyword,
            start_datetime: req.start_datetime,
            end_datetime: req.end_datetime,
            cluster_name: req.cluster,
            hostnames: req.hostnames,
            block_serial: req.serial,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyslogSearchResponse {
    pub entries: Vec<LogEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartCollectionRequest {
    pub cvm: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartCollectionResponse {
    pub job_id: String,
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub state: JobState,
    pub stage: String,
    pub processed: u64,
    pub total: u64,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSizeRequest {
    pub zip_name: String,
    pub log_file: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogSizeResponse {
    pub bytes: u64,
    pub megabytes: f64,
}

/// Accepts either a byte-range or a page request, matching the `(start,
/// length) | (page, page_size)` union in the endpoint contract.
#[derive(Debug, Clone, Deserialize)]
pub struct LogDisplayRequest {
    pub zip_name: String,
    pub log_file: String,
    #[serde(flatten)]
    pub content: ContentRequest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheClearRequest {
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    pub entries: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UuidLatestDatasetRequest {
    pub cluster_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UuidSearchDatasetRequest {
    pub key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub active_sessions: usize,
    pub active_jobs: usize,
}

#[cfg(test)]
#[path = "dto_tests.rs"]
mod tests;
