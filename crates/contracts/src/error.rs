// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Uniform error taxonomy and envelope (§7). Every component error type in
//! the workspace maps onto one of these seven kinds; the transport binding
//! is responsible for turning `ApiError` into an actual wire response using
//! `http_status`/`error_code`.

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use loghoi_cache::CacheError;
use loghoi_index::IndexError;
use loghoi_jobs::JobError;
use loghoi_query::QueryError;
use loghoi_remote::RemoteError;
use loghoi_stream::SessionError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    /// SSH auth to a CVM failed; the string is the operator-facing
    /// remediation hint, not a raw error message.
    #[error("{0}")]
    AuthHint(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn http_status(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::Timeout(_) => 408,
            ApiError::Conflict(_) => 409,
            ApiError::ServiceUnavailable(_) => 503,
            ApiError::AuthHint(_) | ApiError::Internal(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::AuthHint(_) => "AUTH_HINT_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND_ERROR",
            ApiError::Conflict(_) => "CONFLICT_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE_ERROR",
            ApiError::Timeout(_) => "TIMEOUT_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Render the uniform failure envelope for a request tagged with
    /// `operation` (e.g. `"sys/search"`).
    pub fn envelope(&self, operation: impl Into<String>) -> ErrorEnvelope {
        ErrorEnvelope {
            status: "error",
            message: self.to_string(),
            operation: operation.into(),
            error_code: self.error_code(),
            details: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub status: &'static str,
    pub message: String,
    pub operation: String,
    pub error_code: &'static str,
    pub details: Option<serde_json::Value>,
    pub timestamp: String,
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::ClusterNotFound(m) => ApiError::NotFound(m),
            QueryError::ArchiveNotFound(m) => ApiError::NotFound(m),
            QueryError::FileNotFound { zip_name, log_file } => {
                ApiError::NotFound(format!("{log_file} not found in {zip_name}"))
            }
            QueryError::Validation(m) => ApiError::Validation(m),
            QueryError::Time(e) => ApiError::Validation(e.to_string()),
            QueryError::Index(e) => e.into(),
            QueryError::Remote(e) => e.into(),
            QueryError::Archive(m) => ApiError::Internal(m),
            QueryError::Io(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::NotFound(id) => ApiError::NotFound(format!("job not found: {id}")),
            JobError::CaptureListConfig(m) => ApiError::Internal(m),
            JobError::OutputDir(m) => ApiError::Internal(m),
            JobError::Connect(e) => e.into(),
            JobError::Archive(m) => ApiError::Internal(m),
            JobError::Io(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(id) => ApiError::NotFound(format!("session not found: {id}")),
            SessionError::OperationInProgress(id) => {
                ApiError::Conflict(format!("session {id} has an operation already in flight"))
            }
            SessionError::SshAttachFailed { source, .. } => source.into(),
            SessionError::MonitorAlreadyRunning(id) => {
                ApiError::Conflict(format!("session {id} already has an active monitor"))
            }
            SessionError::NoSshChannel(id) => {
                ApiError::Conflict(format!("session {id} has no ssh channel attached"))
            }
            SessionError::IllegalState { operation, session } => ApiError::Conflict(format!(
                "cannot {operation} for session {session} in its current state"
            )),
        }
    }
}

impl From<IndexError> for ApiError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::IndexMissing(m) => ApiError::ServiceUnavailable(m),
            IndexError::Transport(e) => ApiError::ServiceUnavailable(e.to_string()),
            IndexError::MalformedDocument(m) => ApiError::Internal(m),
            IndexError::BulkWriteFailed(m) => ApiError::Internal(m),
        }
    }
}

impl From<RemoteError> for ApiError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Auth { hint, .. } => ApiError::AuthHint(hint),
            RemoteError::Timeout { host, seconds } => {
                ApiError::Timeout(format!("SSH connect to {host} timed out after {seconds}s"))
            }
            RemoteError::Key(m) => ApiError::Internal(m),
            RemoteError::Channel(m) => ApiError::Internal(m),
            RemoteError::FetchExhausted { remote_path, attempts } => ApiError::ServiceUnavailable(
                format!("fetch of {remote_path} failed on all transports: {attempts}"),
            ),
            RemoteError::UnknownChannel(m) => ApiError::Internal(m),
            RemoteError::Io(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::FactoryFailed(m) => ApiError::Internal(m),
            CacheError::Abandoned(m) => ApiError::ServiceUnavailable(m),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
