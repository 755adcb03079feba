// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the Query Service (C6).

use loghoi_core::time_fmt::TimeParseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("archive not found: {0}")]
    ArchiveNotFound(String),

    #[error("file not found in archive {zip_name}: {log_file}")]
    FileNotFound { zip_name: String, log_file: String },

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("invalid timestamp: {0}")]
    Time(#[from] TimeParseError),

    #[error(transparent)]
    Index(#[from] loghoi_index::IndexError),

    #[error(transparent)]
    Remote(#[from] loghoi_remote::RemoteError),

    #[error("archive read error: {0}")]
    Archive(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
