// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the Collection Job Manager (C4).

use loghoi_core::id::JobId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("job not found: {0}")]
    NotFound(JobId),

    #[error("failed to load capture list configuration: {0}")]
    CaptureListConfig(String),

    #[error("failed to create job output directory: {0}")]
    OutputDir(String),

    #[error("ssh connect for job failed: {0}")]
    Connect(#[from] loghoi_remote::RemoteError),

    #[error("archive creation failed: {0}")]
    Archive(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
