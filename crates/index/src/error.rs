// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the Index Gateway (C2).

use thiserror::Error;

/// Errors surfaced by [`crate::IndexGateway`] operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The underlying index returned an error that looks like "no such
    /// index" rather than a real query failure. Callers treat this the
    /// same as an empty result set.
    #[error("index missing: {0}")]
    IndexMissing(String),

    #[error("index transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("index returned malformed document: {0}")]
    MalformedDocument(String),

    #[error("index bulk write failed: {0}")]
    BulkWriteFailed(String),
}
