// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One delivered line of a live tail stream.

use chrono::{DateTime, Utc};

/// A single line pushed to a session's sink. `sequence` numbers only
/// records that were actually delivered — a line dropped by the rate
/// limiter never gets a sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRecord {
    pub label: String,
    pub line: String,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
}
