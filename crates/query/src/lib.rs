// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

//! loghoi-query: the Query Service (C6) and Correlation Context (C7) — a
//! cache-fronted read layer over cluster metadata and archived bundles,
//! plus the per-request correlation/request id plumbing every structured
//! log record and response carries.

mod correlation;
mod error;
mod service;

pub use correlation::{CorrelationContext, CorrelationIds, PROCESS_TIME_WARN_MS};
pub use error::QueryError;
pub use service::{
    ByteRangeContent, ContentRequest, CvmList, LogContent, Pagination, PaginatedContent,
    QueryService, SyslogSearchRequest, ZipListEntry,
};
