// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

//! loghoi-index: the Index Gateway (C2) — a typed facade over the external
//! full-text index, consumed as an opaque search/put service over HTTP.

mod error;
mod gateway;
mod http;

pub use error::IndexError;
pub use gateway::{IndexGateway, RECENT_PC_CAP, SYSLOG_SEARCH_CAP};
pub use http::HttpIndexGateway;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeIndexGateway;
