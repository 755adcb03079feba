// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

//! loghoi-remote: the Remote Executor (C1) — an authenticated-SSH port to
//! CVMs/PCs, with a tri-tier file fetch fallback (SFTP, then `scp`, then
//! `ssh ... cat`) and a production `russh`-backed implementation.

mod error;
mod executor;
mod fetch;
mod noop;
mod ssh;

pub use error::RemoteError;
pub use executor::{ChannelId, ExecOutput, LineStream, RemoteExecutor};
pub use fetch::fetch;
pub use noop::NoopExecutor;
pub use ssh::SshExecutor;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ExecutorCall, FakeExecutor};
