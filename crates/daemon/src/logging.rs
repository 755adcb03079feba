// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured logging setup, mirroring the ambient logging stack every
//! other process in this workspace's lineage uses: `tracing` fed by a
//! rolling, non-blocking file appender with an `EnvFilter` honoring
//! `RUST_LOG`/`LOG_LEVEL`.

use std::path::Path;

use loghoi_contracts::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the global subscriber and returns the worker guard that
/// must be kept alive for the process lifetime to flush buffered writes.
pub fn setup_logging(
    config: &Config,
    log_dir: &Path,
) -> std::io::Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "loghoid.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).json())
        .init();

    Ok(guard)
}
