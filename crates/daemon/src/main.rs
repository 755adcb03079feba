// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! loghoid: the composition-root process for the log collection and
//! observation service.
//!
//! Binding these services to a concrete transport (HTTP/WebSocket) is an
//! external collaborator's responsibility; this binary's job is to load
//! configuration, wire up every component (C1-C7), run its background
//! maintenance tasks, and stay up until asked to stop.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod logging;
mod services;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use loghoi_contracts::Config;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info};

use crate::services::Services;

/// How often the TTL cache sweeps expired entries.
const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("loghoid {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("loghoid {}", env!("CARGO_PKG_VERSION"));
                println!("Composition-root process for the log collection and observation service.");
                println!();
                println!("USAGE:");
                println!("    loghoid");
                println!();
                println!("Configuration is read entirely from the environment; see the");
                println!("SSH_KEY_PATH/ELASTICSEARCH_URL/BACKEND_HOST/BACKEND_PORT variables.");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: loghoid [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    let base_dir = base_dir();
    let log_guard = logging::setup_logging(&config, &base_dir.join("logs"))?;

    info!(
        backend_host = %config.backend_host,
        backend_port = config.backend_port,
        elasticsearch_url = %config.elasticsearch_url,
        "starting loghoid"
    );

    let services = Arc::new(Services::build(&config, base_dir));

    spawn_cache_sweep(services.cache.clone());

    let shutdown_notify = Arc::new(Notify::new());
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!("loghoid ready");
    println!("READY");

    tokio::select! {
        _ = shutdown_notify.notified() => {
            info!("shutdown requested");
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM, shutting down");
        }
        _ = sigint.recv() => {
            info!("received SIGINT, shutting down");
        }
    }

    drop(log_guard);
    info!("loghoid stopped");
    Ok(())
}

/// Base directory for on-disk output (`output/log`, `output/zip`) and
/// logs, resolved the same way the rest of the workspace's conventions
/// resolve optional overrides: an explicit env var, else a sane default.
fn base_dir() -> PathBuf {
    std::env::var("LOGHOI_BASE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/var/lib/loghoi"))
}

/// Periodically evicts expired cache entries so the table doesn't grow
/// unbounded between reads of the same key.
fn spawn_cache_sweep(cache: loghoi_cache::TtlCache) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = cache.sweep();
            if removed > 0 {
                tracing::debug!(removed, "cache sweep evicted expired entries");
            }
        }
    });
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
