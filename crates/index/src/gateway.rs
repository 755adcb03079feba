// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Index Gateway (C2): a typed facade over the external full-text index.
//! Consumers never see the index's native query DSL; they call operations
//! named for what they return.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use loghoi_core::cluster::{ClusterRecord, PcRecord};
use loghoi_core::syslog::{HostFilter, LogEntry};
use loghoi_core::uuid_dataset::{PerIndexCounts, UuidDataset};

use crate::error::IndexError;

/// Maximum distinct PCs returned by [`IndexGateway::list_recent_pcs`].
pub const RECENT_PC_CAP: usize = 5;

/// Maximum log entries returned by [`IndexGateway::search_syslog`].
pub const SYSLOG_SEARCH_CAP: usize = 100;

#[async_trait]
pub trait IndexGateway: Send + Sync + 'static {
    /// Most recent cluster snapshot matching `name`, or `None` if this
    /// cluster has never registered.
    async fn latest_cluster(&self, name: &str) -> Result<Option<ClusterRecord>, IndexError>;

    /// The latest snapshot of every cluster registered under `pc_ip`, one
    /// entry per distinct cluster name. Backs `get_cluster_list` (§4.6).
    async fn list_clusters_by_pc(&self, pc_ip: &str) -> Result<Vec<ClusterRecord>, IndexError>;

    /// Latest distinct PC IPs, capped at [`RECENT_PC_CAP`] by recency.
    async fn list_recent_pcs(&self) -> Result<Vec<PcRecord>, IndexError>;

    /// Write one PC record, returning the assigned timestamp so the caller
    /// can correlate a subsequent `put_cluster` into the same logical
    /// registration event.
    async fn put_pc(&self, record: PcRecord) -> Result<NaiveDateTime, IndexError>;

    /// Bulk-write cluster records under a caller-supplied timestamp
    /// (normally the one returned from a preceding `put_pc`).
    async fn put_cluster(
        &self,
        records: Vec<ClusterRecord>,
        timestamp: NaiveDateTime,
    ) -> Result<(), IndexError>;

    /// Wildcard-wrapped keyword search over `[t_lo, t_hi]`, constrained by
    /// `hosts` per the precedence the caller already resolved. Capped at
    /// [`SYSLOG_SEARCH_CAP`].
    async fn search_syslog(
        &self,
        keyword: &str,
        t_lo: NaiveDateTime,
        t_hi: NaiveDateTime,
        hosts: HostFilter,
    ) -> Result<Vec<LogEntry>, IndexError>;

    /// Write every record kind in `payload` under one shared snapshot
    /// timestamp, stamping `cluster_name`/`cluster_uuid` onto each
    /// document. Returns the cluster name and a per-index write count.
    async fn put_uuid_dataset(
        &self,
        payload: UuidDataset,
    ) -> Result<(String, PerIndexCounts), IndexError>;

    /// The most recently ingested snapshot for `cluster_name`, or `None` if
    /// that cluster has never submitted one.
    async fn latest_uuid_dataset(
        &self,
        cluster_name: &str,
    ) -> Result<Option<UuidDataset>, IndexError>;

    /// Every snapshot containing a record whose uuid equals `key`, across
    /// all six record kinds.
    async fn search_uuid_dataset(&self, key: &str) -> Result<Vec<UuidDataset>, IndexError>;
}
