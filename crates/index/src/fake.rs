// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake [`IndexGateway`] for testing: an in-memory store with the same
//! precedence/cap/cardinality rules as the production HTTP gateway.
#![cfg_attr(coverage_nightly, coverage(off))]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use loghoi_core::cluster::{ClusterRecord, PcRecord};
use loghoi_core::syslog::{HostFilter, LogEntry};
use loghoi_core::uuid_dataset::{PerIndexCounts, UuidDataset};
use parking_lot::Mutex;

use crate::error::IndexError;
use crate::gateway::{IndexGateway, RECENT_PC_CAP, SYSLOG_SEARCH_CAP};

struct State {
    clusters: Vec<ClusterRecord>,
    pcs: Vec<PcRecord>,
    syslog: Vec<LogEntry>,
    uuid_datasets: Vec<UuidDataset>,
}

/// In-memory stand-in for [`crate::http::HttpIndexGateway`].
#[derive(Clone)]
pub struct FakeIndexGateway {
    inner: Arc<Mutex<State>>,
}

impl Default for FakeIndexGateway {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(State {
                clusters: Vec::new(),
                pcs: Vec::new(),
                syslog: Vec::new(),
                uuid_datasets: Vec::new(),
            })),
        }
    }
}

impl FakeIndexGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a syslog entry as already indexed, for tests exercising
    /// `search_syslog` without a real write path.
    pub fn seed_syslog(&self, entry: LogEntry) {
        self.inner.lock().syslog.push(entry);
    }

    pub fn uuid_datasets(&self) -> Vec<UuidDataset> {
        self.inner.lock().uuid_datasets.clone()
    }
}

#[async_trait]
impl IndexGateway for FakeIndexGateway {
    async fn latest_cluster(&self, name: &str) -> Result<Option<ClusterRecord>, IndexError> {
        let inner = self.inner.lock();
        Ok(inner
            .clusters
            .iter()
            .filter(|c| c.name == name)
            .max_by_key(|c| c.registered_at)
            .cloned())
    }

    async fn list_clusters_by_pc(&self, pc_ip: &str) -> Result<Vec<ClusterRecord>, IndexError> {
        let inner = self.inner.lock();
        let mut by_name: std::collections::HashMap<&str, &ClusterRecord> =
            std::collections::HashMap::new();
        for c in inner.clusters.iter().filter(|c| c.pc_ip == pc_ip) {
            by_name
                .entry(c.name.as_str())
                .and_modify(|existing| {
                    if c.registered_at > existing.registered_at {
                        *existing = c;
                    }
                })
                .or_insert(c);
        }
        let mut result: Vec<ClusterRecord> = by_name.into_values().cloned().collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    async fn list_recent_pcs(&self) -> Result<Vec<PcRecord>, IndexError> {
        let inner = self.inner.lock();
        let mut by_ip: std::collections::HashMap<&str, &PcRecord> = std::collections::HashMap::new();
        for pc in &inner.pcs {
            by_ip
                .entry(pc.pc_ip.as_str())
                .and_modify(|existing| {
                    if pc.registered_at > existing.registered_at {
                        *existing = pc;
                    }
                })
                .or_insert(pc);
        }
        let mut deduped: Vec<PcRecord> = by_ip.into_values().cloned().collect();
        deduped.sort_by(|a, b| b.registered_at.cmp(&a.registered_at));
        deduped.truncate(RECENT_PC_CAP);
        Ok(deduped)
    }

    async fn put_pc(&self, record: PcRecord) -> Result<NaiveDateTime, IndexError> {
        let ts = record.registered_at.naive_utc();
        self.inner.lock().pcs.push(record);
        Ok(ts)
    }

    async fn put_cluster(
        &self,
        records: Vec<ClusterRecord>,
        timestamp: NaiveDateTime,
    ) -> Result<(), IndexError> {
        let mut inner = self.inner.lock();
        for mut r in records {
            r.registered_at = chrono::DateTime::from_naive_utc_and_offset(timestamp, chrono::Utc);
            inner.clusters.push(r);
        }
        Ok(())
    }

    async fn search_syslog(
        &self,
        keyword: &str,
        t_lo: NaiveDateTime,
        t_hi: NaiveDateTime,
        hosts: HostFilter,
    ) -> Result<Vec<LogEntry>, IndexError> {
        let inner = self.inner.lock();
        let matches: Vec<LogEntry> = inner
            .syslog
            .iter()
            .filter(|entry| entry.message.contains(keyword))
            .filter(|entry| {
                let ts = match chrono::NaiveDateTime::parse_from_str(&entry.timestamp, "%Y-%m-%dT%H:%M:%S") {
                    Ok(ts) => ts,
                    Err(_) => return false,
                };
                ts >= t_lo && ts <= t_hi
            })
            .filter(|entry| match &hosts {
                HostFilter::Hostnames(names) => names.contains(&entry.hostname),
                HostFilter::BlockSerial(serial) => entry.hostname.contains(serial.as_str()),
                HostFilter::ClusterName(_) => true,
                HostFilter::None => true,
            })
            .take(SYSLOG_SEARCH_CAP)
            .cloned()
            .collect();
        Ok(matches)
    }

    async fn put_uuid_dataset(
        &self,
        payload: UuidDataset,
    ) -> Result<(String, PerIndexCounts), IndexError> {
        let counts = PerIndexCounts::from(&payload);
        let cluster_name = payload.cluster_name.clone();
        self.inner.lock().uuid_datasets.push(payload);
        Ok((cluster_name, counts))
    }

    async fn latest_uuid_dataset(
        &self,
        cluster_name: &str,
    ) -> Result<Option<UuidDataset>, IndexError> {
        let inner = self.inner.lock();
        Ok(inner
            .uuid_datasets
            .iter()
            .rev()
            .find(|d| d.cluster_name == cluster_name)
            .cloned())
    }

    async fn search_uuid_dataset(&self, key: &str) -> Result<Vec<UuidDataset>, IndexError> {
        let inner = self.inner.lock();
        Ok(inner
            .uuid_datasets
            .iter()
            .filter(|d| dataset_has_uuid(d, key))
            .cloned()
            .collect())
    }
}

fn dataset_has_uuid(d: &UuidDataset, key: &str) -> bool {
    d.vms.iter().any(|r| r.uuid == key)
        || d.storage_containers.iter().any(|r| r.uuid == key)
        || d.volume_groups.iter().any(|r| r.uuid == key)
        || d.vfilers.iter().any(|r| r.uuid == key)
        || d.shares.iter().any(|r| r.uuid == key)
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
