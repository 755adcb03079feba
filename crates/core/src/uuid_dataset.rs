// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! UUID-graph ingestion payload (supplemental entity, see SPEC_FULL.md §3.1).
//!
//! Mirrors the six related document kinds the original `uuid.py` router
//! writes under one shared snapshot timestamp, each stamped with
//! `cluster_name`/`cluster_uuid` at the gateway boundary.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmRecord {
    pub uuid: String,
    pub name: String,
    pub power_state: String,
    pub host_uuid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageContainerRecord {
    pub uuid: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeGroupRecord {
    pub uuid: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VfilerRecord {
    pub uuid: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRecord {
    pub uuid: String,
    pub name: String,
    pub vfiler_uuid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareDetailRecord {
    pub share_uuid: String,
    pub key: String,
    pub value: String,
}

/// One full UUID-graph snapshot submitted for a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UuidDataset {
    pub cluster_name: String,
    pub cluster_uuid: String,
    pub vms: Vec<VmRecord>,
    pub storage_containers: Vec<StorageContainerRecord>,
    pub volume_groups: Vec<VolumeGroupRecord>,
    pub vfilers: Vec<VfilerRecord>,
    pub shares: Vec<ShareRecord>,
    pub share_details: Vec<ShareDetailRecord>,
}

/// Per-index document counts returned by `put_uuid_dataset`, one field per
/// document kind it wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PerIndexCounts {
    pub vms: usize,
    pub storage_containers: usize,
    pub volume_groups: usize,
    pub vfilers: usize,
    pub shares: usize,
    pub share_details: usize,
}

impl From<&UuidDataset> for PerIndexCounts {
    fn from(d: &UuidDataset) -> Self {
        Self {
            vms: d.vms.len(),
            storage_containers: d.storage_containers.len(),
            volume_groups: d.volume_groups.len(),
            vfilers: d.vfilers.len(),
            shares: d.shares.len(),
            share_details: d.share_details.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_index_counts_reflects_dataset_sizes() {
        let dataset = UuidDataset {
            cluster_name: "c1".into(),
            cluster_uuid: "u1".into(),
            vms: vec![VmRecord {
                uuid: "v1".into(),
                name: "vm1".into(),
                power_state: "on".into(),
                host_uuid: "h1".into(),
            }],
            ..Default::default()
        };
        let counts = PerIndexCounts::from(&dataset);
        assert_eq!(counts.vms, 1);
        assert_eq!(counts.shares, 0);
    }
}
