// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster and Prism Central inventory entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One host's triple of identifying addresses within a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    pub hostname: String,
    pub host_ip: String,
    pub cvm_ip: String,
}

/// Immutable snapshot of a cluster's inventory, as last registered.
///
/// Newer snapshots (by `registered_at`) supersede older ones for the same
/// `name`; a record is never mutated in place once persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub name: String,
    pub block_serial: String,
    pub hypervisor_type: String,
    pub pc_ip: String,
    pub uuid: String,
    pub cvm_ips: Vec<String>,
    pub hostnames: Vec<String>,
    pub hosts: Vec<HostInfo>,
    pub registered_at: DateTime<Utc>,
}

impl ClusterRecord {
    /// The first CVM IP, used as the target for best-effort Prism-leader
    /// resolution.
    pub fn first_cvm_ip(&self) -> Option<&str> {
        self.cvm_ips.first().map(String::as_str)
    }
}

/// A known Prism Central instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcRecord {
    pub pc_ip: String,
    pub prism_user: String,
    pub registered_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ClusterRecord {
        ClusterRecord {
            name: "c1".into(),
            block_serial: "BL001".into(),
            hypervisor_type: "AHV".into(),
            pc_ip: "10.0.0.1".into(),
            uuid: "uuid-1".into(),
            cvm_ips: vec!["10.0.0.5".into(), "10.0.0.6".into()],
            hostnames: vec!["host-a".into(), "host-b".into()],
            hosts: vec![],
            registered_at: Utc::now(),
        }
    }

    #[test]
    fn first_cvm_ip_is_first_in_sorted_list() {
        assert_eq!(record().first_cvm_ip(), Some("10.0.0.5"));
    }

    #[test]
    fn empty_cvm_list_has_no_first() {
        let mut r = record();
        r.cvm_ips.clear();
        assert_eq!(r.first_cvm_ip(), None);
    }
}
