// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Syslog search request/result shapes shared between the index gateway
//! and the query service.

use serde::{Deserialize, Serialize};

/// One matched syslog line, already translated to local (JST) display form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
    pub facility_label: String,
    pub severity_label: String,
    pub timestamp: String,
    pub hostname: String,
}

/// The precedence-ordered host filter for a syslog search, encoding the
/// authoritative rule from the component design: prefer `hostnames`, else
/// `block_serial`, else `cluster_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostFilter {
    Hostnames(Vec<String>),
    BlockSerial(String),
    ClusterName(String),
    None,
}

impl HostFilter {
    /// Build the filter from the optional inputs a search request may
    /// carry, applying the documented precedence.
    pub fn resolve(
        hostnames: &[String],
        block_serial: Option<&str>,
        cluster_name: Option<&str>,
    ) -> Self {
        if !hostnames.is_empty() {
            HostFilter::Hostnames(hostnames.to_vec())
        } else if let Some(serial) = block_serial.filter(|s| !s.is_empty()) {
            HostFilter::BlockSerial(serial.to_string())
        } else if let Some(name) = cluster_name.filter(|s| !s.is_empty()) {
            HostFilter::ClusterName(name.to_string())
        } else {
            HostFilter::None
        }
    }
}

/// Maximum number of syslog entries returned by a single search call.
pub const SYSLOG_SEARCH_CAP: usize = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostnames_take_precedence() {
        let f = HostFilter::resolve(&["h1".into()], Some("BL1"), Some("c1"));
        assert_eq!(f, HostFilter::Hostnames(vec!["h1".into()]));
    }

    #[test]
    fn block_serial_used_when_no_hostnames() {
        let f = HostFilter::resolve(&[], Some("BL1"), Some("c1"));
        assert_eq!(f, HostFilter::BlockSerial("BL1".into()));
    }

    #[test]
    fn cluster_name_is_last_resort() {
        let f = HostFilter::resolve(&[], None, Some("c1"));
        assert_eq!(f, HostFilter::ClusterName("c1".into()));
    }

    #[test]
    fn none_when_nothing_supplied() {
        let f = HostFilter::resolve(&[], None, None);
        assert_eq!(f, HostFilter::None);
    }
}
