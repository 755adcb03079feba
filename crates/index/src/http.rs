// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production [`IndexGateway`] backed by the external full-text index's
//! REST search API, reached over `reqwest`. The query shapes mirror the
//! original service's Elasticsearch queries: `bool`/`must` with
//! `query_string` wildcards for text fields and `range` for the timestamp.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use loghoi_core::cluster::{ClusterRecord, PcRecord};
use loghoi_core::syslog::{HostFilter, LogEntry};
use loghoi_core::uuid_dataset::{PerIndexCounts, UuidDataset};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::IndexError;
use crate::gateway::{IndexGateway, RECENT_PC_CAP, SYSLOG_SEARCH_CAP};

const PC_INDEX: &str = "pc";
const CLUSTER_INDEX: &str = "cluster";
const SYSLOG_INDEX: &str = "filebeat-*";
const UUID_VMS_INDEX: &str = "uuid_vms";
const UUID_STORAGE_CONTAINERS_INDEX: &str = "uuid_storage_containers";
const UUID_VOLUME_GROUPS_INDEX: &str = "uuid_volume_groups";
const UUID_VFILERS_INDEX: &str = "uuid_vfilers";
const UUID_SHARES_INDEX: &str = "uuid_shares";
const UUID_SHARE_DETAILS_INDEX: &str = "uuid_share_details";

/// Wraps `term` with `*` on both sides, matching the original service's
/// wildcard convention for free-text and serial/cluster-name searches.
fn wildcard(term: &str) -> String {
    format!("*{term}*")
}

fn is_missing_index(err: &reqwest::Error) -> bool {
    err.status() == Some(reqwest::StatusCode::NOT_FOUND)
}

/// Talks to a search index that exposes an Elasticsearch-compatible
/// `_search`/`_bulk` HTTP surface.
pub struct HttpIndexGateway {
    client: reqwest::Client,
    base_url: String,
}

/// Connect/request timeout for every call against the index, per §5.
const INDEX_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

impl HttpIndexGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(INDEX_HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build index http client with timeout, using default");
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn search(&self, index: &str, query: Value) -> Result<Vec<Value>, IndexError> {
        let url = format!("{}/{}/_search", self.base_url, index);
        let resp = self.client.post(&url).json(&query).send().await;

        let resp = match resp {
            Ok(resp) => resp,
            Err(e) if is_missing_index(&e) => {
                debug!(index, "index missing, treating search as empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(IndexError::Transport(e)),
        };

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(index, "index missing, treating search as empty");
            return Ok(Vec::new());
        }
        if !resp.status().is_success() {
            return Err(IndexError::IndexMissing(format!(
                "{index} search returned {}",
                resp.status()
            )));
        }

        let body: Value = resp.json().await?;
        let hits = body
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(hits
            .into_iter()
            .filter_map(|hit| hit.get("_source").cloned())
            .collect())
    }

    async fn bulk_index(
        &self,
        index: &str,
        documents: Vec<Value>,
    ) -> Result<usize, IndexError> {
        if documents.is_empty() {
            return Ok(0);
        }
        let mut body = String::new();
        for doc in &documents {
            body.push_str(&json!({"index": {"_index": index}}).to_string());
            body.push('\n');
            body.push_str(&doc.to_string());
            body.push('\n');
        }

        let url = format!("{}/_bulk", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(IndexError::BulkWriteFailed(format!("{status}: {text}")));
        }
        Ok(documents.len())
    }
}

#[async_trait]
impl IndexGateway for HttpIndexGateway {
    async fn latest_cluster(&self, name: &str) -> Result<Option<ClusterRecord>, IndexError> {
        let query = json!({
            "query": {"bool": {"must": [{"match": {"name": name}}]}},
            "sort": [{"registered_at": {"order": "desc"}}],
            "size": 1,
        });
        let hits = self.search(CLUSTER_INDEX, query).await?;
        match hits.into_iter().next() {
            Some(doc) => Ok(Some(serde_json::from_value(doc).map_err(|e| {
                IndexError::MalformedDocument(e.to_string())
            })?)),
            None => Ok(None),
        }
    }

    async fn list_clusters_by_pc(&self, pc_ip: &str) -> Result<Vec<ClusterRecord>, IndexError> {
        let query = json!({
            "query": {"bool": {"must": [{"match": {"pc_ip": pc_ip}}]}},
            "sort": [{"registered_at": {"order": "desc"}}],
            "collapse": {"field": "name.keyword"},
            "size": 1000,
        });
        let hits = self.search(CLUSTER_INDEX, query).await?;
        hits.into_iter()
            .map(|doc| {
                serde_json::from_value(doc).map_err(|e| IndexError::MalformedDocument(e.to_string()))
            })
            .collect()
    }

    async fn list_recent_pcs(&self) -> Result<Vec<PcRecord>, IndexError> {
        let query = json!({
            "query": {"match_all": {}},
            "sort": [{"registered_at": {"order": "desc"}}],
            "collapse": {"field": "pc_ip.keyword"},
            "size": RECENT_PC_CAP,
        });
        let hits = self.search(PC_INDEX, query).await?;
        hits.into_iter()
            .take(RECENT_PC_CAP)
            .map(|doc| {
                serde_json::from_value(doc).map_err(|e| IndexError::MalformedDocument(e.to_string()))
            })
            .collect()
    }

    async fn put_pc(&self, record: PcRecord) -> Result<NaiveDateTime, IndexError> {
        let timestamp = record.registered_at.naive_utc();
        let doc = serde_json::to_value(&record)
            .map_err(|e| IndexError::MalformedDocument(e.to_string()))?;
        self.bulk_index(PC_INDEX, vec![doc]).await?;
        Ok(timestamp)
    }

    async fn put_cluster(
        &self,
        records: Vec<ClusterRecord>,
        timestamp: NaiveDateTime,
    ) -> Result<(), IndexError> {
        let docs = records
            .into_iter()
            .map(|mut r| {
                r.registered_at = chrono::DateTime::from_naive_utc_and_offset(timestamp, chrono::Utc);
                serde_json::to_value(&r).map_err(|e| IndexError::MalformedDocument(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.bulk_index(CLUSTER_INDEX, docs).await?;
        Ok(())
    }

    async fn search_syslog(
        &self,
        keyword: &str,
        t_lo: NaiveDateTime,
        t_hi: NaiveDateTime,
        hosts: HostFilter,
    ) -> Result<Vec<LogEntry>, IndexError> {
        let mut must = vec![json!({
            "range": {
                "timestamp": {
                    "gte": t_lo.format("%Y-%m-%dT%H:%M:%S").to_string(),
                    "lte": t_hi.format("%Y-%m-%dT%H:%M:%S").to_string(),
                }
            }
        })];
        must.push(json!({
            "query_string": {"default_field": "message", "query": wildcard(keyword)}
        }));

        match hosts {
            HostFilter::Hostnames(names) => {
                must.push(json!({"terms": {"hostname.keyword": names}}));
            }
            HostFilter::BlockSerial(serial) => {
                must.push(json!({
                    "query_string": {"default_field": "hostname", "query": wildcard(&serial)}
                }));
            }
            HostFilter::ClusterName(name) => {
                must.push(json!({
                    "query_string": {"default_field": "cluster_name", "query": wildcard(&name)}
                }));
            }
            HostFilter::None => {}
        }

        let query = json!({
            "query": {"bool": {"must": must}},
            "size": SYSLOG_SEARCH_CAP,
        });

        let hits = self.search(SYSLOG_INDEX, query).await?;
        hits.into_iter()
            .take(SYSLOG_SEARCH_CAP)
            .map(|doc| {
                serde_json::from_value(doc).map_err(|e| IndexError::MalformedDocument(e.to_string()))
            })
            .collect()
    }

    async fn put_uuid_dataset(
        &self,
        payload: UuidDataset,
    ) -> Result<(String, PerIndexCounts), IndexError> {
        let counts = PerIndexCounts::from(&payload);
        let cluster_name = payload.cluster_name.clone();
        let cluster_uuid = payload.cluster_uuid.clone();
        let snapshot_ts = chrono::Utc::now().naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string();

        fn stamp(mut doc: Value, cluster_name: &str, cluster_uuid: &str, ts: &str) -> Value {
            if let Value::Object(ref mut map) = doc {
                map.insert("cluster_name".into(), json!(cluster_name));
                map.insert("cluster_uuid".into(), json!(cluster_uuid));
                map.insert("timestamp".into(), json!(ts));
            }
            doc
        }

        macro_rules! stamped_docs {
            ($records:expr) => {
                $records
                    .into_iter()
                    .map(|r| {
                        serde_json::to_value(&r)
                            .map(|v| stamp(v, &cluster_name, &cluster_uuid, &snapshot_ts))
                            .map_err(|e| IndexError::MalformedDocument(e.to_string()))
                    })
                    .collect::<Result<Vec<_>, _>>()
            };
        }

        let vms = stamped_docs!(payload.vms)?;
        let storage_containers = stamped_docs!(payload.storage_containers)?;
        let volume_groups = stamped_docs!(payload.volume_groups)?;
        let vfilers = stamped_docs!(payload.vfilers)?;
        let shares = stamped_docs!(payload.shares)?;
        let share_details = stamped_docs!(payload.share_details)?;

        self.bulk_index(UUID_VMS_INDEX, vms).await?;
        self.bulk_index(UUID_STORAGE_CONTAINERS_INDEX, storage_containers)
            .await?;
        self.bulk_index(UUID_VOLUME_GROUPS_INDEX, volume_groups).await?;
        self.bulk_index(UUID_VFILERS_INDEX, vfilers).await?;
        self.bulk_index(UUID_SHARES_INDEX, shares).await?;
        self.bulk_index(UUID_SHARE_DETAILS_INDEX, share_details).await?;

        Ok((cluster_name, counts))
    }

    async fn latest_uuid_dataset(
        &self,
        cluster_name: &str,
    ) -> Result<Option<UuidDataset>, IndexError> {
        let latest_ts = {
            let query = json!({
                "query": {"term": {"cluster_name.keyword": cluster_name}},
                "sort": [{"timestamp": {"order": "desc"}}],
                "size": 1,
            });
            let hits = self.search(UUID_VMS_INDEX, query).await?;
            match hits.into_iter().next() {
                Some(doc) => doc.get("timestamp").and_then(Value::as_str).map(str::to_string),
                None => None,
            }
        };
        let Some(ts) = latest_ts else { return Ok(None) };

        let query_for = |index: &str| {
            json!({
                "query": {
                    "bool": {
                        "must": [
                            {"term": {"cluster_name.keyword": cluster_name}},
                            {"term": {"timestamp": &ts}},
                        ]
                    }
                },
                "size": 1000,
            })
        };

        let vms = self.search(UUID_VMS_INDEX, query_for(UUID_VMS_INDEX)).await?;
        let storage_containers = self
            .search(UUID_STORAGE_CONTAINERS_INDEX, query_for(UUID_STORAGE_CONTAINERS_INDEX))
            .await?;
        let volume_groups = self
            .search(UUID_VOLUME_GROUPS_INDEX, query_for(UUID_VOLUME_GROUPS_INDEX))
            .await?;
        let vfilers = self.search(UUID_VFILERS_INDEX, query_for(UUID_VFILERS_INDEX)).await?;
        let shares = self.search(UUID_SHARES_INDEX, query_for(UUID_SHARES_INDEX)).await?;
        let share_details = self
            .search(UUID_SHARE_DETAILS_INDEX, query_for(UUID_SHARE_DETAILS_INDEX))
            .await?;

        let cluster_uuid = vms
            .first()
            .or(storage_containers.first())
            .and_then(|d| d.get("cluster_uuid").and_then(Value::as_str))
            .unwrap_or_default()
            .to_string();

        fn decode<T: serde::de::DeserializeOwned>(docs: Vec<Value>) -> Result<Vec<T>, IndexError> {
            docs.into_iter()
                .map(|d| serde_json::from_value(d).map_err(|e| IndexError::MalformedDocument(e.to_string())))
                .collect()
        }

        Ok(Some(UuidDataset {
            cluster_name: cluster_name.to_string(),
            cluster_uuid,
            vms: decode(vms)?,
            storage_containers: decode(storage_containers)?,
            volume_groups: decode(volume_groups)?,
            vfilers: decode(vfilers)?,
            shares: decode(shares)?,
            share_details: decode(share_details)?,
        }))
    }

    async fn search_uuid_dataset(&self, key: &str) -> Result<Vec<UuidDataset>, IndexError> {
        let uuid_field_query = |field: &str| {
            let field_key = format!("{field}.keyword");
            json!({
                "query": {"term": {field_key: key}},
                "size": 1,
            })
        };

        let indices = [
            (UUID_VMS_INDEX, "uuid"),
            (UUID_STORAGE_CONTAINERS_INDEX, "uuid"),
            (UUID_VOLUME_GROUPS_INDEX, "uuid"),
            (UUID_VFILERS_INDEX, "uuid"),
            (UUID_SHARES_INDEX, "uuid"),
        ];

        let mut cluster_names: Vec<String> = Vec::new();
        for (index, field) in indices {
            let hits = self.search(index, uuid_field_query(field)).await?;
            if let Some(doc) = hits.first() {
                if let Some(name) = doc.get("cluster_name").and_then(Value::as_str) {
                    if !cluster_names.contains(&name.to_string()) {
                        cluster_names.push(name.to_string());
                    }
                }
            }
        }

        let mut datasets = Vec::new();
        for name in cluster_names {
            if let Some(dataset) = self.latest_uuid_dataset(&name).await? {
                datasets.push(dataset);
            }
        }
        Ok(datasets)
    }
}

impl std::fmt::Debug for HttpIndexGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpIndexGateway")
            .field("base_url", &self.base_url)
            .finish()
    }
}
