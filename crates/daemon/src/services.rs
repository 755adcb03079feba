// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composition root: wires every component (C1-C7) into one `Services`
//! value the (external) transport layer calls into.

use std::path::PathBuf;
use std::sync::Arc;

use loghoi_cache::TtlCache;
use loghoi_contracts::Config;
use loghoi_index::{HttpIndexGateway, IndexGateway};
use loghoi_jobs::{CacheInvalidator, JobManager, JobPaths};
use loghoi_query::QueryService;
use loghoi_remote::{RemoteExecutor, SshExecutor};
use loghoi_stream::SessionManager;

/// Default CVM/PC SSH login, matching the fleet's standard admin account.
const DEFAULT_REMOTE_USER: &str = "nutanix";

/// On-disk roots for collected bundles, per the component design's
/// `output/log/<folder>` and `output/zip/<folder>.zip` layout.
fn job_paths(base_dir: &std::path::Path) -> JobPaths {
    JobPaths {
        log_dir: base_dir.join("output/log"),
        zip_dir: base_dir.join("output/zip"),
    }
}

/// Bridges `JobManager`'s completion hook to `QueryService`'s cache, since
/// `loghoi-jobs` cannot depend on `loghoi-query` (no existing edge between
/// the two crates, and the orphan rule forbids implementing a foreign trait
/// for a foreign type outside either crate) — the composition root, which
/// already depends on both, supplies the glue.
struct QueryCacheInvalidator<E: RemoteExecutor>(Arc<QueryService<E>>);

impl<E: RemoteExecutor> CacheInvalidator for QueryCacheInvalidator<E> {
    fn invalidate(&self) {
        self.0.invalidate_collection_cache();
    }
}

/// Every long-lived service the daemon owns, shared by `Arc` across
/// whatever transport binds to it.
pub struct Services {
    pub index_gateway: Arc<dyn IndexGateway>,
    pub cache: TtlCache,
    pub executor: Arc<SshExecutor>,
    pub session_manager: Arc<SessionManager<SshExecutor>>,
    pub job_manager: Arc<JobManager<SshExecutor>>,
    pub query_service: Arc<QueryService<SshExecutor>>,
}

impl Services {
    pub fn build(config: &Config, base_dir: PathBuf) -> Self {
        let executor = Arc::new(SshExecutor::new(
            config.ssh_key_path.clone(),
            DEFAULT_REMOTE_USER,
        ));
        let index_gateway: Arc<dyn IndexGateway> =
            Arc::new(HttpIndexGateway::new(config.elasticsearch_url.clone()));
        let cache = TtlCache::new();

        let session_manager = Arc::new(SessionManager::new(
            Arc::clone(&executor),
            config.session_idle_timeout,
            config.max_lines_per_second,
        ));

        let query_service = Arc::new(QueryService::new(
            Arc::clone(&index_gateway),
            cache.clone(),
            Arc::clone(&executor),
            base_dir.join("output/zip"),
        ));

        let job_manager = Arc::new(
            JobManager::new(Arc::clone(&executor), job_paths(&base_dir))
                .with_cache_invalidator(Arc::new(QueryCacheInvalidator(Arc::clone(&query_service)))),
        );

        Self {
            index_gateway,
            cache,
            executor,
            session_manager,
            job_manager,
            query_service,
        }
    }
}

#[cfg(test)]
#[path = "services_tests.rs"]
mod tests;
