// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenario tests spanning collection jobs, live streaming,
//! archived reads, rate limiting, and cache single-flight, each wired
//! from fakes the way a real deployment wires its components.

use std::io::Write as _;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use loghoi_cache::TtlCache;
use loghoi_core::capture::CaptureItem;
use loghoi_core::cluster::ClusterRecord;
use loghoi_core::job::JobState;
use loghoi_index::FakeIndexGateway;
use loghoi_jobs::{CacheInvalidator, JobManager, JobPaths};
use loghoi_query::{ContentRequest, LogContent, QueryService};
use loghoi_remote::FakeExecutor;
use loghoi_stream::SessionManager;
use tokio::sync::mpsc;

/// Bridges a completed job to a `QueryService`'s cache the way the daemon's
/// composition root does, so this test exercises the same wiring a real
/// deployment relies on rather than calling `invalidate_collection_cache`
/// directly.
struct TestCacheInvalidator(Arc<QueryService<FakeExecutor>>);

impl CacheInvalidator for TestCacheInvalidator {
    fn invalidate(&self) {
        self.0.invalidate_collection_cache();
    }
}

fn cluster(name: &str, cvm_ips: Vec<&str>) -> ClusterRecord {
    ClusterRecord {
        name: name.to_string(),
        block_serial: "BL001".to_string(),
        hypervisor_type: "AHV".to_string(),
        pc_ip: "10.0.0.1".to_string(),
        uuid: "uuid-1".to_string(),
        cvm_ips: cvm_ips.into_iter().map(str::to_string).collect(),
        hostnames: vec!["host-a".to_string()],
        hosts: vec![],
        registered_at: chrono::Utc::now(),
    }
}

fn write_zip(dir: &std::path::Path, name: &str, entries: &[(&str, &str)]) -> std::path::PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (entry_name, content) in entries {
        writer.start_file(*entry_name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
    path
}

/// S1: a collection job against a reachable CVM fetches its files, runs
/// its commands, and packages both into a discoverable archive.
#[tokio::test]
async fn s1_successful_collection_produces_a_listable_archive() {
    let tmp = tempfile::tempdir().unwrap();
    let log_dir = tmp.path().join("log");
    let zip_dir = tmp.path().join("zip");

    let executor = Arc::new(FakeExecutor::new());
    executor.script_file("10.0.0.5", "/home/nutanix/data/logs/genesis.out", b"genesis started\n".to_vec());
    executor.script_command(
        "10.0.0.5",
        "ncli cluster info",
        vec!["Cluster Name : c1".to_string()],
        0,
    );

    let jobs = JobManager::new(
        Arc::clone(&executor),
        JobPaths {
            log_dir: log_dir.clone(),
            zip_dir: zip_dir.clone(),
        },
    );

    let file_items = vec![CaptureItem::FileCapture {
        remote_path: "/home/nutanix/data/logs/genesis.out".to_string(),
    }];
    let command_items = vec![CaptureItem::CommandCapture {
        name: "cluster_info".to_string(),
        command: "ncli cluster info".to_string(),
    }];

    let id = jobs.submit("10.0.0.5", file_items, command_items);

    let job = loop {
        let job = jobs.get(&id).unwrap();
        if job.state.is_terminal() {
            break job;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    };

    assert_eq!(job.state, JobState::Completed);
    let folder_re = regex::Regex::new(r"^loghoi_\d{8}_\d{6}$").unwrap();
    assert!(folder_re.is_match(&job.folder_name), "unexpected folder name {}", job.folder_name);
    assert!(job.archive_path.as_ref().unwrap().is_file());

    let index: Arc<FakeIndexGateway> = Arc::new(FakeIndexGateway::new());
    let query = QueryService::new(index, TtlCache::new(), executor, zip_dir);

    let zips = query.list_zips().await.unwrap();
    let zip_name = format!("{}.zip", job.folder_name);
    assert!(zips.iter().any(|z| z.name == zip_name));

    let entries = query.list_logs_in_zip(&zip_name).await.unwrap();
    assert!(entries.iter().any(|e| e.contains("genesis")));
    assert!(entries.iter().any(|e| e.starts_with("cluster_info_")));
}

/// S2: an SSH auth failure while resolving the Prism leader never fails
/// the whole `get_cvms` call; it surfaces as an `auth_hint` instead.
#[tokio::test]
async fn s2_ssh_auth_failure_surfaces_as_auth_hint() {
    let tmp = tempfile::tempdir().unwrap();
    let index = Arc::new(FakeIndexGateway::new());
    index
        .put_cluster(vec![cluster("c1", vec!["10.0.0.5"])], chrono::Utc::now().naive_utc())
        .await
        .unwrap();

    let executor = Arc::new(FakeExecutor::new());
    executor.fail_auth("10.0.0.5");

    let query = QueryService::new(index, TtlCache::new(), executor, tmp.path().to_path_buf());
    let cvms = query.get_cvms("c1").await.unwrap();

    assert!(cvms.leader.is_none());
    let hint = cvms.auth_hint.expect("auth failure should populate auth_hint");
    assert!(hint.contains("Prism"), "unexpected hint: {hint}");
}

/// S3: a live stream session attaches SSH, starts a monitor whose first
/// record is sequence 1, and a fresh session after teardown starts its
/// own sequence from scratch with no cross-session bleed.
#[tokio::test]
async fn s3_live_stream_lifecycle_is_isolated_per_session() {
    let executor = Arc::new(FakeExecutor::new());

    let sessions = SessionManager::new(Arc::clone(&executor), Duration::from_secs(300), 100);

    let id = sessions.on_connect();
    sessions.add_ssh(&id, "10.0.0.5").await.unwrap();

    // `add_ssh` already consumed host "10.0.0.5"'s pending script slot to
    // open its attach channel; `start_monitor` opens its own separate
    // channel, so the tail command is scripted only now.
    executor.script_command(
        "10.0.0.5",
        "tail -f /home/nutanix/data/logs/genesis.out",
        vec!["line one".to_string(), "line two".to_string()],
        0,
    );

    let (tx, mut rx) = mpsc::channel(16);
    sessions
        .start_monitor(&id, "/home/nutanix/data/logs/genesis.out", "genesis.out", tx)
        .await
        .unwrap();

    let first = rx.recv().await.expect("monitor should emit its first record");
    assert_eq!(first.sequence, 1);
    assert_eq!(first.label, "genesis.out");
    assert_eq!(first.line, "line one");

    sessions.stop_all(&id).await.unwrap();

    let second_id = sessions.on_connect();
    sessions.add_ssh(&second_id, "10.0.0.9").await.unwrap();

    executor.script_command(
        "10.0.0.9",
        "tail -f /home/nutanix/data/logs/genesis.out",
        vec!["fresh line".to_string()],
        0,
    );

    let (tx2, mut rx2) = mpsc::channel(16);
    sessions
        .start_monitor(&second_id, "/home/nutanix/data/logs/genesis.out", "genesis.out", tx2)
        .await
        .unwrap();

    let second_first = rx2.recv().await.expect("second session should emit its own first record");
    assert_eq!(second_first.sequence, 1, "a fresh session must not inherit the prior session's sequence");
    assert_eq!(second_first.line, "fresh line");

    sessions.stop_all(&second_id).await.unwrap();
}

/// S4: a paginated read of a 2500-line file returns exactly one page's
/// worth of lines and correct pagination bookkeeping.
#[tokio::test]
async fn s4_paginated_read_reports_correct_page_bounds() {
    let tmp = tempfile::tempdir().unwrap();
    let zip_dir = tmp.path().to_path_buf();

    let lines: Vec<String> = (1..=2500).map(|n| format!("line {n}")).collect();
    let content = lines.join("\n");
    write_zip(&zip_dir, "loghoi_20260101_000000.zip", &[("genesis.out", &content)]);

    let index = Arc::new(FakeIndexGateway::new());
    let executor = Arc::new(FakeExecutor::new());
    let query = QueryService::new(index, TtlCache::new(), executor, zip_dir);

    let result = query
        .get_log_content(
            "loghoi_20260101_000000.zip",
            "genesis.out",
            ContentRequest::Paginated { page: 2, page_size: 1000 },
        )
        .await
        .unwrap();

    let LogContent::Paginated(page) = result else {
        panic!("expected a paginated result");
    };

    assert_eq!(page.lines.len(), 1000);
    assert_eq!(page.lines.first().unwrap(), "line 1001");
    assert_eq!(page.lines.last().unwrap(), "line 2000");
    assert_eq!(page.pagination.total_lines, 2500);
    assert_eq!(page.pagination.total_pages, 3);
    assert!(page.pagination.has_next);
    assert!(page.pagination.has_prev);
}

/// S5: the live stream monitor's rate limiting keeps the number of
/// records delivered within roughly one second bounded by the session's
/// configured capacity, even when the remote side emits far more.
#[tokio::test]
async fn s5_monitor_throughput_is_rate_limited() {
    const CAPACITY: u32 = 20;

    let executor = Arc::new(FakeExecutor::new());
    let sessions = SessionManager::new(Arc::clone(&executor), Duration::from_secs(300), CAPACITY);
    let id = sessions.on_connect();
    sessions.add_ssh(&id, "10.0.0.5").await.unwrap();

    // Scripted only after `add_ssh`'s own connect has consumed the host's
    // pending slot; `start_monitor` opens a fresh channel that picks this up.
    let burst: Vec<String> = (0..200).map(|n| format!("burst line {n}")).collect();
    executor.script_command("10.0.0.5", "tail -f /var/log/burst.log", burst, 0);

    let (tx, mut rx) = mpsc::channel(256);
    sessions
        .start_monitor(&id, "/var/log/burst.log", "burst.log", tx)
        .await
        .unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_millis(1050);
    let mut received = 0u32;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }
        match tokio::time::timeout(remaining, rx.recv()).await {
            Ok(Some(_)) => received += 1,
            Ok(None) | Err(_) => break,
        }
    }

    assert!(
        received <= CAPACITY,
        "expected at most {CAPACITY} records within one second, got {received}"
    );

    sessions.stop_all(&id).await.unwrap();
}

/// S6: a hundred concurrent callers racing the same cache key never run
/// the factory more than once, and every caller sees the same result.
#[tokio::test]
async fn s6_cache_get_or_set_is_single_flight_under_concurrency() {
    let cache = TtlCache::new();
    let calls = Arc::new(AtomicU32::new(0));

    let mut handles = Vec::with_capacity(100);
    for _ in 0..100 {
        let cache = cache.clone();
        let calls = Arc::clone(&calls);
        handles.push(tokio::spawn(async move {
            cache
                .get_or_set("shared-key", Duration::from_secs(60), || async {
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(serde_json::json!({"value": 42}))
                })
                .await
        }));
    }

    let mut results = Vec::with_capacity(100);
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1, "factory must run exactly once");
    assert!(results.iter().all(|v| *v == serde_json::json!({"value": 42})));
}

/// S7: a job completing invalidates the zip listing cache before it
/// reports `Completed`, so the newly archived bundle is visible on the
/// very next call instead of waiting out the listing TTL.
#[tokio::test]
async fn s7_job_completion_invalidates_the_zip_listing_cache() {
    let tmp = tempfile::tempdir().unwrap();
    let log_dir = tmp.path().join("log");
    let zip_dir = tmp.path().join("zip");
    std::fs::create_dir_all(&zip_dir).unwrap();

    let executor = Arc::new(FakeExecutor::new());
    executor.script_file("10.0.0.9", "/home/nutanix/data/logs/genesis.out", b"started\n".to_vec());

    let index: Arc<FakeIndexGateway> = Arc::new(FakeIndexGateway::new());
    let query = Arc::new(QueryService::new(index, TtlCache::new(), Arc::clone(&executor), zip_dir.clone()));

    // Populate the `col:ziplist` cache entry while the directory is still
    // empty, within the listing TTL window.
    let before = query.list_zips().await.unwrap();
    assert!(before.is_empty());

    let jobs = JobManager::new(
        executor,
        JobPaths {
            log_dir: log_dir.clone(),
            zip_dir: zip_dir.clone(),
        },
    )
    .with_cache_invalidator(Arc::new(TestCacheInvalidator(Arc::clone(&query))));

    let id = jobs.submit(
        "10.0.0.9",
        vec![CaptureItem::FileCapture {
            remote_path: "/home/nutanix/data/logs/genesis.out".to_string(),
        }],
        Vec::new(),
    );

    let job = loop {
        let job = jobs.get(&id).unwrap();
        if job.state.is_terminal() {
            break job;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    };
    assert_eq!(job.state, JobState::Completed);

    // No sleep for the listing TTL: the freshly archived zip must already
    // be visible because completion invalidated the stale cache entry.
    let after = query.list_zips().await.unwrap();
    let zip_name = format!("{}.zip", job.folder_name);
    assert!(after.iter().any(|z| z.name == zip_name), "completed job's archive must be immediately listable");
}
