// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn build_wires_every_component_without_panicking() {
    let tmp = tempfile::tempdir().unwrap();
    let config = Config::default();
    let services = Services::build(&config, tmp.path().to_path_buf());

    // Cheap smoke check that every handle is live and independently usable.
    assert_eq!(services.cache.get("missing"), None);
    let _ = Arc::clone(&services.executor);
    let _ = Arc::clone(&services.session_manager);
    let _ = Arc::clone(&services.job_manager);
    let _ = Arc::clone(&services.query_service);
}

#[test]
fn job_paths_nest_under_the_base_dir() {
    let base = std::path::Path::new("/var/lib/loghoi");
    let paths = job_paths(base);
    assert_eq!(paths.log_dir, base.join("output/log"));
    assert_eq!(paths.zip_dir, base.join("output/zip"));
}
