// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use super::*;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn empty_environment_uses_every_default() {
    let cfg = Config::load_from(env(&[])).unwrap();
    let defaults = Config::default();
    assert_eq!(cfg.backend_port, defaults.backend_port);
    assert_eq!(cfg.elasticsearch_url, defaults.elasticsearch_url);
    assert!(!cfg.debug);
    assert!(cfg.cors_origins.is_empty());
}

#[test]
fn backend_port_is_parsed_from_environment() {
    let cfg = Config::load_from(env(&[("BACKEND_PORT", "9090")])).unwrap();
    assert_eq!(cfg.backend_port, 9090);
}

#[test]
fn invalid_backend_port_is_rejected() {
    let err = Config::load_from(env(&[("BACKEND_PORT", "not-a-port")])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "BACKEND_PORT", .. }));
}

#[test]
fn host_uid_and_gid_parse_when_present() {
    let cfg = Config::load_from(env(&[("HOST_UID", "1000"), ("HOST_GID", "1000")])).unwrap();
    assert_eq!(cfg.host_uid, Some(1000));
    assert_eq!(cfg.host_gid, Some(1000));
}

#[test]
fn debug_accepts_common_truthy_spellings() {
    for truthy in ["1", "true", "TRUE", "yes"] {
        let cfg = Config::load_from(env(&[("DEBUG", truthy)])).unwrap();
        assert!(cfg.debug, "{truthy:?} should be truthy");
    }
    let cfg = Config::load_from(env(&[("DEBUG", "0")])).unwrap();
    assert!(!cfg.debug);
}

#[test]
fn cors_origins_splits_on_comma_and_trims_whitespace() {
    let cfg = Config::load_from(env(&[("CORS_ORIGINS", "https://a.example, https://b.example")])).unwrap();
    assert_eq!(cfg.cors_origins, vec!["https://a.example", "https://b.example"]);
}

#[test]
fn ssh_key_path_overrides_default() {
    let cfg = Config::load_from(env(&[("SSH_KEY_PATH", "/opt/keys/id_rsa")])).unwrap();
    assert_eq!(cfg.ssh_key_path, std::path::PathBuf::from("/opt/keys/id_rsa"));
}
