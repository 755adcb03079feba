// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process configuration, read once at startup from the environment (§6).

use std::path::PathBuf;
use std::time::Duration;

/// Resolved process configuration. Every field has a documented default so
/// `Config::load` never fails on a missing variable; only a malformed value
/// for a variable that *was* set is treated as an operator error.
#[derive(Debug, Clone)]
pub struct Config {
    pub ssh_key_path: PathBuf,
    pub elasticsearch_url: String,
    pub backend_host: String,
    pub backend_port: u16,
    pub host_uid: Option<u32>,
    pub host_gid: Option<u32>,
    pub debug: bool,
    pub log_level: String,
    pub cors_origins: Vec<String>,
    pub session_idle_timeout: Duration,
    pub max_lines_per_second: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ssh_key_path: PathBuf::from("/etc/loghoi/ssh_key"),
            elasticsearch_url: "http://localhost:9200".to_string(),
            backend_host: "0.0.0.0".to_string(),
            backend_port: 8080,
            host_uid: None,
            host_gid: None,
            debug: false,
            log_level: "info".to_string(),
            cors_origins: Vec::new(),
            session_idle_timeout: Duration::from_secs(300),
            max_lines_per_second: loghoi_stream::DEFAULT_MAX_LINES_PER_SECOND,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is set to {value:?}, which is not a valid {kind}")]
    Invalid {
        var: &'static str,
        value: String,
        kind: &'static str,
    },
}

impl Config {
    /// Load configuration from the process environment, falling back to
    /// [`Config::default`] for anything unset.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::load`] but sourced from an arbitrary lookup
    /// function, so tests can exercise variable parsing without mutating
    /// the real process environment.
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let ssh_key_path = lookup("SSH_KEY_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.ssh_key_path);

        let elasticsearch_url = lookup("ELASTICSEARCH_URL").unwrap_or(defaults.elasticsearch_url);
        let backend_host = lookup("BACKEND_HOST").unwrap_or(defaults.backend_host);

        let backend_port = match lookup("BACKEND_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                var: "BACKEND_PORT",
                value: raw,
                kind: "port number",
            })?,
            None => defaults.backend_port,
        };

        let host_uid = parse_optional_u32("HOST_UID", &lookup)?;
        let host_gid = parse_optional_u32("HOST_GID", &lookup)?;

        let debug = lookup("DEBUG")
            .map(|raw| matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.debug);

        let log_level = lookup("LOG_LEVEL").unwrap_or(defaults.log_level);

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or(defaults.cors_origins);

        Ok(Self {
            ssh_key_path,
            elasticsearch_url,
            backend_host,
            backend_port,
            host_uid,
            host_gid,
            debug,
            log_level,
            cors_origins,
            ..defaults
        })
    }
}

fn parse_optional_u32(
    var: &'static str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<Option<u32>, ConfigError> {
    match lookup(var) {
        Some(raw) => raw
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var,
                value: raw,
                kind: "unsigned integer",
            }),
        None => Ok(None),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
