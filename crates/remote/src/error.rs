// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the Remote Executor (C1).

use thiserror::Error;

/// Errors surfaced by [`crate::RemoteExecutor`] operations.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The preconfigured private key could not be loaded.
    #[error("failed to load SSH private key: {0}")]
    Key(String),

    /// Authentication was rejected by the remote host. Carries a
    /// human-actionable hint so the Query/Job layers can surface it
    /// without guessing at remediation text.
    #[error("SSH authentication failed for {host}: {hint}")]
    Auth { host: String, hint: String },

    /// The connect attempt exceeded the 10-second budget.
    #[error("SSH connect to {host} timed out after {seconds}s")]
    Timeout { host: String, seconds: u64 },

    /// A channel operation failed after the channel was established.
    #[error("SSH channel error: {0}")]
    Channel(String),

    /// Every tier of the fetch fallback chain failed.
    #[error("fetch of {remote_path} failed on all transports: {attempts}")]
    FetchExhausted {
        remote_path: String,
        attempts: String,
    },

    /// The referenced channel id is not known to this executor.
    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RemoteError {
    /// A short, operator-facing remediation hint for auth failures,
    /// matching the "register the public key in Prism" guidance the
    /// Query Service is required to surface (spec S2).
    pub fn auth_hint(host: impl Into<String>) -> Self {
        RemoteError::Auth {
            host: host.into(),
            hint: "SSH_AUTH_ERROR: register this host's public key in Prism \
                   (Settings > Cluster Lockdown) and retry"
                .to_string(),
        }
    }
}
