// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stream session state machine (entity only — ownership of the SSH
//! channel and monitor task lives in `loghoi-stream`; this module defines
//! the shape and the legal transitions so both that crate and tests can
//! reason about them without duplicating the state diagram).

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// The five states a session can occupy, per the component design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Connected,
    SshReady,
    Streaming,
    TornDown,
}

/// Errors returned when an operation is attempted from an illegal state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionTransitionError {
    #[error("cannot {operation} from state {from:?}")]
    IllegalTransition {
        operation: &'static str,
        from: SessionState,
    },
}

impl SessionState {
    /// Validate and compute the next state for `add_ssh` succeeding.
    pub fn on_ssh_attached(self) -> Result<SessionState, SessionTransitionError> {
        match self {
            SessionState::Connected | SessionState::SshReady => Ok(SessionState::SshReady),
            other => Err(SessionTransitionError::IllegalTransition {
                operation: "add_ssh",
                from: other,
            }),
        }
    }

    /// Validate and compute the next state for `start_monitor` succeeding.
    pub fn on_monitor_started(self) -> Result<SessionState, SessionTransitionError> {
        match self {
            SessionState::SshReady => Ok(SessionState::Streaming),
            other => Err(SessionTransitionError::IllegalTransition {
                operation: "start_monitor",
                from: other,
            }),
        }
    }

    /// Every state can be torn down; this transition never fails.
    pub fn on_torn_down(self) -> SessionState {
        SessionState::TornDown
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::TornDown)
    }
}

/// Bookkeeping timestamps for one session, independent of transport type.
#[derive(Debug, Clone)]
pub struct SessionTimestamps {
    pub connected_at: Instant,
    pub last_activity_at: Instant,
}

impl SessionTimestamps {
    pub fn new(now: Instant) -> Self {
        Self {
            connected_at: now,
            last_activity_at: now,
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_activity_at = now;
    }

    /// Whether an idle-timeout watcher should tear this session down,
    /// given it currently has no active monitor.
    pub fn is_idle_expired(&self, now: Instant, idle_timeout: std::time::Duration) -> bool {
        now.duration_since(self.connected_at) > idle_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_ssh_allowed_from_connected_and_ssh_ready() {
        assert_eq!(
            SessionState::Connected.on_ssh_attached().unwrap(),
            SessionState::SshReady
        );
        assert_eq!(
            SessionState::SshReady.on_ssh_attached().unwrap(),
            SessionState::SshReady
        );
    }

    #[test]
    fn add_ssh_rejected_from_streaming() {
        assert!(SessionState::Streaming.on_ssh_attached().is_err());
    }

    #[test]
    fn start_monitor_requires_ssh_ready() {
        assert!(SessionState::Connected.on_monitor_started().is_err());
        assert_eq!(
            SessionState::SshReady.on_monitor_started().unwrap(),
            SessionState::Streaming
        );
    }

    #[test]
    fn idle_expiry_boundary() {
        let now = Instant::now();
        let ts = SessionTimestamps::new(now);
        assert!(!ts.is_idle_expired(now, std::time::Duration::from_secs(300)));
    }

    #[test]
    fn torn_down_is_terminal() {
        assert!(SessionState::TornDown.is_terminal());
        assert!(!SessionState::Streaming.is_terminal());
    }
}
