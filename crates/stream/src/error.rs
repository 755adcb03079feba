// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the Stream Session Manager (C5).

use loghoi_core::id::SessionId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(SessionId),

    #[error("session {0} has a start/stop operation already in flight")]
    OperationInProgress(SessionId),

    #[error("ssh attach to {host} failed after retries: {source}")]
    SshAttachFailed {
        host: String,
        #[source]
        source: loghoi_remote::RemoteError,
    },

    #[error("session {0} already has an active monitor")]
    MonitorAlreadyRunning(SessionId),

    #[error("session {0} has no ssh channel attached")]
    NoSshChannel(SessionId),

    #[error("cannot {operation} for session {session} in its current state")]
    IllegalState {
        operation: &'static str,
        session: SessionId,
    },
}
