// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collection job identifier and state machine.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::JobId;
use crate::progress::ProgressDescriptor;

/// Lifecycle state of a [`CollectionJob`]. Transitions are monotonic and
/// form a DAG: `Pending -> Running -> {Completed | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Pending, JobState::Running)
                | (JobState::Running, JobState::Completed)
                | (JobState::Running, JobState::Failed)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("illegal job transition from {from:?} to {to:?}")]
pub struct JobTransitionError {
    pub from: JobState,
    pub to: JobState,
}

/// A single background bulk-collection job against one CVM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionJob {
    pub id: JobId,
    pub target_cvm: String,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub folder_name: String,
    pub progress: ProgressDescriptor,
    pub archive_path: Option<PathBuf>,
    pub error_message: Option<String>,
}

impl CollectionJob {
    pub fn new(id: JobId, target_cvm: impl Into<String>, folder_name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            target_cvm: target_cvm.into(),
            state: JobState::Pending,
            created_at: now,
            started_at: None,
            completed_at: None,
            folder_name: folder_name.into(),
            progress: ProgressDescriptor::new(crate::progress::Stage::Logfiles, 0, 0, "pending"),
            archive_path: None,
            error_message: None,
        }
    }

    /// Transition `Pending -> Running`, recording `started_at`.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), JobTransitionError> {
        self.transition(JobState::Running)?;
        self.started_at = Some(now);
        Ok(())
    }

    /// Transition `Running -> Completed`, recording `completed_at` and the
    /// archive path. Per the invariant, `archive_path` is set iff the
    /// state is `Completed`.
    pub fn complete(&mut self, archive_path: PathBuf, now: DateTime<Utc>) -> Result<(), JobTransitionError> {
        self.transition(JobState::Completed)?;
        self.completed_at = Some(now);
        self.archive_path = Some(archive_path);
        Ok(())
    }

    /// Transition `Running -> Failed`, recording `completed_at` and the
    /// error message.
    pub fn fail(&mut self, message: impl Into<String>, now: DateTime<Utc>) -> Result<(), JobTransitionError> {
        self.transition(JobState::Failed)?;
        self.completed_at = Some(now);
        self.error_message = Some(message.into());
        Ok(())
    }

    fn transition(&mut self, next: JobState) -> Result<(), JobTransitionError> {
        if !self.state.can_transition_to(next) {
            return Err(JobTransitionError {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
