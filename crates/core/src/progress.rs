// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress reporting for a running collection job.

use serde::{Deserialize, Serialize};

/// The ordered stages a collection job passes through. Stages never
/// repeat and never run out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Logfiles,
    Commands,
    Zip,
    Done,
}

impl Stage {
    fn index(self) -> u8 {
        match self {
            Stage::Logfiles => 0,
            Stage::Commands => 1,
            Stage::Zip => 2,
            Stage::Done => 3,
        }
    }
}

/// `(stage, current, total, message)` snapshot emitted as a job progresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressDescriptor {
    pub stage: Stage,
    pub current: u64,
    pub total: u64,
    pub message: String,
}

impl ProgressDescriptor {
    pub fn new(stage: Stage, current: u64, total: u64, message: impl Into<String>) -> Self {
        Self {
            stage,
            current,
            total,
            message: message.into(),
        }
    }

    /// Validate that `next` is a legal successor to `self`: stage never
    /// goes backwards, and within a stage `current` never decreases.
    pub fn validate_transition(&self, next: &ProgressDescriptor) -> Result<(), ProgressError> {
        if next.stage.index() < self.stage.index() {
            return Err(ProgressError::StageRegressed {
                from: self.stage,
                to: next.stage,
            });
        }
        if next.stage == self.stage && next.current < self.current {
            return Err(ProgressError::CurrentRegressed {
                stage: self.stage,
                from: self.current,
                to: next.current,
            });
        }
        if next.current > next.total {
            return Err(ProgressError::CurrentExceedsTotal {
                current: next.current,
                total: next.total,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressError {
    #[error("stage regressed from {from:?} to {to:?}")]
    StageRegressed { from: Stage, to: Stage },
    #[error("current regressed within stage {stage:?}: {from} -> {to}")]
    CurrentRegressed { stage: Stage, from: u64, to: u64 },
    #[error("current {current} exceeds total {total}")]
    CurrentExceedsTotal { current: u64, total: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_progression_is_monotonic() {
        let a = ProgressDescriptor::new(Stage::Logfiles, 0, 5, "start");
        let b = ProgressDescriptor::new(Stage::Logfiles, 3, 5, "mid");
        assert!(a.validate_transition(&b).is_ok());

        let c = ProgressDescriptor::new(Stage::Commands, 0, 2, "commands");
        assert!(b.validate_transition(&c).is_ok());
    }

    #[test]
    fn stage_cannot_regress() {
        let a = ProgressDescriptor::new(Stage::Commands, 0, 2, "commands");
        let b = ProgressDescriptor::new(Stage::Logfiles, 1, 5, "back");
        assert!(a.validate_transition(&b).is_err());
    }

    #[test]
    fn current_cannot_regress_within_stage() {
        let a = ProgressDescriptor::new(Stage::Logfiles, 3, 5, "mid");
        let b = ProgressDescriptor::new(Stage::Logfiles, 1, 5, "back");
        assert!(a.validate_transition(&b).is_err());
    }

    #[test]
    fn current_cannot_exceed_total() {
        let a = ProgressDescriptor::new(Stage::Logfiles, 0, 5, "start");
        let b = ProgressDescriptor::new(Stage::Logfiles, 6, 5, "over");
        assert!(a.validate_transition(&b).is_err());
    }
}
