// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loads the static capture-list configuration (`col_logfile.json` and
//! `col_command.json` in the original service) into [`CaptureItem`]s.

use std::path::Path;

use loghoi_core::capture::{CaptureItem, CommandListFile, LogfileListFile};

use crate::error::JobError;

/// Load and flatten both configuration files into one ordered capture
/// list: every file capture first, then every command capture, matching
/// the stage ordering the job algorithm runs in.
pub fn load_capture_list(
    logfile_config: &Path,
    command_config: &Path,
) -> Result<(Vec<CaptureItem>, Vec<CaptureItem>), JobError> {
    let logfile_raw = std::fs::read_to_string(logfile_config)
        .map_err(|e| JobError::CaptureListConfig(format!("{}: {e}", logfile_config.display())))?;
    let logfiles: LogfileListFile = serde_json::from_str(&logfile_raw)
        .map_err(|e| JobError::CaptureListConfig(format!("{}: {e}", logfile_config.display())))?;

    let command_raw = std::fs::read_to_string(command_config)
        .map_err(|e| JobError::CaptureListConfig(format!("{}: {e}", command_config.display())))?;
    let commands: CommandListFile = serde_json::from_str(&command_raw)
        .map_err(|e| JobError::CaptureListConfig(format!("{}: {e}", command_config.display())))?;

    let file_items = logfiles
        .logfile_list
        .into_iter()
        .map(CaptureItem::from)
        .collect();
    let command_items = commands
        .command_list
        .into_iter()
        .map(CaptureItem::from)
        .collect();

    Ok((file_items, command_items))
}

#[cfg(test)]
#[path = "capture_config_tests.rs"]
mod tests;
