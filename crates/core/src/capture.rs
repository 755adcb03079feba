// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative description of one artifact a collection job gathers.

use serde::{Deserialize, Serialize};

/// One item in a collection run: either a remote file to fetch or a
/// command whose stdout is captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaptureItem {
    FileCapture { remote_path: String },
    CommandCapture { name: String, command: String },
}

/// On-disk shape of `col_logfile.json`: `{"LOGFILE_LIST": [{"src_path": "..."}]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct LogfileListFile {
    #[serde(rename = "LOGFILE_LIST")]
    pub logfile_list: Vec<LogfileEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogfileEntry {
    pub src_path: String,
}

/// On-disk shape of `col_command.json`: `{"COMMAND_LIST": [{"name": ..., "command": ...}]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandListFile {
    #[serde(rename = "COMMAND_LIST")]
    pub command_list: Vec<CommandEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandEntry {
    pub name: String,
    pub command: String,
}

impl From<LogfileEntry> for CaptureItem {
    fn from(e: LogfileEntry) -> Self {
        CaptureItem::FileCapture {
            remote_path: e.src_path,
        }
    }
}

impl From<CommandEntry> for CaptureItem {
    fn from(e: CommandEntry) -> Self {
        CaptureItem::CommandCapture {
            name: e.name,
            command: e.command,
        }
    }
}
