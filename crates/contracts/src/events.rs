// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Push-channel event shapes for the `tail -f` protocol (§6). The channel
//! itself (WebSocket or equivalent) is out of scope here; this module only
//! fixes the payload each event carries.

use serde::{Deserialize, Serialize};

/// Events an operator's client sends inbound.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    Connect,
    StartTailF {
        cvm_ip: String,
        log_path: String,
        log_name: String,
    },
    StopTailF,
    Heartbeat,
    Disconnect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TailFStatus {
    Started,
    Stopped,
    Error,
}

/// Events the server pushes outbound.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    Log {
        name: String,
        line: String,
        line_number: u64,
        timestamp: String,
    },
    TailFStatus {
        status: TailFStatus,
        message: String,
    },
    Disconnect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_event_start_tail_f_deserializes_from_tagged_json() {
        let raw = serde_json::json!({
            "event": "start_tail_f",
            "data": {"cvm_ip": "10.0.0.5", "log_path": "/var/log/messages", "log_name": "messages"}
        });
        let event: ClientEvent = serde_json::from_value(raw).unwrap();
        assert!(matches!(event, ClientEvent::StartTailF { cvm_ip, .. } if cvm_ip == "10.0.0.5"));
    }

    #[test]
    fn client_event_heartbeat_has_no_data() {
        let raw = serde_json::json!({"event": "heartbeat"});
        let event: ClientEvent = serde_json::from_value(raw).unwrap();
        assert!(matches!(event, ClientEvent::Heartbeat));
    }

    #[test]
    fn server_event_log_serializes_with_tag_and_data() {
        let event = ServerEvent::Log {
            name: "messages".to_string(),
            line: "hello".to_string(),
            line_number: 1,
            timestamp: "2026-07-28T00:00:00".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "log");
        assert_eq!(value["data"]["line"], "hello");
    }

    #[test]
    fn server_event_tail_f_status_serializes_status_as_string() {
        let event = ServerEvent::TailFStatus {
            status: TailFStatus::Started,
            message: "ok".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["data"]["status"], "started");
    }
}
