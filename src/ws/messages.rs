//! Wire message types for the watch protocol.
//!
//! One JSON object per text frame. Commands are discriminated by `action`,
//! server messages by `type`.

use serde::{Deserialize, Serialize};

use crate::domain::WatchId;
use crate::watcher::ChangeRecord;

/// Commands that a client can send over the watch socket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ClientCommand {
    /// `{"action":"start"}` — open a new watch session on the process's
    /// watch root. Carries no payload.
    Start,
    /// `{"action":"stop","payload":{"watchId":"<id>"}}` — stop an existing
    /// watch session. Stopping an unknown id is a silent no-op.
    Stop {
        /// Command payload naming the target session.
        payload: StopPayload,
    },
}

/// Payload of a `stop` command.
#[derive(Debug, Clone, Deserialize)]
pub struct StopPayload {
    /// The session to stop.
    #[serde(rename = "watchId")]
    pub watch_id: WatchId,
}

/// Messages the server pushes to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// One filesystem change record, tagged with the session that saw it.
    #[serde(rename = "watch-data")]
    WatchData {
        /// The originating session.
        #[serde(rename = "watchId")]
        watch_id: WatchId,
        /// The change record, forwarded verbatim.
        data: ChangeRecord,
        /// Always `true` for delivered events.
        success: bool,
    },
    /// Acknowledgement that a session was stopped. Sent exactly once per
    /// stopped session.
    #[serde(rename = "watch-stop")]
    WatchStop {
        /// The stopped session.
        #[serde(rename = "watchId")]
        watch_id: WatchId,
        /// Always `true`.
        success: bool,
    },
    /// A `start` command failed; no session was created.
    #[serde(rename = "watch-error")]
    WatchError {
        /// Human-readable failure cause.
        message: String,
        /// Always `false`.
        success: bool,
    },
}

impl ServerMessage {
    /// Builds a `watch-data` message for one change record.
    #[must_use]
    pub fn watch_data(watch_id: WatchId, data: ChangeRecord) -> Self {
        Self::WatchData {
            watch_id,
            data,
            success: true,
        }
    }

    /// Builds the `watch-stop` acknowledgement for a stopped session.
    #[must_use]
    pub fn watch_stop(watch_id: WatchId) -> Self {
        Self::WatchStop {
            watch_id,
            success: true,
        }
    }

    /// Builds a `watch-error` report.
    #[must_use]
    pub fn watch_error(message: impl Into<String>) -> Self {
        Self::WatchError {
            message: message.into(),
            success: false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::watcher::ChangeKind;

    #[test]
    fn start_parses_without_payload() {
        let parsed = serde_json::from_str::<ClientCommand>(r#"{"action":"start"}"#);
        assert!(matches!(parsed, Ok(ClientCommand::Start)));
    }

    #[test]
    fn stop_parses_watch_id() {
        let id = WatchId::new();
        let raw = format!(r#"{{"action":"stop","payload":{{"watchId":"{id}"}}}}"#);
        let parsed = serde_json::from_str::<ClientCommand>(&raw);
        let Ok(ClientCommand::Stop { payload }) = parsed else {
            panic!("expected stop command");
        };
        assert_eq!(payload.watch_id, id);
    }

    #[test]
    fn unknown_action_is_rejected() {
        let parsed = serde_json::from_str::<ClientCommand>(r#"{"action":"restart"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn stop_without_payload_is_rejected() {
        let parsed = serde_json::from_str::<ClientCommand>(r#"{"action":"stop"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn watch_data_wire_shape() {
        let id = WatchId::new();
        let record = ChangeRecord {
            action: ChangeKind::Created,
            path: "/tmp/project/new.txt".into(),
        };
        let Ok(json) = serde_json::to_value(ServerMessage::watch_data(id, record)) else {
            panic!("serialization failed");
        };
        assert_eq!(json["type"], "watch-data");
        assert_eq!(json["watchId"], id.to_string());
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["action"], "created");
    }

    #[test]
    fn watch_stop_wire_shape() {
        let id = WatchId::new();
        let Ok(json) = serde_json::to_value(ServerMessage::watch_stop(id)) else {
            panic!("serialization failed");
        };
        assert_eq!(json["type"], "watch-stop");
        assert_eq!(json["watchId"], id.to_string());
        assert_eq!(json["success"], true);
    }

    #[test]
    fn watch_error_wire_shape() {
        let Ok(json) = serde_json::to_value(ServerMessage::watch_error("boom")) else {
            panic!("serialization failed");
        };
        assert_eq!(json["type"], "watch-error");
        assert_eq!(json["message"], "boom");
        assert_eq!(json["success"], false);
    }
}
