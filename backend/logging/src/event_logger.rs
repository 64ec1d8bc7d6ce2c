//! Client events written through `tracing` to the NDJSON log.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::{redact_sensitive_data, redact_user_id};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    Authorize {
        module: String,
        mode: String,
        count: u32,
        decision: String,
    },
    Consume {
        usage_id: String,
        module: String,
        points: i64,
        ok: bool,
    },
    Purchase {
        pack_id: u32,
        ok: bool,
        message: String,
    },
    StreamCompleted {
        agent: String,
        chars: usize,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub user: String,
    pub timestamp: DateTime<Utc>,
    pub event: ClientEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Redact and emit one event. Returns the entry that was logged.
    pub fn log_event(user_id: &str, mut event: ClientEvent) -> EventLogEntry {
        match &mut event {
            ClientEvent::Purchase { message, .. } => *message = redact_sensitive_data(message),
            _ => {}
        }

        let entry = EventLogEntry { user: redact_user_id(user_id), timestamp: Utc::now(), event };
        match serde_json::to_string(&entry) {
            Ok(json) => info!(target: "client_events", event = %json, "Client event"),
            Err(_) => info!(target: "client_events", event = ?entry, "Client event"),
        }
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_redacted() {
        let entry = EventLogger::log_event(
            "web-abc123",
            ClientEvent::Purchase {
                pack_id: 3,
                ok: false,
                message: "token=deadbeef rejected".into(),
            },
        );
        assert_eq!(entry.user, "web-****");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["event"]["type"], "purchase");
        assert!(!json["event"]["message"].as_str().unwrap().contains("deadbeef"));
    }
}
