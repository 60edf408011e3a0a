//! Admin bridge wire messages
//! JSON objects tagged by `type`

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::anticheat::{Escalation, Recommendation, ViolationSource};
use crate::world::PlayerId;

/// Messages sent from an admin client to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdminClientMsg {
    /// Run an admin command line, e.g. `check <player>`
    Command { line: String },

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },
}

/// Messages sent from the server to admin clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdminServerMsg {
    /// Sent once after the socket opens
    Welcome { server_time: u64, uptime_secs: u64 },

    /// Reply to a command
    CommandResult {
        line: String,
        ok: bool,
        output: String,
    },

    /// Pong response
    Pong {
        /// Echo of client timestamp
        t: u64,
        server_time: u64,
    },

    /// Pushed whenever a player crosses a violation ceiling
    Escalation {
        player: PlayerId,
        source: ViolationSource,
        violations: u32,
        reason: String,
        recommendation: Recommendation,
        at: DateTime<Utc>,
    },

    /// Malformed or refused message
    Error { message: String },
}

impl From<&Escalation> for AdminServerMsg {
    fn from(event: &Escalation) -> Self {
        let at = Utc
            .timestamp_millis_opt(event.at_millis as i64)
            .single()
            .unwrap_or_else(Utc::now);
        AdminServerMsg::Escalation {
            player: event.player,
            source: event.source,
            violations: event.violations,
            reason: event.reason.clone(),
            recommendation: event.recommendation,
            at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn client_messages_are_type_tagged() {
        let msg: AdminClientMsg =
            serde_json::from_str(r#"{"type":"command","line":"status"}"#).unwrap();
        assert_eq!(msg, AdminClientMsg::Command { line: "status".into() });

        let msg: AdminClientMsg = serde_json::from_str(r#"{"type":"ping","t":42}"#).unwrap();
        assert_eq!(msg, AdminClientMsg::Ping { t: 42 });

        assert!(serde_json::from_str::<AdminClientMsg>(r#"{"type":"kick"}"#).is_err());
    }

    #[test]
    fn escalation_carries_timestamp() {
        let event = Escalation {
            player: Uuid::nil(),
            source: ViolationSource::Movement,
            violations: 21,
            reason: "hovering for 30 ticks".into(),
            recommendation: Recommendation::Remove,
            at_millis: 1_700_000_000_000,
        };
        let json = serde_json::to_value(AdminServerMsg::from(&event)).unwrap();
        assert_eq!(json["type"], "escalation");
        assert_eq!(json["source"], "movement");
        assert_eq!(json["recommendation"], "remove");
        assert_eq!(json["violations"], 21);
        assert!(json["at"].as_str().unwrap().starts_with("2023-11-14T22:13:20"));
    }
}
