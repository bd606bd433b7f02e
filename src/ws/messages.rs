//! WebSocket message types: envelope, commands, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::CampaignId;

/// Campaign id that subscribes to every campaign.
pub const WILDCARD: &str = "*";

/// Top-level WebSocket message envelope.
///
/// ```json
/// {
///   "id": "c1",
///   "type": "command",
///   "timestamp": "2026-10-16T09:00:00Z",
///   "payload": { "command": "subscribe", "campaign_ids": ["*"] }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    #[serde(default)]
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server message stamped with the current time.
    #[must_use]
    pub fn new(id: String, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id,
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an error reply.
    #[must_use]
    pub fn error(id: String, code: u16, message: &str) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message }),
        )
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands that a client can send over WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Subscribe to events for specific campaigns.
    Subscribe {
        /// Campaign IDs to subscribe to. Use `["*"]` for all campaigns.
        campaign_ids: Vec<String>,
    },
    /// Unsubscribe from events for specific campaigns.
    Unsubscribe {
        /// Campaign IDs to unsubscribe from. `"*"` drops the wildcard.
        campaign_ids: Vec<String>,
    },
}

/// Campaign ids parsed from a command, with the wildcard split out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignSelection {
    /// Parsed campaign ids.
    pub ids: Vec<CampaignId>,
    /// `true` if `"*"` was present.
    pub wildcard: bool,
    /// Entries that were neither a UUID nor `"*"`.
    pub invalid: Vec<String>,
}

impl CampaignSelection {
    /// Splits raw command ids into campaign ids, the wildcard, and
    /// rejects.
    #[must_use]
    pub fn parse(raw: &[String]) -> Self {
        let mut selection = Self::default();
        for entry in raw {
            if entry == WILDCARD {
                selection.wildcard = true;
            } else if let Ok(uuid) = entry.parse::<uuid::Uuid>() {
                selection.ids.push(CampaignId::from_uuid(uuid));
            } else {
                selection.invalid.push(entry.clone());
            }
        }
        selection
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_subscribe_command() {
        let payload = serde_json::json!({
            "command": "subscribe",
            "campaign_ids": ["*"]
        });
        let Ok(WsCommand::Subscribe { campaign_ids }) = serde_json::from_value(payload) else {
            panic!("expected subscribe command");
        };
        assert_eq!(campaign_ids, vec!["*".to_string()]);
    }

    #[test]
    fn selection_splits_wildcard_and_rejects() {
        let id = uuid::Uuid::new_v4();
        let raw = vec![id.to_string(), "*".to_string(), "nope".to_string()];
        let selection = CampaignSelection::parse(&raw);
        assert_eq!(selection.ids, vec![CampaignId::from_uuid(id)]);
        assert!(selection.wildcard);
        assert_eq!(selection.invalid, vec!["nope".to_string()]);
    }

    #[test]
    fn envelope_defaults_missing_fields() {
        let text = r#"{"type":"command","payload":{"command":"unsubscribe","campaign_ids":[]}}"#;
        let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
            panic!("expected envelope to parse");
        };
        assert!(msg.id.is_empty());
        assert_eq!(msg.msg_type, WsMessageType::Command);
    }
}
