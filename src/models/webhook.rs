//! Payment-webhook envelope and acknowledgement

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event type sent by the harness. Receivers must acknowledge unknown types.
pub const PROBE_EVENT_TYPE: &str = "test.event";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Value,
}

impl WebhookEvent {
    /// Harmless event the receiver is expected to acknowledge and ignore
    pub fn probe(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            data: serde_json::json!({ "test": true }),
        }
    }
}

/// Receiver acknowledgement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    #[serde(default)]
    pub received: bool,
}
