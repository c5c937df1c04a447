//! WebSocket message DTOs for the relay.
//!
//! Frames are JSON text, adjacently tagged: `{"type": "...", "data": ...}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events sent by clients to the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Join the room of a conversation
    JoinConversation(String),
    /// Leave the room of a conversation
    LeaveConversation(String),
}

/// Events pushed by the relay to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// First frame on every connection
    Connected(ConnectedPayload),
    JoinedConversation(String),
    LeftConversation(String),
    /// A message published through the ingestion endpoint, passed through untouched
    NewMessage(Value),
    Error(ErrorPayload),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedPayload {
    pub connection_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            message: message.into(),
        })
    }

    /// Encode as a text frame.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
