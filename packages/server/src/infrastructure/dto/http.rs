//! HTTP API DTOs for the relay.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Publish request sent by the persistence service.
///
/// Both fields are optional at the wire level so that a missing field is
/// reported as an invalid request rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequestDto {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub message: Option<Value>,
}

/// Publish acknowledgment: accepted for best-effort delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishAcceptedDto {
    pub status: String,
}

/// Room summary for list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub id: String,
    pub members: Vec<String>,
    pub created_at: String, // ISO 8601
}

/// Room detail for detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDetailDto {
    pub id: String,
    pub members: Vec<MemberDetailDto>,
    pub created_at: String, // ISO 8601
}

/// Member detail for room detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDetailDto {
    pub connection_id: String,
    pub connected_at: String, // ISO 8601
}

/// Live membership totals. Counters are served by `/metrics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsDto {
    pub connections: usize,
    pub rooms: usize,
}
