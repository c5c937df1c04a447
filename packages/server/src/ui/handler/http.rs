//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
};
use metrics::counter;
use parley_shared::time::timestamp_to_jst_rfc3339;
use serde_json::Value;
use subtle::ConstantTimeEq;

use crate::{
    config::RelayConfig,
    domain::RoomKey,
    infrastructure::dto::{
        http::{
            MemberDetailDto, PublishAcceptedDto, PublishRequestDto, RoomDetailDto, RoomSummaryDto,
            StatsDto,
        },
        websocket::ServerEvent,
    },
    ui::{error::ApiError, state::AppState},
    usecase::{PublishCommand, PublishMessageUseCase, metrics::PUBLISHES_TOTAL},
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Ingestion endpoint: the persistence service hands off a newly stored message.
///
/// `202 Accepted` means accepted for best-effort delivery, not delivered.
/// `conversationId` must be non-empty and at most 128 bytes; longer ids are
/// rejected with `400` since no client could have joined such a room.
pub async fn publish_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<PublishRequestDto>, JsonRejection>,
) -> Result<(StatusCode, Json<PublishAcceptedDto>), ApiError> {
    if let Err(e) = authorize_ingest(&state.config, &headers) {
        counter!(PUBLISHES_TOTAL, "outcome" => "unauthorized").increment(1);
        tracing::warn!("publish rejected: missing or invalid ingest token");
        return Err(e);
    }

    let Json(request) = body.map_err(|rejection| {
        counter!(PUBLISHES_TOTAL, "outcome" => "rejected").increment(1);
        tracing::warn!(error = %rejection.body_text(), "publish rejected: malformed body");
        ApiError::invalid_request(rejection.body_text())
    })?;

    let usecase = PublishMessageUseCase::new(state.router.clone(), encode_new_message);
    usecase
        .execute(PublishCommand {
            conversation_id: request.conversation_id,
            message: request.message,
        })
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(PublishAcceptedDto {
            status: "accepted".to_string(),
        }),
    ))
}

/// Wrap a published payload into the `new_message` frame pushed to members.
fn encode_new_message(message: Value) -> Result<String, serde_json::Error> {
    ServerEvent::NewMessage(message).to_frame()
}

/// Check the bearer token when an ingest token is configured.
fn authorize_ingest(config: &RelayConfig, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = config.ingest_token.as_deref() else {
        return Ok(());
    };
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    // Length differences still short-circuit; the secret's content does not.
    match presented {
        Some(token) if bool::from(token.as_bytes().ct_eq(expected.as_bytes())) => Ok(()),
        _ => Err(ApiError::unauthorized("A valid ingest token is required")),
    }
}

/// Get list of rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.router.list_rooms().await;

    let summaries = rooms
        .into_iter()
        .map(|room| RoomSummaryDto {
            id: room.key.as_str().to_string(),
            members: room.members.iter().map(|id| id.to_string()).collect(),
            created_at: timestamp_to_jst_rfc3339(room.created_at.value()),
        })
        .collect();

    Json(summaries)
}

/// Get room detail by key
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_key): Path<String>,
) -> Result<Json<RoomDetailDto>, ApiError> {
    let not_found = || ApiError::not_found(format!("Room '{room_key}' not found"));

    let key = RoomKey::new(room_key.clone()).map_err(|_| not_found())?;
    let room = state.router.get_room(&key).await.ok_or_else(not_found)?;

    let mut members = Vec::with_capacity(room.members.len());
    for id in &room.members {
        // A member may disconnect between the two lookups.
        if let Some(connection) = state.registry.get_connection(id).await {
            members.push(MemberDetailDto {
                connection_id: id.to_string(),
                connected_at: timestamp_to_jst_rfc3339(connection.connected_at.value()),
            });
        }
    }

    Ok(Json(RoomDetailDto {
        id: room.key.as_str().to_string(),
        members,
        created_at: timestamp_to_jst_rfc3339(room.created_at.value()),
    }))
}

/// Live membership totals
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsDto> {
    Json(StatsDto {
        connections: state.registry.count_connections().await,
        rooms: state.router.list_rooms().await.len(),
    })
}

/// Relay counters in Prometheus text format
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics.render()
}
