//! WebSocket connection handlers.
//!
//! Each connection runs two tasks: a reader that turns client frames into
//! join/leave use cases, and a writer that drains the connection's bounded
//! outbound queue to the socket. The router only ever touches the queue, so a
//! stalled socket never blocks a broadcast. When the relay drops a connection
//! its close token fires and the writer gives up, even mid-write.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, ConnectionIdFactory, OutboundSender},
    infrastructure::dto::websocket::{ClientEvent, ConnectedPayload, ServerEvent},
    ui::state::AppState,
    usecase::{
        ConnectClientUseCase, DisconnectClientUseCase, JoinConversationUseCase,
        LeaveConversationUseCase,
    },
};

/// How long the writer waits to deliver a close frame before dropping the socket.
const CLOSE_FRAME_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    // A non-UTF-8 origin never matches the allow-list.
    let origin = headers
        .get(header::ORIGIN)
        .map(|value| value.to_str().unwrap_or_default());
    if !state.config.origin_allowed(origin) {
        tracing::warn!(origin = ?origin, "Rejecting connection from disallowed origin");
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionIdFactory::generate();
    let (tx, mut rx) = mpsc::channel::<String>(state.config.outbound_buffer);
    let outbox = OutboundSender::new(tx);
    let closed = outbox.close_token();
    let (mut sender, mut receiver) = socket.split();

    // Queue the greeting before registering so that it precedes any broadcast.
    let greeting = ServerEvent::Connected(ConnectedPayload {
        connection_id: connection_id.to_string(),
    });
    match greeting.to_frame() {
        Ok(frame) => {
            let _ = outbox.try_send(frame);
        }
        Err(e) => tracing::warn!("Failed to encode connected event: {}", e),
    }

    // The registry holds the only strong sender; replies go through a weak
    // handle so that eviction closes the queue and ends the writer.
    let replies = outbox.downgrade();

    let connect_usecase = ConnectClientUseCase::new(state.registry.clone());
    if let Err(e) = connect_usecase.execute(connection_id.clone(), outbox).await {
        if let Ok(frame) = ServerEvent::error(e.to_string()).to_frame() {
            let _ = sender.send(Message::Text(frame.into())).await;
        }
        let _ = sender.send(Message::Close(None)).await;
        return;
    }

    let recv_state = state.clone();
    let recv_connection_id = connection_id.clone();

    // Spawn a task to receive events from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!(connection_id = %recv_connection_id, "WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let reply =
                        handle_client_text(&recv_state, &recv_connection_id, text.as_str()).await;
                    send_reply(&replies, &recv_connection_id, &reply);
                }
                Message::Binary(_) => {
                    let reply = ServerEvent::error("Binary frames are not supported");
                    send_reply(&replies, &recv_connection_id, &reply);
                }
                Message::Close(_) => {
                    tracing::info!(connection_id = %recv_connection_id, "Client requested close");
                    break;
                }
                // Ping/pong is handled automatically by the WebSocket protocol
                _ => {}
            }
        }
    });

    // Spawn a task to drain the outbound queue to this client
    let send_connection_id = connection_id.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                biased;
                _ = closed.cancelled() => break,
                frame = rx.recv() => match frame {
                    Some(frame) => frame,
                    None => break,
                },
            };
            tokio::select! {
                biased;
                _ = closed.cancelled() => break,
                result = sender.send(Message::Text(frame.into())) => {
                    if result.is_err() {
                        break;
                    }
                }
            }
        }
        if closed.is_cancelled() {
            tracing::info!(connection_id = %send_connection_id, "Connection dropped by relay");
        }
        let _ = tokio::time::timeout(CLOSE_FRAME_TIMEOUT, sender.send(Message::Close(None))).await;
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    let disconnect_usecase = DisconnectClientUseCase::new(state.registry.clone());
    disconnect_usecase.execute(&connection_id).await;
}

/// Apply one client text frame and build the reply to push back.
pub async fn handle_client_text(
    state: &AppState,
    connection_id: &ConnectionId,
    text: &str,
) -> ServerEvent {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(%connection_id, "Failed to parse client event: {}", e);
            return ServerEvent::error(format!("Malformed event: {e}"));
        }
    };

    match event {
        ClientEvent::JoinConversation(conversation_id) => {
            let usecase = JoinConversationUseCase::new(state.router.clone());
            match usecase.execute(connection_id, conversation_id).await {
                Ok((key, _)) => ServerEvent::JoinedConversation(key.into_string()),
                Err(e) => ServerEvent::error(e.to_string()),
            }
        }
        ClientEvent::LeaveConversation(conversation_id) => {
            let usecase = LeaveConversationUseCase::new(state.router.clone());
            match usecase.execute(connection_id, conversation_id).await {
                Ok((key, _)) => ServerEvent::LeftConversation(key.into_string()),
                Err(e) => ServerEvent::error(e.to_string()),
            }
        }
    }
}

/// Push a reply into the connection's own queue. Replies are optional: a
/// full or closed queue drops them.
fn send_reply(replies: &mpsc::WeakSender<String>, connection_id: &ConnectionId, reply: &ServerEvent) {
    let Some(outbox) = replies.upgrade() else {
        return;
    };
    match reply.to_frame() {
        Ok(frame) => {
            if outbox.try_send(frame).is_err() {
                tracing::debug!(%connection_id, "Dropped reply, outbound queue unavailable");
            }
        }
        Err(e) => tracing::warn!(%connection_id, "Failed to encode reply: {}", e),
    }
}
