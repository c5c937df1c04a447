//! Test fixtures for integration tests.
//!
//! Starts an in-process relay on an ephemeral port and provides small
//! WebSocket client helpers.

#![allow(dead_code)]

use std::{net::SocketAddr, time::Duration};

use futures_util::{SinkExt, StreamExt};
use parley_server::{AppState, RelayConfig, infrastructure::metrics::detached_handle, serve};
use serde_json::Value;
use tokio::{net::TcpListener, net::TcpStream, sync::oneshot};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long a helper waits for an expected event
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Test server that runs in-process and shuts down when dropped
pub struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Start a relay with the default configuration
    pub async fn start() -> Self {
        Self::start_with(RelayConfig::default()).await
    }

    /// Start a relay with a custom configuration
    ///
    /// `config.addr` is ignored; the server always binds an ephemeral port.
    pub async fn start_with(config: RelayConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(serve(listener, AppState::new(config, detached_handle()), async move {
            let _ = shutdown_rx.await;
        }));

        Self {
            addr,
            shutdown: Some(shutdown_tx),
        }
    }

    /// Get the base URL for HTTP requests
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the WebSocket endpoint URL
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Publish a message through the ingestion endpoint and return the status code
    pub async fn publish(&self, conversation_id: &str, message: Value) -> u16 {
        reqwest::Client::new()
            .post(format!("{}/api/messages", self.base_url()))
            .json(&serde_json::json!({
                "conversationId": conversation_id,
                "message": message,
            }))
            .send()
            .await
            .expect("Failed to send publish request")
            .status()
            .as_u16()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Connect a client and consume the `connected` greeting.
///
/// Returns the client and its connection id.
pub async fn connect(url: &str) -> (WsClient, String) {
    let (mut ws, _) = connect_async(url).await.expect("Failed to connect");
    let greeting = recv_event(&mut ws).await;
    assert_eq!(greeting["type"], "connected");
    let id = greeting["data"]["connection_id"]
        .as_str()
        .expect("connected event carries a connection id")
        .to_string();
    (ws, id)
}

/// Send a client event frame
pub async fn send_event(ws: &mut WsClient, event: Value) {
    ws.send(Message::text(event.to_string()))
        .await
        .expect("Failed to send event");
}

/// Join a room and wait for the acknowledgement
pub async fn join(ws: &mut WsClient, conversation_id: &str) {
    send_event(
        ws,
        serde_json::json!({"type": "join_conversation", "data": conversation_id}),
    )
    .await;
    let ack = recv_event(ws).await;
    assert_eq!(ack["type"], "joined_conversation");
    assert_eq!(ack["data"], conversation_id);
}

/// Receive the next server event, failing after [`RECV_TIMEOUT`]
pub async fn recv_event(ws: &mut WsClient) -> Value {
    try_recv_event(ws, RECV_TIMEOUT)
        .await
        .expect("Timed out waiting for server event")
}

/// Receive the next server event if one arrives within `wait`
pub async fn try_recv_event(ws: &mut WsClient, wait: Duration) -> Option<Value> {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let next = tokio::time::timeout_at(deadline, ws.next()).await.ok()??;
        match next.ok()? {
            Message::Text(text) => {
                return Some(serde_json::from_str(text.as_str()).expect("Server sent invalid JSON"));
            }
            Message::Close(_) => return None,
            _ => continue,
        }
    }
}
