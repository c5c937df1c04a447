//! End-to-end relay tests.
//!
//! Real WebSocket clients join rooms while messages are handed off through
//! the ingestion endpoint.

mod fixtures;

use std::time::Duration;

use fixtures::{TestServer, connect, join, recv_event, send_event, try_recv_event};
use futures_util::SinkExt;
use parley_server::RelayConfig;
use serde_json::{Value, json};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, client::IntoClientRequest, http::HeaderValue},
};

const SILENCE: Duration = Duration::from_millis(300);

#[tokio::test]
async fn test_connected_event_carries_connection_id() {
    // テスト項目: 接続直後に connected イベントで接続 ID が通知される
    let server = TestServer::start().await;

    let (_ws, connection_id) = connect(&server.ws_url()).await;

    assert!(uuid::Uuid::parse_str(&connection_id).is_ok());
}

#[tokio::test]
async fn test_fan_out_to_room_members_only() {
    // テスト項目: publish はルームのメンバー全員に届き、非メンバーには届かない
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, _) = connect(&server.ws_url()).await;
    let (mut bob, _) = connect(&server.ws_url()).await;
    let (mut carol, _) = connect(&server.ws_url()).await;
    join(&mut alice, "conv-42").await;
    join(&mut bob, "conv-42").await;
    join(&mut carol, "conv-7").await;
    let payload = json!({"id": "m1", "senderId": "u1", "text": "hi", "createdAt": 1700000000});

    // when (操作):
    let status = server.publish("conv-42", payload.clone()).await;

    // then (期待する結果):
    assert_eq!(status, 202);
    let expected = json!({"type": "new_message", "data": payload});
    assert_eq!(recv_event(&mut alice).await, expected);
    assert_eq!(recv_event(&mut bob).await, expected);
    assert_eq!(try_recv_event(&mut carol, SILENCE).await, None);
}

#[tokio::test]
async fn test_member_disconnect_does_not_affect_others() {
    // テスト項目: メンバーが切断しても他のメンバーへの配信は続き、publish は失敗しない
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, _) = connect(&server.ws_url()).await;
    let (mut bob, _) = connect(&server.ws_url()).await;
    join(&mut alice, "conv-42").await;
    join(&mut bob, "conv-42").await;

    // when (操作):
    bob.close(None).await.expect("Failed to close");
    drop(bob);
    let status = server.publish("conv-42", json!({"id": "m2"})).await;

    // then (期待する結果):
    assert_eq!(status, 202);
    let event = recv_event(&mut alice).await;
    assert_eq!(event["data"]["id"], "m2");
}

#[tokio::test]
async fn test_closed_client_leaves_no_trace() {
    // テスト項目: 切断したクライアントは接続一覧からもルームからも消える
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, _) = connect(&server.ws_url()).await;
    join(&mut alice, "conv-42").await;

    // when (操作):
    alice.close(None).await.expect("Failed to close");
    drop(alice);

    // then (期待する結果): 切断処理は非同期なので期限付きで待つ
    let client = reqwest::Client::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    let (rooms, stats) = loop {
        let stats: Value = client
            .get(format!("{}/api/stats", server.base_url()))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        let rooms: Value = client
            .get(format!("{}/api/rooms", server.base_url()))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        if stats["connections"] == 0 || tokio::time::Instant::now() >= deadline {
            break (rooms, stats);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    };
    assert_eq!(rooms, json!([]));
    assert_eq!(stats["connections"], 0);
    assert_eq!(stats["rooms"], 0);
}

#[tokio::test]
async fn test_publish_to_room_without_members() {
    // テスト項目: メンバーのいないルームへの publish も 202 で受理される
    let server = TestServer::start().await;

    let status = server.publish("nobody-here", json!({"id": "m1"})).await;

    assert_eq!(status, 202);
}

#[tokio::test]
async fn test_messages_arrive_in_publish_order() {
    // テスト項目: 同一ルームへの連続 publish は送信順に届く
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, _) = connect(&server.ws_url()).await;
    join(&mut alice, "conv-1").await;

    // when (操作):
    for seq in 0..20 {
        assert_eq!(server.publish("conv-1", json!({"seq": seq})).await, 202);
    }

    // then (期待する結果):
    for seq in 0..20 {
        let event = recv_event(&mut alice).await;
        assert_eq!(event["data"]["seq"], seq);
    }
}

#[tokio::test]
async fn test_leave_stops_delivery() {
    // テスト項目: ルームから離脱した後は配信されない
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, _) = connect(&server.ws_url()).await;
    join(&mut alice, "conv-1").await;

    // when (操作):
    send_event(&mut alice, json!({"type": "leave_conversation", "data": "conv-1"})).await;
    let ack = recv_event(&mut alice).await;
    server.publish("conv-1", json!({"id": "m1"})).await;

    // then (期待する結果):
    assert_eq!(ack, json!({"type": "left_conversation", "data": "conv-1"}));
    assert_eq!(try_recv_event(&mut alice, SILENCE).await, None);
}

#[tokio::test]
async fn test_join_is_idempotent() {
    // テスト項目: 同じルームへの二重参加でもメッセージは 1 回だけ届く
    let server = TestServer::start().await;
    let (mut alice, _) = connect(&server.ws_url()).await;
    join(&mut alice, "conv-1").await;
    join(&mut alice, "conv-1").await;

    server.publish("conv-1", json!({"id": "m1"})).await;

    assert_eq!(recv_event(&mut alice).await["data"]["id"], "m1");
    assert_eq!(try_recv_event(&mut alice, SILENCE).await, None);
}

#[tokio::test]
async fn test_malformed_client_event_gets_error_and_keeps_connection() {
    // テスト項目: 不正なクライアントイベントには error が返り、接続は維持される
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, _) = connect(&server.ws_url()).await;

    // when (操作):
    send_event(&mut alice, json!({"type": "shout", "data": 1})).await;
    let reply: Value = recv_event(&mut alice).await;

    // then (期待する結果):
    assert_eq!(reply["type"], "error");
    join(&mut alice, "conv-1").await;
}

#[tokio::test]
async fn test_room_limit_per_connection() {
    // テスト項目: 接続あたりのルーム数上限を超える参加は error になる
    let server = TestServer::start_with(RelayConfig {
        limits: parley_server::infrastructure::repository::RelayLimits {
            max_rooms_per_connection: Some(1),
            max_room_size: None,
        },
        ..RelayConfig::default()
    })
    .await;
    let (mut alice, _) = connect(&server.ws_url()).await;
    join(&mut alice, "conv-1").await;

    send_event(&mut alice, json!({"type": "join_conversation", "data": "conv-2"})).await;

    assert_eq!(recv_event(&mut alice).await["type"], "error");
}

#[tokio::test]
async fn test_disallowed_origin_is_rejected() {
    // テスト項目: 許可リスト外の Origin からの接続は 403 で拒否される
    // given (前提条件):
    let server = TestServer::start_with(RelayConfig {
        allowed_origins: vec!["https://app.example.com".to_string()],
        ..RelayConfig::default()
    })
    .await;
    let mut evil = server.ws_url().into_client_request().unwrap();
    evil.headers_mut()
        .insert("Origin", HeaderValue::from_static("https://evil.example.com"));
    let mut good = server.ws_url().into_client_request().unwrap();
    good.headers_mut()
        .insert("Origin", HeaderValue::from_static("https://app.example.com"));

    // when (操作):
    let rejected = connect_async(evil).await;
    let accepted = connect_async(good).await;

    // then (期待する結果):
    match rejected {
        Err(WsError::Http(response)) => assert_eq!(response.status(), 403),
        Err(e) => panic!("expected HTTP 403, got {e}"),
        Ok(_) => panic!("expected the upgrade to be refused"),
    }
    assert!(accepted.is_ok());
}
