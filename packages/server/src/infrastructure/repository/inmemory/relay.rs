//! InMemory relay repository 実装
//!
//! ドメイン層が定義する `ConnectionRegistry` と `RoomRouter` の両 trait を、
//! 単一の `Mutex<RelayState>` の上に実装します。
//!
//! ## 不変条件
//!
//! - 全ての操作はロックを 1 回だけ取得し、その中で完結する（`.await` を挟まない）
//! - 切断処理（unregister）はルームからの削除と同じクリティカルセクションで行う
//! - 配信は `try_send` のみ。キューが満杯または閉じている受信者はその場で切断扱い
//! - 切断した接続には close トークンで通知し、トランスポートを閉じさせる
//! - 最後のメンバーが抜けたルームは即座に削除する

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc::error::TrySendError};

use crate::domain::{
    BroadcastReport, Connection, ConnectionId, ConnectionRegistry, JoinOutcome, OutboundSender,
    RepositoryError, Room, RoomKey, RoomRouter, Timestamp,
    entity::{DEFAULT_ROOM_CAPACITY, DEFAULT_ROOMS_PER_CONNECTION},
};

/// ルーム人数・参加ルーム数の上限設定（`None` は無制限）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayLimits {
    pub max_rooms_per_connection: Option<usize>,
    pub max_room_size: Option<usize>,
}

impl Default for RelayLimits {
    fn default() -> Self {
        Self {
            max_rooms_per_connection: Some(DEFAULT_ROOMS_PER_CONNECTION),
            max_room_size: Some(DEFAULT_ROOM_CAPACITY),
        }
    }
}

/// 接続のドメインモデルと送信キューの組
struct ConnectionSlot {
    connection: Connection,
    outbox: OutboundSender,
}

#[derive(Default)]
struct RelayState {
    connections: HashMap<ConnectionId, ConnectionSlot>,
    rooms: HashMap<RoomKey, Room>,
}

impl RelayState {
    /// ルームから接続を外し、空になったルームを削除する
    fn detach(&mut self, id: &ConnectionId, key: &RoomKey) -> bool {
        let Some(room) = self.rooms.get_mut(key) else {
            return false;
        };
        let removed = room.remove_member(id);
        if room.is_empty() {
            self.rooms.remove(key);
            tracing::debug!(room = %key, "room is empty, dropped");
        }
        removed
    }

    /// 接続を closed に遷移させ、全ルームから外してレコードを破棄する
    fn teardown(&mut self, id: &ConnectionId) -> Option<Vec<RoomKey>> {
        let mut slot = self.connections.remove(id)?;
        let rooms = slot.connection.close();
        for key in &rooms {
            self.detach(id, key);
        }
        // Dropping the sender ends an idle writer; the token also stops one
        // blocked on a stalled socket.
        slot.outbox.close();
        Some(rooms)
    }
}

/// インメモリ relay repository 実装
///
/// `ConnectionRegistry` と `RoomRouter` を同じ状態の上に実装します（依存性の逆転）。
pub struct InMemoryRelayRepository {
    state: Mutex<RelayState>,
    limits: RelayLimits,
}

impl InMemoryRelayRepository {
    /// 新しい InMemoryRelayRepository を作成
    pub fn new(limits: RelayLimits) -> Self {
        Self {
            state: Mutex::new(RelayState::default()),
            limits,
        }
    }
}

impl Default for InMemoryRelayRepository {
    fn default() -> Self {
        Self::new(RelayLimits::default())
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryRelayRepository {
    async fn register(
        &self,
        id: ConnectionId,
        outbox: OutboundSender,
        connected_at: Timestamp,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if state.connections.contains_key(&id) {
            return Err(RepositoryError::DuplicateConnection(id.to_string()));
        }
        let connection = Connection::with_room_limit(
            id.clone(),
            connected_at,
            self.limits.max_rooms_per_connection,
        );
        state
            .connections
            .insert(id, ConnectionSlot { connection, outbox });
        Ok(())
    }

    async fn begin_close(&self, id: &ConnectionId) -> bool {
        let mut state = self.state.lock().await;
        state
            .connections
            .get_mut(id)
            .is_some_and(|slot| slot.connection.begin_closing())
    }

    async fn unregister(&self, id: &ConnectionId) -> Option<Vec<RoomKey>> {
        let mut state = self.state.lock().await;
        state.teardown(id)
    }

    async fn unregister_all(&self) -> usize {
        let mut state = self.state.lock().await;
        let ids: Vec<ConnectionId> = state.connections.keys().cloned().collect();
        for id in &ids {
            state.teardown(id);
        }
        ids.len()
    }

    async fn get_connection(&self, id: &ConnectionId) -> Option<Connection> {
        let state = self.state.lock().await;
        state.connections.get(id).map(|slot| slot.connection.clone())
    }

    async fn count_connections(&self) -> usize {
        let state = self.state.lock().await;
        state.connections.len()
    }
}

#[async_trait]
impl RoomRouter for InMemoryRelayRepository {
    async fn join(&self, id: &ConnectionId, key: RoomKey) -> Result<JoinOutcome, RepositoryError> {
        let mut state = self.state.lock().await;
        let RelayState { connections, rooms } = &mut *state;

        let slot = connections
            .get_mut(id)
            .ok_or_else(|| RepositoryError::UnknownConnection(id.to_string()))?;

        if slot.connection.is_member_of(&key) {
            return Ok(JoinOutcome::AlreadyMember);
        }
        slot.connection.ensure_can_join()?;

        let room = rooms.entry(key.clone()).or_insert_with(|| {
            tracing::debug!(room = %key, "room created");
            Room::with_capacity(key.clone(), Timestamp::now(), self.limits.max_room_size)
        });
        if let Err(e) = room.add_member(id.clone()) {
            // A room created for this join must not linger empty.
            if room.is_empty() {
                rooms.remove(&key);
            }
            return Err(e.into());
        }
        slot.connection.add_room(key);
        Ok(JoinOutcome::Joined)
    }

    async fn leave(&self, id: &ConnectionId, key: &RoomKey) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        let slot = state
            .connections
            .get_mut(id)
            .ok_or_else(|| RepositoryError::UnknownConnection(id.to_string()))?;
        if !slot.connection.remove_room(key) {
            return Ok(false);
        }
        Ok(state.detach(id, key))
    }

    async fn leave_all(&self, id: &ConnectionId) -> Vec<RoomKey> {
        let mut state = self.state.lock().await;
        let Some(slot) = state.connections.get_mut(id) else {
            return Vec::new();
        };
        let keys: Vec<RoomKey> = std::mem::take(&mut slot.connection.rooms)
            .into_iter()
            .collect();
        for key in &keys {
            state.detach(id, key);
        }
        keys
    }

    async fn broadcast(&self, key: &RoomKey, frame: String) -> BroadcastReport {
        let mut state = self.state.lock().await;
        let mut report = BroadcastReport::default();

        let Some(room) = state.rooms.get(key) else {
            return report;
        };
        let members: Vec<ConnectionId> = room.members.iter().cloned().collect();

        for id in members {
            let Some(slot) = state.connections.get(&id) else {
                continue;
            };
            if !slot.connection.is_open() {
                continue;
            }
            report.recipients += 1;
            match slot.outbox.try_send(frame.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(connection_id = %id, room = %key, "outbound queue full, evicting slow connection");
                    report.evicted.push(id);
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::warn!(connection_id = %id, room = %key, "outbound queue closed, evicting connection");
                    report.evicted.push(id);
                }
            }
        }

        for id in &report.evicted {
            state.teardown(id);
        }
        report
    }

    async fn get_room(&self, key: &RoomKey) -> Option<Room> {
        let state = self.state.lock().await;
        state.rooms.get(key).cloned()
    }

    async fn list_rooms(&self) -> Vec<Room> {
        let state = self.state.lock().await;
        let mut rooms: Vec<Room> = state.rooms.values().cloned().collect();
        rooms.sort_by(|a, b| a.key.cmp(&b.key));
        rooms
    }
}
