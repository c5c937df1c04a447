//! Core domain models for the relay.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{
    error::{ConnectionError, RoomError},
    value_object::{ConnectionId, RoomKey, Timestamp},
};

/// Default maximum number of rooms a single connection may join
pub const DEFAULT_ROOMS_PER_CONNECTION: usize = 64;

/// Default maximum number of members in a single room
pub const DEFAULT_ROOM_CAPACITY: usize = 1024;

/// Liveness of a connection. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Open,
    Closing,
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Open => "open",
            ConnectionState::Closing => "closing",
            ConnectionState::Closed => "closed",
        }
    }
}

/// A live client transport session tracked by the relay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    /// Rooms this connection has joined
    pub rooms: BTreeSet<RoomKey>,
    pub state: ConnectionState,
    pub connected_at: Timestamp,
    /// Maximum number of rooms this connection may join (`None` = unlimited)
    pub room_limit: Option<usize>,
}

impl Connection {
    /// Create a new open connection with no room memberships
    pub fn new(id: ConnectionId, connected_at: Timestamp) -> Self {
        Self::with_room_limit(id, connected_at, Some(DEFAULT_ROOMS_PER_CONNECTION))
    }

    /// Create a new open connection with a custom room limit
    pub fn with_room_limit(
        id: ConnectionId,
        connected_at: Timestamp,
        room_limit: Option<usize>,
    ) -> Self {
        Self {
            id,
            rooms: BTreeSet::new(),
            state: ConnectionState::Open,
            connected_at,
            room_limit,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    pub fn is_member_of(&self, key: &RoomKey) -> bool {
        self.rooms.contains(key)
    }

    /// Check whether this connection may join one more room
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::NotOpen` unless the connection is open, and
    /// `ConnectionError::RoomLimitExceeded` if the room limit is reached
    pub fn ensure_can_join(&self) -> Result<(), ConnectionError> {
        if !self.is_open() {
            return Err(ConnectionError::NotOpen(self.state.as_str()));
        }
        if let Some(limit) = self.room_limit
            && self.rooms.len() >= limit
        {
            return Err(ConnectionError::RoomLimitExceeded { limit });
        }
        Ok(())
    }

    /// Record membership of a room. Returns false if already a member.
    pub fn add_room(&mut self, key: RoomKey) -> bool {
        self.rooms.insert(key)
    }

    /// Forget membership of a room. Returns false if it was not a member.
    pub fn remove_room(&mut self, key: &RoomKey) -> bool {
        self.rooms.remove(key)
    }

    /// `open -> closing`. Returns false if the connection was not open.
    pub fn begin_closing(&mut self) -> bool {
        if self.state != ConnectionState::Open {
            return false;
        }
        self.state = ConnectionState::Closing;
        true
    }

    /// Terminal transition. Clears and returns all room memberships.
    pub fn close(&mut self) -> Vec<RoomKey> {
        self.state = ConnectionState::Closed;
        std::mem::take(&mut self.rooms).into_iter().collect()
    }
}

/// A fan-out group of connections keyed by conversation identifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub key: RoomKey,
    /// Member connections, ordered for deterministic fan-out
    pub members: BTreeSet<ConnectionId>,
    pub created_at: Timestamp,
    /// Maximum number of members allowed (`None` = unlimited)
    pub member_capacity: Option<usize>,
}

impl Room {
    /// Create a new empty room with the default capacity
    pub fn new(key: RoomKey, created_at: Timestamp) -> Self {
        Self::with_capacity(key, created_at, Some(DEFAULT_ROOM_CAPACITY))
    }

    /// Create a new empty room with a custom capacity
    pub fn with_capacity(key: RoomKey, created_at: Timestamp, member_capacity: Option<usize>) -> Self {
        Self {
            key,
            members: BTreeSet::new(),
            created_at,
            member_capacity,
        }
    }

    /// Add a member to the room. Idempotent: returns `Ok(false)` if already a member.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::CapacityExceeded` if the room is at full capacity
    pub fn add_member(&mut self, id: ConnectionId) -> Result<bool, RoomError> {
        if self.members.contains(&id) {
            return Ok(false);
        }
        if let Some(capacity) = self.member_capacity
            && self.members.len() >= capacity
        {
            return Err(RoomError::CapacityExceeded {
                capacity,
                current: self.members.len(),
            });
        }
        Ok(self.members.insert(id))
    }

    /// Remove a member from the room. Returns false if it was not a member.
    pub fn remove_member(&mut self, id: &ConnectionId) -> bool {
        self.members.remove(id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConnectionIdFactory;

    fn room_key(key: &str) -> RoomKey {
        RoomKey::new(key.to_string()).unwrap()
    }

    #[test]
    fn test_room_add_member_is_idempotent() {
        // テスト項目: 同じ接続を 2 回追加してもメンバーは 1 つだけ
        // given (前提条件):
        let mut room = Room::new(room_key("conv-1"), Timestamp::new(0));
        let id = ConnectionIdFactory::generate();

        // when (操作):
        let first = room.add_member(id.clone());
        let second = room.add_member(id.clone());

        // then (期待する結果):
        assert_eq!(first, Ok(true));
        assert_eq!(second, Ok(false));
        assert_eq!(room.members.len(), 1);
    }

    #[test]
    fn test_room_capacity_exceeded() {
        // テスト項目: 容量を超えるメンバー追加はエラーになる
        // given (前提条件):
        let mut room = Room::with_capacity(room_key("conv-1"), Timestamp::new(0), Some(1));
        room.add_member(ConnectionIdFactory::generate()).unwrap();

        // when (操作):
        let result = room.add_member(ConnectionIdFactory::generate());

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RoomError::CapacityExceeded {
                capacity: 1,
                current: 1
            })
        );
    }

    #[test]
    fn test_room_unlimited_capacity() {
        // テスト項目: 容量 None の場合は制限なし
        let mut room = Room::with_capacity(room_key("conv-1"), Timestamp::new(0), None);
        for _ in 0..(DEFAULT_ROOM_CAPACITY + 1) {
            room.add_member(ConnectionIdFactory::generate()).unwrap();
        }
        assert_eq!(room.members.len(), DEFAULT_ROOM_CAPACITY + 1);
    }

    #[test]
    fn test_room_existing_member_ignores_capacity() {
        // テスト項目: 満員でも既存メンバーの再追加は成功する（冪等）
        let mut room = Room::with_capacity(room_key("conv-1"), Timestamp::new(0), Some(1));
        let id = ConnectionIdFactory::generate();
        room.add_member(id.clone()).unwrap();
        assert_eq!(room.add_member(id), Ok(false));
    }

    #[test]
    fn test_connection_state_transitions() {
        // テスト項目: open -> closing -> closed の一方向遷移
        // given (前提条件):
        let mut connection = Connection::new(ConnectionIdFactory::generate(), Timestamp::new(0));
        connection.add_room(room_key("a"));
        connection.add_room(room_key("b"));

        // when (操作) / then (期待する結果):
        assert!(connection.is_open());
        assert!(connection.begin_closing());
        assert_eq!(connection.state, ConnectionState::Closing);
        assert!(!connection.begin_closing());

        let left = connection.close();
        assert_eq!(connection.state, ConnectionState::Closed);
        assert_eq!(left, vec![room_key("a"), room_key("b")]);
        assert!(connection.rooms.is_empty());
    }

    #[test]
    fn test_connection_room_limit() {
        // テスト項目: 接続ごとのルーム数上限を超えると参加できない
        // given (前提条件):
        let mut connection =
            Connection::with_room_limit(ConnectionIdFactory::generate(), Timestamp::new(0), Some(1));
        connection.add_room(room_key("a"));

        // when (操作):
        let result = connection.ensure_can_join();

        // then (期待する結果):
        assert_eq!(result, Err(ConnectionError::RoomLimitExceeded { limit: 1 }));
    }

    #[test]
    fn test_closing_connection_cannot_join() {
        // テスト項目: closing 状態の接続はルームに参加できない
        let mut connection = Connection::new(ConnectionIdFactory::generate(), Timestamp::new(0));
        connection.begin_closing();
        assert_eq!(
            connection.ensure_can_join(),
            Err(ConnectionError::NotOpen("closing"))
        );
    }
}
