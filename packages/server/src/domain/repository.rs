//! Repository traits for the relay's shared membership state.
//!
//! The registry and the router are two views over one piece of state: an
//! implementation must make every operation of both traits atomic with respect
//! to each other, so that a broadcast never observes a half torn-down connection.

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use super::{Connection, ConnectionId, RepositoryError, Room, RoomKey, Timestamp};

/// Bounded outbound queue feeding one connection's socket writer.
///
/// Frames are serialized JSON text, encoded once per broadcast. The close
/// token is fired when the relay drops the connection, so the transport is
/// torn down even if its writer is stuck on a stalled peer.
#[derive(Debug, Clone)]
pub struct OutboundSender {
    frames: mpsc::Sender<String>,
    closed: CancellationToken,
}

impl OutboundSender {
    pub fn new(frames: mpsc::Sender<String>) -> Self {
        Self {
            frames,
            closed: CancellationToken::new(),
        }
    }

    /// Enqueue without waiting. Fails when the queue is full or the writer is gone.
    pub fn try_send(&self, frame: String) -> Result<(), TrySendError<String>> {
        self.frames.try_send(frame)
    }

    /// Weak handle for replies that must not keep the queue open.
    pub fn downgrade(&self) -> mpsc::WeakSender<String> {
        self.frames.downgrade()
    }

    /// Token cancelled by [`OutboundSender::close`].
    pub fn close_token(&self) -> CancellationToken {
        self.closed.clone()
    }

    /// Signal the transport to close.
    pub fn close(&self) {
        self.closed.cancel();
    }
}

impl From<mpsc::Sender<String>> for OutboundSender {
    fn from(frames: mpsc::Sender<String>) -> Self {
        Self::new(frames)
    }
}

/// Result of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AlreadyMember,
}

/// Outcome of a single broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Open members selected at broadcast time
    pub recipients: usize,
    /// Frames accepted by the recipients' outbound queues
    pub delivered: usize,
    /// Recipients whose delivery failed and which were torn down as a result
    pub evicted: Vec<ConnectionId>,
}

/// Tracks every live connection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Store a new open connection.
    ///
    /// Fails with `RepositoryError::DuplicateConnection` if the id already exists.
    async fn register(
        &self,
        id: ConnectionId,
        outbox: OutboundSender,
        connected_at: Timestamp,
    ) -> Result<(), RepositoryError>;

    /// `open -> closing`. Closing connections are skipped by broadcasts.
    /// Returns false if the connection is unknown or not open.
    async fn begin_close(&self, id: &ConnectionId) -> bool;

    /// Close the connection, drop it from every room, and discard it.
    ///
    /// Idempotent: returns `None` when the id is not registered.
    async fn unregister(&self, id: &ConnectionId) -> Option<Vec<RoomKey>>;

    /// Tear down every connection. Returns how many were removed.
    async fn unregister_all(&self) -> usize;

    async fn get_connection(&self, id: &ConnectionId) -> Option<Connection>;

    async fn count_connections(&self) -> usize;
}

/// Maps room keys to member connections and performs fan-out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRouter: Send + Sync {
    /// Add the connection to the room, creating the room on first join.
    async fn join(&self, id: &ConnectionId, key: RoomKey) -> Result<JoinOutcome, RepositoryError>;

    /// Remove the connection from the room, dropping the room once empty.
    /// Returns false if it was not a member.
    async fn leave(&self, id: &ConnectionId, key: &RoomKey) -> Result<bool, RepositoryError>;

    /// Remove the connection from all rooms it belongs to.
    async fn leave_all(&self, id: &ConnectionId) -> Vec<RoomKey>;

    /// Deliver `frame` to every open member of the room at the time of the call.
    async fn broadcast(&self, key: &RoomKey, frame: String) -> BroadcastReport;

    async fn get_room(&self, key: &RoomKey) -> Option<Room>;

    async fn list_rooms(&self) -> Vec<Room>;
}
