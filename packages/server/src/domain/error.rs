//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// RoomKey validation error
    #[error("RoomKey cannot be empty")]
    RoomKeyEmpty,

    /// RoomKey too long error
    #[error("RoomKey cannot exceed {max} bytes (got {actual})")]
    RoomKeyTooLong { max: usize, actual: usize },

    /// ConnectionId invalid format error (not a valid UUID format)
    #[error("ConnectionId must be a valid UUID format (got: {0})")]
    ConnectionIdInvalidFormat(String),
}

/// Errors related to Room domain logic
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoomError {
    /// Room member capacity exceeded error
    #[error("Room capacity exceeded: maximum {capacity} members allowed (current: {current})")]
    CapacityExceeded { capacity: usize, current: usize },
}

/// Errors related to Connection domain logic
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Per-connection room membership limit exceeded
    #[error("Room limit exceeded: a connection may join at most {limit} rooms")]
    RoomLimitExceeded { limit: usize },

    /// Operation attempted on a connection that is closing or closed
    #[error("Connection is not open (state: {0})")]
    NotOpen(&'static str),
}

/// Errors returned by the registry and router implementations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// A connection with the same identifier is already registered
    #[error("Connection '{0}' is already registered")]
    DuplicateConnection(String),

    /// No connection with this identifier is registered
    #[error("Connection '{0}' is not registered")]
    UnknownConnection(String),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}
