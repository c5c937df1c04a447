//! Domain layer for the relay.
//!
//! This module contains the membership model and the repository traits.
//! It is independent of wire formats (DTOs) and of the in-memory implementation.

pub mod entity;
pub mod error;
pub mod factory;
pub mod repository;
pub mod value_object;

pub use entity::{Connection, ConnectionState, Room};
pub use error::{ConnectionError, RepositoryError, RoomError, ValueObjectError};
pub use factory::ConnectionIdFactory;
pub use repository::{BroadcastReport, ConnectionRegistry, JoinOutcome, OutboundSender, RoomRouter};
pub use value_object::{ConnectionId, RoomKey, Timestamp};
