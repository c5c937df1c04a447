//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::error::ValueObjectError;

/// Maximum length of a room key in bytes.
pub const ROOM_KEY_MAX_LEN: usize = 128;

/// Connection identifier value object.
///
/// Assigned by the relay when a transport session is established. Never reused:
/// a reconnecting client receives a fresh identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse a connection identifier from its hyphenated string form.
    pub fn parse(id: &str) -> Result<Self, ValueObjectError> {
        Uuid::parse_str(id)
            .map(Self)
            .map_err(|_| ValueObjectError::ConnectionIdInvalidFormat(id.to_string()))
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Room key value object.
///
/// The conversation identifier a room is keyed by. Opaque to the relay: it is
/// never checked against the system of record, only for shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomKey(String);

impl RoomKey {
    /// Create a new RoomKey.
    ///
    /// # Arguments
    ///
    /// * `key` - The conversation identifier string
    ///
    /// # Returns
    ///
    /// A Result containing the RoomKey or an error if validation fails
    pub fn new(key: String) -> Result<Self, ValueObjectError> {
        if key.is_empty() {
            return Err(ValueObjectError::RoomKeyEmpty);
        }
        let len = key.len();
        if len > ROOM_KEY_MAX_LEN {
            return Err(ValueObjectError::RoomKeyTooLong {
                max: ROOM_KEY_MAX_LEN,
                actual: len,
            });
        }
        Ok(Self(key))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomKey {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Timestamp value object.
///
/// Represents a Unix timestamp in milliseconds (JST).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Current time.
    pub fn now() -> Self {
        Self(parley_shared::time::get_jst_timestamp())
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
