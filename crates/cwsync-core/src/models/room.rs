use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::PersonId;

/// Room id as assigned by the remote service.
pub type RoomId = String;

/// Local mirror of a chat room.
///
/// `chat_count` and `last_update_timestamp` come from the service and anchor
/// every delta fetch. `high_water_message_id` never leaves the client; it is the
/// largest message id already emitted for this room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub kind: i64,
    pub last_update_timestamp: i64,
    pub last_read_count: i64,
    pub chat_count: i64,
    /// person id -> role code
    pub members: HashMap<PersonId, i64>,
    pub high_water_message_id: i64,
}

/// Parameters bounding a room delta fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomAnchor {
    pub chat_count: i64,
    pub last_update_timestamp: i64,
}

/// The part of a room that message filtering reads and advances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomState {
    pub high_water_message_id: i64,
    pub last_update_timestamp: i64,
}

impl RoomState {
    /// Component-wise maximum; used to keep room state monotonic.
    pub fn max(self, other: RoomState) -> RoomState {
        RoomState {
            high_water_message_id: self.high_water_message_id.max(other.high_water_message_id),
            last_update_timestamp: self.last_update_timestamp.max(other.last_update_timestamp),
        }
    }
}

impl Room {
    pub fn anchor(&self) -> RoomAnchor {
        RoomAnchor {
            chat_count: self.chat_count,
            last_update_timestamp: self.last_update_timestamp,
        }
    }

    pub fn state(&self) -> RoomState {
        RoomState {
            high_water_message_id: self.high_water_message_id,
            last_update_timestamp: self.last_update_timestamp,
        }
    }
}
