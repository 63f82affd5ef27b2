use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{Person, PersonId, Room};

/// A message as delivered in a room's chat list, before filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub id: i64,
    pub sender_id: PersonId,
    pub body: String,
    /// Unix seconds
    pub timestamp: i64,
}

/// A newly observed message, ready for the caller.
///
/// `sender` is shared with the entity cache. `room` is the room as it was
/// committed by the poll that produced this chat.
#[derive(Debug, Clone)]
pub struct Chat {
    pub id: i64,
    pub message: String,
    pub sender: Arc<Person>,
    pub room: Arc<Room>,
    pub timestamp: DateTime<Utc>,
}

impl Chat {
    pub fn new(raw: RawMessage, sender: Arc<Person>, room: Arc<Room>) -> Self {
        Self {
            id: raw.id,
            message: raw.body,
            sender,
            room,
            timestamp: DateTime::from_timestamp(raw.timestamp, 0).unwrap_or_default(),
        }
    }
}
