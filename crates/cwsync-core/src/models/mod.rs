pub mod chat;
pub mod person;
pub mod room;

pub use chat::{Chat, RawMessage};
pub use person::{Person, PersonId};
pub use room::{Room, RoomAnchor, RoomId, RoomState};
