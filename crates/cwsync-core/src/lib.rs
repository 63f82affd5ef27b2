pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod filter;
pub mod models;
pub mod store;
pub mod tracing_setup;
pub mod transport;
pub mod wire;

#[cfg(test)]
pub(crate) mod testing;

// Re-export the engine surface at crate root for convenience
pub use config::{Credentials, SyncConfig};
pub use engine::{ChangeSet, Clock, RoomDelta, SyncClient, SystemClock};
pub use error::{SyncError, SyncResult};
pub use models::{Chat, Person, PersonId, RawMessage, Room, RoomAnchor, RoomId, RoomState};
pub use transport::{HttpTransport, Transport};
