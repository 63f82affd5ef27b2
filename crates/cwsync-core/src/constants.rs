//! Gateway constants
//!
//! Centralized location for command names and tuned defaults that are
//! shared between the transport, the engine and the configuration layer.

/// Default gateway endpoint
pub const DEFAULT_ENDPOINT: &str = "https://kcw.kddi.ne.jp/gateway.php";

/// Gateway protocol version sent as `_v`
pub const DEFAULT_API_VERSION: &str = "2.52";

/// Client application version sent as `_av`
pub const DEFAULT_APP_VERSION: &str = "4";

/// Client type announced at login
pub const DEFAULT_LOGIN_TYPE: &str = "mobile";

/// Messages older than this (relative to the local clock) are never emitted by a poll.
pub const RECENCY_WINDOW_SECS: u64 = 60;

/// Number of recent messages requested per changed room.
pub const ROOM_PAGE_SIZE: u32 = 20;

// Gateway command names
pub mod commands {
    /// Credential exchange, returns the full room/contact snapshot
    pub const LOGIN: &str = "api_login";
    /// Change detection against the update cursor
    pub const GET_UPDATE: &str = "get_update";
    /// Per-room chat list anchored at chat count / last update
    pub const GET_ROOM_INFO: &str = "get_room_info";
    /// Person lookup by account id
    pub const GET_ACCOUNT_INFO: &str = "get_account_info";
    /// Post a message to a room
    pub const SEND_CHAT: &str = "send_chat";
}
