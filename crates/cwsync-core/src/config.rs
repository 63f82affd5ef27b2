use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_VERSION, DEFAULT_APP_VERSION, DEFAULT_ENDPOINT, DEFAULT_LOGIN_TYPE,
    RECENCY_WINDOW_SECS, ROOM_PAGE_SIZE,
};

/// Tunables for one sync session. Every field has a default, so an empty
/// JSON object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    /// Gateway URL, without query string
    pub endpoint: String,
    pub api_version: String,
    pub app_version: String,
    pub login_type: String,
    /// Messages older than this many seconds are not emitted by a poll
    pub recency_window_secs: u64,
    /// Messages requested per changed room
    pub page_size: u32,
}

impl SyncConfig {
    pub fn recency_window(&self) -> Duration {
        Duration::from_secs(self.recency_window_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            app_version: DEFAULT_APP_VERSION.to_string(),
            login_type: DEFAULT_LOGIN_TYPE.to_string(),
            recency_window_secs: RECENCY_WINDOW_SECS,
            page_size: ROOM_PAGE_SIZE,
        }
    }
}

/// Login credentials
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

// Keep passwords out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
