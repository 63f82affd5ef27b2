use crate::models::PersonId;

pub type SyncResult<T> = Result<T, SyncError>;

/// Failures surfaced by the sync engine.
///
/// The engine never retries internally. Callers driving the poll loop decide
/// whether to poll again (`is_retryable`) or to log in again first (`is_auth`).
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Person {0} could not be resolved")]
    UnresolvedPerson(PersonId),
}

impl SyncError {
    /// The session is unusable; a fresh login is required before syncing again.
    pub fn is_auth(&self) -> bool {
        matches!(self, SyncError::Auth(_) | SyncError::NotLoggedIn)
    }

    /// The poll cycle was aborted but the session is still valid.
    pub fn is_retryable(&self) -> bool {
        !self.is_auth()
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Protocol(err.to_string())
    }
}
