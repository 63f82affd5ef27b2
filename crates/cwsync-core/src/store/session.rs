/// An authenticated gateway session.
///
/// The token is fixed for the session's lifetime; the cursor moves forward
/// after every poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    cursor: String,
    my_id: Option<String>,
}

impl Session {
    pub fn new(token: String, cursor: String, my_id: Option<String>) -> Self {
        Self {
            token,
            cursor,
            my_id,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Position in the global update stream
    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    /// Account id of the logged-in user, when the service reported one
    pub fn my_id(&self) -> Option<&str> {
        self.my_id.as_deref()
    }

    pub(crate) fn advance(&mut self, cursor: String) {
        self.cursor = cursor;
    }
}
