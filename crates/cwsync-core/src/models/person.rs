use serde::{Deserialize, Serialize};

/// Account id as assigned by the remote service.
pub type PersonId = i64;

/// A contact or room member.
///
/// Cached entries are never refreshed after they are first stored, so a
/// rename on the remote side is not picked up until the next login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    /// Public handle (the service's "cwid")
    pub external_id: String,
    pub name: String,
    pub organization: String,
}

impl Person {
    /// Name suitable for display, falling back to the handle and then the id.
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            self.name.clone()
        } else if !self.external_id.is_empty() {
            self.external_id.clone()
        } else {
            format!("#{}", self.id)
        }
    }
}
