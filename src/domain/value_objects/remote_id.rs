use serde::{Deserialize, Serialize};
use std::fmt;

use super::LocalActionId;

/// Identity assigned by the remote authority once an action is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteId(String);

impl RemoteId {
    pub fn new(value: String) -> Result<Self, String> {
        if value.trim().is_empty() {
            return Err("Remote id cannot be empty".to_string());
        }
        Ok(Self(value))
    }

    /// Synthesized remote id recorded when a conflict is resolved in favor
    /// of remote state without a known competing record. Keeps the
    /// `is_synced` implies `remote_id` invariant while staying traceable
    /// to the discarded local action.
    pub fn adopted(local_id: &LocalActionId) -> Self {
        Self(format!("adopted:{local_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<RemoteId> for String {
    fn from(id: RemoteId) -> Self {
        id.0
    }
}
