use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Client-generated identity of an offline action. Stable across retries
/// and unique for the lifetime of the action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalActionId(String);

impl LocalActionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn new(value: String) -> Result<Self, String> {
        if value.trim().is_empty() {
            return Err("Local action id cannot be empty".to_string());
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocalActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<LocalActionId> for String {
    fn from(id: LocalActionId) -> Self {
        id.0
    }
}
