use serde::{Deserialize, Serialize};
use std::fmt;

use super::{EntityId, EntityType};

/// Key identifying one tracked cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(value: String) -> Result<Self, String> {
        if value.trim().is_empty() {
            return Err("Cache key cannot be empty".to_string());
        }
        Ok(Self(value))
    }

    /// Canonical key for a tracked entity, `<entity_type>:<entity_id>`.
    pub fn for_entity(entity_type: EntityType, entity_id: &EntityId) -> Self {
        Self(format!("{entity_type}:{entity_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}
