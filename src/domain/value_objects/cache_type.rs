use serde::{Deserialize, Serialize};
use std::fmt;

/// Category a cache entry is grouped under for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheType(String);

impl CacheType {
    pub fn new(value: String) -> Result<Self, String> {
        if value.trim().is_empty() {
            return Err("Cache type cannot be empty".to_string());
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<super::EntityType> for CacheType {
    fn from(entity_type: super::EntityType) -> Self {
        Self(entity_type.as_str().to_string())
    }
}

impl From<CacheType> for String {
    fn from(kind: CacheType) -> Self {
        kind.0
    }
}
