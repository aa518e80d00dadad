use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::value_objects::{CacheKey, CacheType};

/// Per-entity staleness bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub record_id: Option<i64>,
    pub cache_key: CacheKey,
    pub cache_type: CacheType,
    pub data_version: i64,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub is_stale: bool,
    pub expiry_time: Option<DateTime<Utc>>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatus {
    pub total_items: u64,
    pub stale_items: u64,
    pub per_type: Vec<CacheTypeStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheTypeStatus {
    pub cache_type: CacheType,
    pub item_count: u64,
    pub stale_count: u64,
    pub last_synced_at: Option<DateTime<Utc>>,
}
