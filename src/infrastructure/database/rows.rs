use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::domain::entities::{CacheEntry, OfflineAction, OptimisticUpdate, RetryPolicy, SyncJob};
use crate::domain::value_objects::{
    ActionPayload, ActionType, CacheKey, CacheType, EntityId, JobId, LocalActionId, RemoteId,
    UpdateId, UserId,
};
use crate::shared::error::{Result, SyncError};

#[derive(Debug, Clone, FromRow)]
pub struct OfflineActionRow {
    pub id: i64,
    pub local_id: String,
    pub user_id: String,
    pub action_type: String,
    pub target_id: Option<String>,
    pub action_data: String,
    pub remote_id: Option<String>,
    pub is_synced: bool,
    pub created_at: i64,
    pub synced_at: Option<i64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SyncQueueRow {
    pub id: i64,
    pub job_id: String,
    pub payload: String,
    pub status: String,
    pub retry_count: i64,
    pub max_retries: i64,
    pub base_delay_ms: i64,
    pub max_delay_ms: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub completed_at: Option<i64>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct OptimisticUpdateRow {
    pub id: i64,
    pub update_id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub original_data: Option<String>,
    pub updated_data: String,
    pub is_confirmed: bool,
    pub created_at: i64,
    pub confirmed_at: Option<i64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CacheMetadataRow {
    pub id: i64,
    pub cache_key: String,
    pub cache_type: String,
    pub last_synced_at: Option<i64>,
    pub last_accessed_at: Option<i64>,
    pub data_version: i64,
    pub is_stale: bool,
    pub expiry_time: Option<i64>,
    pub metadata: Option<String>,
}

pub fn action_from_row(row: OfflineActionRow) -> Result<OfflineAction> {
    let local_id = LocalActionId::new(row.local_id).map_err(SyncError::Validation)?;
    let user_id = UserId::new(row.user_id).map_err(SyncError::Validation)?;
    let action_type: ActionType = row.action_type.parse().map_err(SyncError::Validation)?;
    let target_id = row
        .target_id
        .map(|id| EntityId::new(id).map_err(SyncError::Validation))
        .transpose()?;
    let payload = ActionPayload::from_json(&row.action_data)?;
    let remote_id = row
        .remote_id
        .map(|id| RemoteId::new(id).map_err(SyncError::Validation))
        .transpose()?;

    Ok(OfflineAction {
        record_id: Some(row.id),
        local_id,
        user_id,
        action_type,
        target_id,
        payload,
        remote_id,
        is_synced: row.is_synced,
        created_at: timestamp_to_datetime(row.created_at),
        synced_at: row.synced_at.map(timestamp_to_datetime),
    })
}

pub fn job_from_row(row: SyncQueueRow) -> Result<SyncJob> {
    let job_id = JobId::new(row.job_id).map_err(SyncError::Validation)?;
    let payload = serde_json::from_str(&row.payload)?;
    let policy = RetryPolicy::new(
        clamp_to_u32(row.max_retries),
        row.base_delay_ms.max(0) as u64,
        row.max_delay_ms.max(0) as u64,
    );

    Ok(SyncJob {
        job_id,
        payload,
        retry_count: clamp_to_u32(row.retry_count),
        policy,
        requested_at: timestamp_to_datetime(row.created_at),
    })
}

pub fn update_from_row(row: OptimisticUpdateRow) -> Result<OptimisticUpdate> {
    let update_id = UpdateId::new(row.update_id).map_err(SyncError::Validation)?;
    let entity_type = serde_json::from_value(serde_json::Value::String(row.entity_type))
        .map_err(|err| SyncError::Validation(format!("unknown entity type: {err}")))?;
    let entity_id = EntityId::new(row.entity_id).map_err(SyncError::Validation)?;
    let original_data = row
        .original_data
        .map(|raw| serde_json::from_str(&raw))
        .transpose()?;
    let updated_data = serde_json::from_str(&row.updated_data)?;

    Ok(OptimisticUpdate {
        record_id: Some(row.id),
        update_id,
        entity_type,
        entity_id,
        original_data,
        updated_data,
        is_confirmed: row.is_confirmed,
        created_at: timestamp_to_datetime(row.created_at),
        confirmed_at: row.confirmed_at.map(timestamp_to_datetime),
    })
}

pub fn cache_entry_from_row(row: CacheMetadataRow) -> Result<CacheEntry> {
    let cache_key = CacheKey::new(row.cache_key).map_err(SyncError::Validation)?;
    let cache_type = CacheType::new(row.cache_type).map_err(SyncError::Validation)?;
    let metadata = row
        .metadata
        .map(|raw| serde_json::from_str(&raw))
        .transpose()?;

    Ok(CacheEntry {
        record_id: Some(row.id),
        cache_key,
        cache_type,
        data_version: row.data_version,
        last_synced_at: row.last_synced_at.map(timestamp_to_datetime),
        last_accessed_at: row.last_accessed_at.map(timestamp_to_datetime),
        is_stale: row.is_stale,
        expiry_time: row.expiry_time.map(timestamp_to_datetime),
        metadata,
    })
}

fn clamp_to_u32(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

pub(crate) fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_else(Utc::now)
}
