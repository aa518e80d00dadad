use async_trait::async_trait;

use crate::domain::entities::{CacheEntry, CacheStatus, OptimisticUpdate, SyncJob};
use crate::domain::value_objects::{CacheKey, CacheType, EntityId, EntityType, JobId, UpdateId};
use crate::shared::error::Result;

/// Terminal state of a persisted job record. Records stay `Pending` while
/// the scheduler still owns the job; an abandoned job keeps its record
/// pending so a manual retry can pick it up after a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobRecordStatus {
    Pending,
    Completed,
    Cancelled,
}

impl JobRecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobRecordStatus::Pending => "pending",
            JobRecordStatus::Completed => "completed",
            JobRecordStatus::Cancelled => "cancelled",
        }
    }
}

/// Persistence for optimistic updates, cache staleness metadata and
/// sync-queue job records.
#[async_trait]
pub trait OfflineStore: Send + Sync {
    // Optimistic updates. The store is the single writer of `is_confirmed`.
    async fn insert_update(&self, update: OptimisticUpdate) -> Result<()>;
    /// Idempotent; confirming an already-confirmed update is a no-op.
    async fn confirm_update(&self, update_id: &UpdateId) -> Result<()>;
    /// Remove and return an unconfirmed update in one step (the rollback
    /// primitive). `None` when unknown, already rolled back, or confirmed.
    async fn take_unconfirmed_update(
        &self,
        update_id: &UpdateId,
    ) -> Result<Option<OptimisticUpdate>>;
    async fn find_unconfirmed_for_entity(
        &self,
        entity_type: EntityType,
        entity_id: &EntityId,
    ) -> Result<Option<OptimisticUpdate>>;
    async fn unconfirmed_updates(&self) -> Result<Vec<OptimisticUpdate>>;

    // Cache metadata.
    async fn touch(&self, cache_key: &CacheKey, cache_type: &CacheType) -> Result<()>;
    async fn mark_stale(&self, cache_key: &CacheKey) -> Result<()>;
    /// Clear staleness only when `data_version` is strictly newer than the
    /// stored one. Returns whether the confirmation was applied.
    async fn record_sync(
        &self,
        cache_key: &CacheKey,
        cache_type: &CacheType,
        data_version: i64,
    ) -> Result<bool>;
    async fn cache_status(&self) -> Result<CacheStatus>;
    async fn stale_entries(&self) -> Result<Vec<CacheEntry>>;
    async fn cleanup_expired(&self) -> Result<u64>;

    // Sync-queue job records, so jobs can be reconstructed after a restart.
    async fn record_job(&self, job: &SyncJob) -> Result<()>;
    async fn settle_job(
        &self,
        job_id: &JobId,
        status: JobRecordStatus,
        error_message: Option<&str>,
    ) -> Result<()>;
    async fn pending_job_records(&self) -> Result<Vec<SyncJob>>;
}
