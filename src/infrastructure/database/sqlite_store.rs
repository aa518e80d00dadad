use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Sqlite};

use super::rows::{
    cache_entry_from_row, job_from_row, update_from_row, CacheMetadataRow, OptimisticUpdateRow,
    SyncQueueRow,
};
use crate::application::ports::{JobRecordStatus, OfflineStore};
use crate::domain::entities::{CacheEntry, CacheStatus, CacheTypeStatus, OptimisticUpdate, SyncJob};
use crate::domain::value_objects::{CacheKey, CacheType, EntityId, EntityType, JobId, UpdateId};
use crate::shared::error::{Result, SyncError};

/// SQLite persistence for optimistic updates, cache metadata and job
/// records.
pub struct SqliteOfflineStore {
    pool: Pool<Sqlite>,
    /// When set, a confirmed sync stamps `expiry_time = now + ttl`.
    default_ttl: Option<u64>,
}

impl SqliteOfflineStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            pool,
            default_ttl: None,
        }
    }

    pub fn with_default_ttl(mut self, ttl_seconds: u64) -> Self {
        self.default_ttl = Some(ttl_seconds);
        self
    }
}

#[async_trait]
impl OfflineStore for SqliteOfflineStore {
    async fn insert_update(&self, update: OptimisticUpdate) -> Result<()> {
        let original = update
            .original_data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let updated = serde_json::to_string(&update.updated_data)?;

        sqlx::query(
            r#"
            INSERT INTO optimistic_updates (
                update_id, entity_type, entity_id, original_data,
                updated_data, is_confirmed, created_at
            )
            VALUES (?, ?, ?, ?, ?, 0, ?)
            ON CONFLICT(update_id) DO NOTHING
            "#,
        )
        .bind(update.update_id.as_str())
        .bind(update.entity_type.as_str())
        .bind(update.entity_id.as_str())
        .bind(original)
        .bind(updated)
        .bind(update.created_at.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn confirm_update(&self, update_id: &UpdateId) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE optimistic_updates
            SET is_confirmed = 1, confirmed_at = ?
            WHERE update_id = ? AND is_confirmed = 0
            "#,
        )
        .bind(Utc::now().timestamp())
        .bind(update_id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn take_unconfirmed_update(
        &self,
        update_id: &UpdateId,
    ) -> Result<Option<OptimisticUpdate>> {
        let row = sqlx::query_as::<_, OptimisticUpdateRow>(
            "SELECT * FROM optimistic_updates WHERE update_id = ? AND is_confirmed = 0",
        )
        .bind(update_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        sqlx::query("DELETE FROM optimistic_updates WHERE update_id = ? AND is_confirmed = 0")
            .bind(update_id.as_str())
            .execute(&self.pool)
            .await?;
        update_from_row(row).map(Some)
    }

    async fn find_unconfirmed_for_entity(
        &self,
        entity_type: EntityType,
        entity_id: &EntityId,
    ) -> Result<Option<OptimisticUpdate>> {
        let row = sqlx::query_as::<_, OptimisticUpdateRow>(
            r#"
            SELECT * FROM optimistic_updates
            WHERE entity_type = ? AND entity_id = ? AND is_confirmed = 0
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(entity_type.as_str())
        .bind(entity_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(update_from_row).transpose()
    }

    async fn unconfirmed_updates(&self) -> Result<Vec<OptimisticUpdate>> {
        let rows = sqlx::query_as::<_, OptimisticUpdateRow>(
            r#"
            SELECT * FROM optimistic_updates
            WHERE is_confirmed = 0
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(update_from_row).collect()
    }

    async fn touch(&self, cache_key: &CacheKey, cache_type: &CacheType) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cache_metadata (cache_key, cache_type, last_accessed_at, is_stale)
            VALUES (?, ?, ?, 0)
            ON CONFLICT(cache_key) DO UPDATE SET
                last_accessed_at = excluded.last_accessed_at
            "#,
        )
        .bind(cache_key.as_str())
        .bind(cache_type.as_str())
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_stale(&self, cache_key: &CacheKey) -> Result<()> {
        sqlx::query("UPDATE cache_metadata SET is_stale = 1 WHERE cache_key = ?")
            .bind(cache_key.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_sync(
        &self,
        cache_key: &CacheKey,
        cache_type: &CacheType,
        data_version: i64,
    ) -> Result<bool> {
        let now = Utc::now().timestamp();
        let expiry = self.default_ttl.map(|ttl| now + ttl as i64);

        // Stale confirmations (version not strictly newer) are dropped so a
        // late retry can never roll the entry backwards.
        let result = sqlx::query(
            r#"
            INSERT INTO cache_metadata (
                cache_key, cache_type, last_synced_at, last_accessed_at,
                data_version, is_stale, expiry_time
            )
            VALUES (?1, ?2, ?3, ?3, ?4, 0, ?5)
            ON CONFLICT(cache_key) DO UPDATE SET
                data_version = excluded.data_version,
                last_synced_at = excluded.last_synced_at,
                is_stale = 0,
                expiry_time = excluded.expiry_time
            WHERE excluded.data_version > cache_metadata.data_version
            "#,
        )
        .bind(cache_key.as_str())
        .bind(cache_type.as_str())
        .bind(now)
        .bind(data_version)
        .bind(expiry)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn cache_status(&self) -> Result<CacheStatus> {
        let rows = sqlx::query_as::<_, (String, i64, i64, Option<i64>)>(
            r#"
            SELECT
                cache_type,
                COUNT(*) AS item_count,
                SUM(CASE WHEN is_stale = 1 THEN 1 ELSE 0 END) AS stale_count,
                MAX(last_synced_at) AS last_synced_at
            FROM cache_metadata
            GROUP BY cache_type
            ORDER BY cache_type
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut status = CacheStatus {
            total_items: 0,
            stale_items: 0,
            per_type: Vec::with_capacity(rows.len()),
        };
        for (cache_type, item_count, stale_count, last_synced_at) in rows {
            status.total_items += item_count.max(0) as u64;
            status.stale_items += stale_count.max(0) as u64;
            status.per_type.push(CacheTypeStatus {
                cache_type: CacheType::new(cache_type).map_err(SyncError::Validation)?,
                item_count: item_count.max(0) as u64,
                stale_count: stale_count.max(0) as u64,
                last_synced_at: last_synced_at.map(super::rows::timestamp_to_datetime),
            });
        }
        Ok(status)
    }

    async fn stale_entries(&self) -> Result<Vec<CacheEntry>> {
        let rows = sqlx::query_as::<_, CacheMetadataRow>(
            r#"
            SELECT * FROM cache_metadata
            WHERE is_stale = 1
               OR (expiry_time IS NOT NULL AND expiry_time < ?)
            ORDER BY COALESCE(last_synced_at, 0) ASC, id ASC
            "#,
        )
        .bind(Utc::now().timestamp())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(cache_entry_from_row).collect()
    }

    async fn cleanup_expired(&self) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM cache_metadata WHERE expiry_time IS NOT NULL AND expiry_time < ?",
        )
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn record_job(&self, job: &SyncJob) -> Result<()> {
        let payload = serde_json::to_string(&job.payload)?;
        let now = Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO sync_queue (
                job_id, payload, status, retry_count, max_retries,
                base_delay_ms, max_delay_ms, created_at, updated_at
            )
            VALUES (?, ?, 'pending', ?, ?, ?, ?, ?, ?)
            ON CONFLICT(job_id) DO NOTHING
            "#,
        )
        .bind(job.job_id.as_str())
        .bind(payload)
        .bind(i64::from(job.retry_count))
        .bind(i64::from(job.policy.max_retries))
        .bind(job.policy.base_delay_ms as i64)
        .bind(job.policy.max_delay_ms as i64)
        .bind(job.requested_at.timestamp())
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn settle_job(
        &self,
        job_id: &JobId,
        status: JobRecordStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let now = Utc::now().timestamp();
        let completed_at = match status {
            JobRecordStatus::Pending => None,
            _ => Some(now),
        };
        sqlx::query(
            r#"
            UPDATE sync_queue
            SET status = ?, completed_at = ?, error_message = ?, updated_at = ?
            WHERE job_id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(completed_at)
        .bind(error_message)
        .bind(now)
        .bind(job_id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn pending_job_records(&self) -> Result<Vec<SyncJob>> {
        let rows = sqlx::query_as::<_, SyncQueueRow>(
            r#"
            SELECT * FROM sync_queue
            WHERE status = 'pending'
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(job_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::RetryPolicy;
    use crate::domain::value_objects::UpdateId;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_store() -> SqliteOfflineStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        SqliteOfflineStore::new(pool)
    }

    fn sample_update(entity_id: &str) -> OptimisticUpdate {
        OptimisticUpdate {
            record_id: None,
            update_id: UpdateId::generate(),
            entity_type: EntityType::Post,
            entity_id: EntityId::new(entity_id.to_string()).unwrap(),
            original_data: Some(serde_json::json!({"likes": 1})),
            updated_data: serde_json::json!({"likes": 2}),
            is_confirmed: false,
            created_at: Utc::now(),
            confirmed_at: None,
        }
    }

    #[tokio::test]
    async fn test_take_unconfirmed_returns_snapshot_once() {
        let store = setup_store().await;
        let update = sample_update("post-1");
        store.insert_update(update.clone()).await.unwrap();

        let taken = store
            .take_unconfirmed_update(&update.update_id)
            .await
            .unwrap()
            .expect("unconfirmed update");
        assert_eq!(taken.original_data, update.original_data);

        // Rollback already consumed the record.
        assert!(store
            .take_unconfirmed_update(&update.update_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_confirmed_update_cannot_be_rolled_back() {
        let store = setup_store().await;
        let update = sample_update("post-1");
        store.insert_update(update.clone()).await.unwrap();

        store.confirm_update(&update.update_id).await.unwrap();
        store.confirm_update(&update.update_id).await.unwrap();

        assert!(store
            .take_unconfirmed_update(&update.update_id)
            .await
            .unwrap()
            .is_none());
        assert!(store.unconfirmed_updates().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_unconfirmed_picks_latest_for_entity() {
        let store = setup_store().await;
        let mut older = sample_update("post-1");
        older.created_at = Utc::now() - chrono::Duration::seconds(10);
        let newer = sample_update("post-1");
        store.insert_update(older).await.unwrap();
        store.insert_update(newer.clone()).await.unwrap();

        let found = store
            .find_unconfirmed_for_entity(
                EntityType::Post,
                &EntityId::new("post-1".to_string()).unwrap(),
            )
            .await
            .unwrap()
            .expect("latest update");
        assert_eq!(found.update_id, newer.update_id);
    }

    #[tokio::test]
    async fn test_record_sync_requires_strictly_newer_version() {
        let store = setup_store().await;
        let key = CacheKey::new("post:post-1".to_string()).unwrap();
        let kind = CacheType::new("post".to_string()).unwrap();

        assert!(store.record_sync(&key, &kind, 2).await.unwrap());
        store.mark_stale(&key).await.unwrap();

        // Late confirmation with an older version keeps the entry stale.
        assert!(!store.record_sync(&key, &kind, 2).await.unwrap());
        assert_eq!(store.stale_entries().await.unwrap().len(), 1);

        assert!(store.record_sync(&key, &kind, 3).await.unwrap());
        assert!(store.stale_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_first_sync_at_version_one_clears_touched_entry() {
        let store = setup_store().await;
        let key = CacheKey::new("post:post-1".to_string()).unwrap();
        let kind = CacheType::new("post".to_string()).unwrap();

        // An entry created by touch has never seen a sync; a fresh remote
        // record's first version must still count as strictly newer.
        store.touch(&key, &kind).await.unwrap();
        store.mark_stale(&key).await.unwrap();

        assert!(store.record_sync(&key, &kind, 1).await.unwrap());
        assert!(store.stale_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_status_groups_by_type() {
        let store = setup_store().await;
        let post_type = CacheType::new("post".to_string()).unwrap();
        let topic_type = CacheType::new("topic".to_string()).unwrap();

        for n in 0..3 {
            let key = CacheKey::new(format!("post:p{n}")).unwrap();
            store.touch(&key, &post_type).await.unwrap();
        }
        store
            .touch(&CacheKey::new("topic:t1".to_string()).unwrap(), &topic_type)
            .await
            .unwrap();
        store
            .mark_stale(&CacheKey::new("post:p0".to_string()).unwrap())
            .await
            .unwrap();

        let status = store.cache_status().await.unwrap();
        assert_eq!(status.total_items, 4);
        assert_eq!(status.stale_items, 1);

        let posts = status
            .per_type
            .iter()
            .find(|t| t.cache_type == post_type)
            .unwrap();
        assert_eq!(posts.item_count, 3);
        assert_eq!(posts.stale_count, 1);
    }

    #[tokio::test]
    async fn test_cleanup_expired_removes_only_past_entries() {
        let store = setup_store().await;
        let kind = CacheType::new("post".to_string()).unwrap();
        let expired = CacheKey::new("post:old".to_string()).unwrap();
        let fresh = CacheKey::new("post:new".to_string()).unwrap();

        store.touch(&expired, &kind).await.unwrap();
        store.touch(&fresh, &kind).await.unwrap();
        sqlx::query("UPDATE cache_metadata SET expiry_time = ? WHERE cache_key = ?")
            .bind(Utc::now().timestamp() - 60)
            .bind(expired.as_str())
            .execute(&store.pool)
            .await
            .unwrap();

        assert_eq!(store.cleanup_expired().await.unwrap(), 1);
        assert_eq!(store.cache_status().await.unwrap().total_items, 1);
    }

    #[tokio::test]
    async fn test_job_records_round_trip_and_settle() {
        let store = setup_store().await;
        let job = SyncJob::new(
            JobId::generate(),
            serde_json::json!({"user_id": "alice"}),
            RetryPolicy::new(3, 5_000, 300_000),
        );

        store.record_job(&job).await.unwrap();
        store.record_job(&job).await.unwrap();

        let pending = store.pending_job_records().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].job_id, job.job_id);
        assert_eq!(pending[0].policy, job.policy);

        store
            .settle_job(&job.job_id, JobRecordStatus::Completed, None)
            .await
            .unwrap();
        assert!(store.pending_job_records().await.unwrap().is_empty());
    }
}
