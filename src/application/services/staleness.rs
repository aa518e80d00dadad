use std::sync::Arc;

use crate::application::ports::OfflineStore;
use crate::domain::entities::{CacheEntry, CacheStatus, EntityContext};
use crate::domain::value_objects::{CacheKey, CacheType};
use crate::shared::error::Result;

/// Tracks which cached entities still mirror the remote authority.
/// Staleness is monotonic until a strictly newer sync confirmation clears
/// it.
pub struct CacheStalenessTracker {
    store: Arc<dyn OfflineStore>,
}

impl CacheStalenessTracker {
    pub fn new(store: Arc<dyn OfflineStore>) -> Self {
        Self { store }
    }

    /// Record a read without touching staleness or version.
    pub async fn touch(&self, cache_key: &CacheKey, cache_type: &CacheType) -> Result<()> {
        self.store.touch(cache_key, cache_type).await
    }

    pub async fn mark_stale(&self, cache_key: &CacheKey) -> Result<()> {
        self.store.mark_stale(cache_key).await
    }

    /// Mark the entity behind an action stale, creating the entry when the
    /// entity was never cached.
    pub async fn mark_entity_stale(&self, context: &EntityContext) -> Result<()> {
        let cache_key = context.cache_key();
        let cache_type = CacheType::from(context.entity_type);
        self.store.touch(&cache_key, &cache_type).await?;
        self.store.mark_stale(&cache_key).await
    }

    /// Confirm a sync at `data_version`. Returns false when the stored
    /// version was already at least as new and nothing changed.
    pub async fn record_sync(
        &self,
        cache_key: &CacheKey,
        cache_type: &CacheType,
        data_version: i64,
    ) -> Result<bool> {
        let applied = self
            .store
            .record_sync(cache_key, cache_type, data_version)
            .await?;
        if !applied {
            tracing::debug!(
                target: "sync::cache",
                cache_key = %cache_key,
                data_version,
                "stale sync confirmation ignored"
            );
        }
        Ok(applied)
    }

    pub async fn status(&self) -> Result<CacheStatus> {
        self.store.cache_status().await
    }

    /// Entries needing a refresh, least recently synced first.
    pub async fn stale_entries(&self) -> Result<Vec<CacheEntry>> {
        self.store.stale_entries().await
    }

    pub async fn cleanup_expired(&self) -> Result<u64> {
        self.store.cleanup_expired().await
    }
}
