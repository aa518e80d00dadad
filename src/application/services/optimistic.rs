use std::sync::Arc;

use crate::application::ports::OfflineStore;
use crate::domain::entities::{OptimisticUpdate, OptimisticUpdateDraft};
use crate::domain::value_objects::{EntityId, EntityType, UpdateId};
use crate::shared::error::Result;

/// Records speculative local mutations and settles them once the remote
/// authority has spoken. The update either gets confirmed (snapshot
/// discarded) or rolled back (snapshot returned for the caller to restore).
pub struct OptimisticUpdateManager {
    store: Arc<dyn OfflineStore>,
}

impl OptimisticUpdateManager {
    pub fn new(store: Arc<dyn OfflineStore>) -> Self {
        Self { store }
    }

    /// Record a speculative mutation. `original_data` in the draft is the
    /// caller's snapshot of the entity before the mutation; `None` means
    /// the entity did not exist yet.
    pub async fn apply(&self, draft: OptimisticUpdateDraft) -> Result<UpdateId> {
        let update = OptimisticUpdate {
            record_id: None,
            update_id: UpdateId::generate(),
            entity_type: draft.entity_type,
            entity_id: draft.entity_id,
            original_data: draft.original_data,
            updated_data: draft.updated_data,
            is_confirmed: false,
            created_at: chrono::Utc::now(),
            confirmed_at: None,
        };
        let update_id = update.update_id.clone();
        self.store.insert_update(update).await?;
        tracing::debug!(
            target: "sync::optimistic",
            update_id = %update_id,
            "optimistic update recorded"
        );
        Ok(update_id)
    }

    /// Settle the update as confirmed. Safe to repeat.
    pub async fn confirm(&self, update_id: &UpdateId) -> Result<()> {
        self.store.confirm_update(update_id).await
    }

    /// Withdraw an unconfirmed update and hand back its record so the
    /// caller can restore `original_data` (or remove the entity when the
    /// snapshot is `None`). Repeating a rollback yields `None`.
    pub async fn rollback(&self, update_id: &UpdateId) -> Result<Option<OptimisticUpdate>> {
        let taken = self.store.take_unconfirmed_update(update_id).await?;
        if taken.is_some() {
            tracing::debug!(
                target: "sync::optimistic",
                update_id = %update_id,
                "optimistic update rolled back"
            );
        }
        Ok(taken)
    }

    /// Roll back whatever unconfirmed update currently shadows the entity.
    pub async fn rollback_for_entity(
        &self,
        entity_type: EntityType,
        entity_id: &EntityId,
    ) -> Result<Option<OptimisticUpdate>> {
        match self
            .store
            .find_unconfirmed_for_entity(entity_type, entity_id)
            .await?
        {
            Some(update) => self.rollback(&update.update_id).await,
            None => Ok(None),
        }
    }

    pub async fn unconfirmed(&self) -> Result<Vec<OptimisticUpdate>> {
        self.store.unconfirmed_updates().await
    }
}
