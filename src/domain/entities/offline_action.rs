use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{
    ActionPayload, ActionType, CacheKey, EntityId, EntityType, LocalActionId, RemoteId, UserId,
};

/// A pending user mutation recorded for later delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineAction {
    pub record_id: Option<i64>,
    pub local_id: LocalActionId,
    pub user_id: UserId,
    pub action_type: ActionType,
    pub target_id: Option<EntityId>,
    pub payload: ActionPayload,
    pub remote_id: Option<RemoteId>,
    pub is_synced: bool,
    pub created_at: DateTime<Utc>,
    pub synced_at: Option<DateTime<Utc>>,
}

impl OfflineAction {
    pub fn mark_synced(&mut self, remote_id: RemoteId, synced_at: DateTime<Utc>) {
        self.is_synced = true;
        self.remote_id = Some(remote_id);
        self.synced_at = Some(synced_at);
    }

    /// Entity this action mutates, for optimistic-update lookup and cache
    /// bookkeeping. The payload names the entity where it can; the ledger
    /// `target_id` and owning user are fallbacks.
    pub fn entity_context(&self) -> Option<EntityContext> {
        let entity_type = self.action_type.entity_type();
        let entity_id = self
            .payload
            .entity_id(&self.user_id)
            .or_else(|| self.target_id.clone())?;
        Some(EntityContext {
            entity_type,
            entity_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityContext {
    pub entity_type: EntityType,
    pub entity_id: EntityId,
}

impl EntityContext {
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::for_entity(self.entity_type, &self.entity_id)
    }
}

/// Draft of an action about to be enqueued. The ledger assigns `local_id`
/// when the draft carries none.
#[derive(Debug, Clone)]
pub struct NewOfflineAction {
    pub local_id: Option<LocalActionId>,
    pub user_id: UserId,
    pub target_id: Option<EntityId>,
    pub payload: ActionPayload,
}

impl NewOfflineAction {
    pub fn new(user_id: UserId, target_id: Option<EntityId>, payload: ActionPayload) -> Self {
        Self {
            local_id: None,
            user_id,
            target_id,
            payload,
        }
    }

    pub fn with_local_id(mut self, local_id: LocalActionId) -> Self {
        self.local_id = Some(local_id);
        self
    }
}
