use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::value_objects::{EntityId, EntityType, UpdateId};

/// A speculative local mutation recorded before remote confirmation.
///
/// While unconfirmed, the entity's externally visible state is
/// `updated_data`; rollback restores exactly `original_data` (or removes
/// the entity when the snapshot is `None`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimisticUpdate {
    pub record_id: Option<i64>,
    pub update_id: UpdateId,
    pub entity_type: EntityType,
    pub entity_id: EntityId,
    pub original_data: Option<Value>,
    pub updated_data: Value,
    pub is_confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// Draft recorded by the optimistic update manager.
#[derive(Debug, Clone)]
pub struct OptimisticUpdateDraft {
    pub entity_type: EntityType,
    pub entity_id: EntityId,
    pub original_data: Option<Value>,
    pub updated_data: Value,
}

impl OptimisticUpdateDraft {
    pub fn new(
        entity_type: EntityType,
        entity_id: EntityId,
        original_data: Option<Value>,
        updated_data: Value,
    ) -> Self {
        Self {
            entity_type,
            entity_id,
            original_data,
            updated_data,
        }
    }
}
