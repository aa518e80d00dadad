use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::offline_action::OfflineAction;
use crate::domain::value_objects::RemoteId;

/// How a detected divergence was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// Both sides mutated after the last confirmed sync, with no version
    /// counter to compare.
    Timestamp,
    /// The remote version counter advanced past the value the local action
    /// was based on.
    Version,
}

/// The user's (or policy's) decision for one conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictChoice {
    Local,
    Remote,
}

/// Authoritative remote state reported alongside a divergence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub remote_id: RemoteId,
    pub doc_version: Option<i64>,
    pub modified_at: Option<DateTime<Utc>>,
    pub data: Value,
}

/// A divergence between a locally queued action and the remote authority,
/// awaiting resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConflict {
    pub conflict_id: String,
    pub local_action: OfflineAction,
    pub remote: Option<RemoteRecord>,
    pub conflict_type: ConflictType,
    pub detected_at: DateTime<Utc>,
}

impl SyncConflict {
    pub fn new(
        local_action: OfflineAction,
        remote: Option<RemoteRecord>,
        conflict_type: ConflictType,
    ) -> Self {
        Self {
            conflict_id: Uuid::new_v4().to_string(),
            local_action,
            remote,
            conflict_type,
            detected_at: Utc::now(),
        }
    }
}
