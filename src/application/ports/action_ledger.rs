use async_trait::async_trait;

use crate::domain::entities::{NewOfflineAction, OfflineAction};
use crate::domain::value_objects::{LocalActionId, RemoteId, UserId};
use crate::shared::error::Result;

/// Listing filter for ledger queries. Results are newest-first.
#[derive(Debug, Clone, Default)]
pub struct ActionFilter {
    pub user_id: Option<UserId>,
    pub is_synced: Option<bool>,
    pub limit: Option<u32>,
}

/// Durable store of pending user actions; the single source of truth for
/// what still needs to be pushed, and the single writer of `is_synced`.
#[async_trait]
pub trait ActionLedger: Send + Sync {
    /// Persist a draft and return the stored record. Idempotent on
    /// `local_id`: a duplicate save returns the existing record untouched.
    async fn save(&self, draft: NewOfflineAction) -> Result<OfflineAction>;

    async fn get(&self, local_id: &LocalActionId) -> Result<Option<OfflineAction>>;

    async fn list(&self, filter: ActionFilter) -> Result<Vec<OfflineAction>>;

    /// Unsynced actions for one user, oldest first. Push cycles consume
    /// this order to preserve causal intent.
    async fn pending_in_creation_order(&self, user_id: &UserId) -> Result<Vec<OfflineAction>>;

    /// `NotFound` on an unknown `local_id`; a no-op when the action is
    /// already synced (duplicate completions are expected).
    async fn mark_synced(&self, local_id: &LocalActionId, remote_id: &RemoteId) -> Result<()>;

    /// Hard delete. Only used after confirmed sync or explicit abandonment.
    async fn remove(&self, local_id: &LocalActionId) -> Result<()>;
}
