use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Sqlite};

use super::rows::{action_from_row, OfflineActionRow};
use crate::application::ports::{ActionFilter, ActionLedger};
use crate::domain::entities::{NewOfflineAction, OfflineAction};
use crate::domain::value_objects::{LocalActionId, RemoteId, UserId};
use crate::shared::error::{Result, SyncError};

/// SQLite-backed action ledger.
pub struct SqliteActionLedger {
    pool: Pool<Sqlite>,
}

impl SqliteActionLedger {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    async fn fetch(&self, local_id: &LocalActionId) -> Result<Option<OfflineAction>> {
        let row = sqlx::query_as::<_, OfflineActionRow>(
            "SELECT * FROM offline_actions WHERE local_id = ?",
        )
        .bind(local_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(action_from_row).transpose()
    }
}

#[async_trait]
impl ActionLedger for SqliteActionLedger {
    async fn save(&self, draft: NewOfflineAction) -> Result<OfflineAction> {
        let local_id = draft.local_id.unwrap_or_else(LocalActionId::generate);
        let action_type = draft.payload.action_type();
        let action_data = draft.payload.to_json()?;
        let created_at = Utc::now().timestamp();

        // Replays of the same local_id keep the first record untouched.
        sqlx::query(
            r#"
            INSERT INTO offline_actions (
                local_id, user_id, action_type, target_id, action_data,
                is_synced, created_at
            )
            VALUES (?, ?, ?, ?, ?, 0, ?)
            ON CONFLICT(local_id) DO NOTHING
            "#,
        )
        .bind(local_id.as_str())
        .bind(draft.user_id.as_str())
        .bind(action_type.as_str())
        .bind(draft.target_id.as_ref().map(|id| id.as_str().to_string()))
        .bind(&action_data)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        self.fetch(&local_id)
            .await?
            .ok_or_else(|| SyncError::Internal(format!("saved action {local_id} not readable")))
    }

    async fn get(&self, local_id: &LocalActionId) -> Result<Option<OfflineAction>> {
        self.fetch(local_id).await
    }

    async fn list(&self, filter: ActionFilter) -> Result<Vec<OfflineAction>> {
        let mut sql = String::from("SELECT * FROM offline_actions WHERE 1 = 1");
        if filter.user_id.is_some() {
            sql.push_str(" AND user_id = ?");
        }
        if filter.is_synced.is_some() {
            sql.push_str(" AND is_synced = ?");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");
        if filter.limit.is_some() {
            sql.push_str(" LIMIT ?");
        }

        let mut query = sqlx::query_as::<_, OfflineActionRow>(&sql);
        if let Some(user_id) = &filter.user_id {
            query = query.bind(user_id.as_str().to_string());
        }
        if let Some(is_synced) = filter.is_synced {
            query = query.bind(is_synced);
        }
        if let Some(limit) = filter.limit {
            query = query.bind(i64::from(limit));
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(action_from_row).collect()
    }

    async fn pending_in_creation_order(&self, user_id: &UserId) -> Result<Vec<OfflineAction>> {
        let rows = sqlx::query_as::<_, OfflineActionRow>(
            r#"
            SELECT * FROM offline_actions
            WHERE user_id = ? AND is_synced = 0
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(action_from_row).collect()
    }

    async fn mark_synced(&self, local_id: &LocalActionId, remote_id: &RemoteId) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE offline_actions
            SET is_synced = 1, remote_id = ?, synced_at = ?
            WHERE local_id = ? AND is_synced = 0
            "#,
        )
        .bind(remote_id.as_str())
        .bind(Utc::now().timestamp())
        .bind(local_id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }
        // Either already synced (fine, completions may repeat) or unknown.
        match self.fetch(local_id).await? {
            Some(_) => Ok(()),
            None => Err(SyncError::NotFound(format!("offline action {local_id}"))),
        }
    }

    async fn remove(&self, local_id: &LocalActionId) -> Result<()> {
        sqlx::query("DELETE FROM offline_actions WHERE local_id = ?")
            .bind(local_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
