use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::application::ports::{
    ActionLedger, JobRecordStatus, OfflineStore, PushOutcome, RemoteAuthority,
};
use crate::application::services::optimistic::OptimisticUpdateManager;
use crate::application::services::staleness::CacheStalenessTracker;
use crate::domain::entities::{
    ConflictChoice, ConflictType, OfflineAction, RemoteRecord, SyncConflict, SyncOutcome,
};
use crate::domain::value_objects::{ActionPayload, CacheType, RemoteId, UserId};
use crate::scheduler::{BusMessage, ChannelBus};
use crate::shared::error::{Result, SyncError};

/// Payload carried by sync jobs over the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    pub user_id: String,
}

/// Drives push cycles against the remote authority and turns divergences
/// into resolvable conflicts. Holds no scheduler state; retry timing stays
/// on the other side of the bus.
pub struct SyncCoordinator {
    ledger: Arc<dyn ActionLedger>,
    authority: Arc<dyn RemoteAuthority>,
    store: Arc<dyn OfflineStore>,
    optimistic: OptimisticUpdateManager,
    staleness: CacheStalenessTracker,
    conflicts: Mutex<Vec<SyncConflict>>,
    // One push cycle per user at a time; a latched trigger is skipped.
    active_users: Mutex<HashSet<String>>,
}

impl SyncCoordinator {
    pub fn new(
        ledger: Arc<dyn ActionLedger>,
        store: Arc<dyn OfflineStore>,
        authority: Arc<dyn RemoteAuthority>,
    ) -> Self {
        Self {
            ledger,
            authority,
            optimistic: OptimisticUpdateManager::new(store.clone()),
            staleness: CacheStalenessTracker::new(store.clone()),
            store,
            conflicts: Mutex::new(Vec::new()),
            active_users: Mutex::new(HashSet::new()),
        }
    }

    /// Push the user's pending actions in creation order. Stops at the
    /// first transient failure so later actions cannot overtake earlier
    /// ones; conflicts and permanent rejections do not stop the cycle.
    pub async fn push_pending(&self, user_id: &UserId) -> Result<SyncOutcome> {
        if !self.latch(user_id) {
            tracing::debug!(
                target: "sync::coordinator",
                user_id = %user_id,
                "push cycle already running, skipping"
            );
            return Ok(SyncOutcome::skipped());
        }
        let result = self.run_cycle(user_id).await;
        self.unlatch(user_id);
        result
    }

    async fn run_cycle(&self, user_id: &UserId) -> Result<SyncOutcome> {
        let pending = self.ledger.pending_in_creation_order(user_id).await?;
        let mut outcome = SyncOutcome::default();

        for action in pending {
            outcome.total_processed += 1;
            match self.authority.push(&action, false).await {
                Ok(PushOutcome::Accepted {
                    remote_id,
                    remote_version,
                }) => {
                    self.finish_success(&action, remote_id, remote_version)
                        .await?;
                    outcome.synced.push(action.local_id.clone());
                }
                Ok(PushOutcome::Diverged { remote }) => {
                    if Self::is_identical(&action, &remote) {
                        // Both sides already agree; adopt the remote record.
                        self.finish_success(&action, remote.remote_id.clone(), remote.doc_version)
                            .await?;
                        outcome.synced.push(action.local_id.clone());
                        continue;
                    }
                    let conflict_id = self.register_conflict(action.clone(), remote).await?;
                    outcome.conflicts.push(conflict_id);
                }
                Err(SyncError::Network(reason)) => {
                    tracing::info!(
                        target: "sync::coordinator",
                        local_id = %action.local_id,
                        reason,
                        "transient push failure, cycle stops here"
                    );
                    outcome.failed.push(action.local_id.clone());
                    outcome.transient_failure = true;
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        tracing::info!(
            target: "sync::coordinator",
            user_id = %user_id,
            synced = outcome.synced.len(),
            conflicts = outcome.conflicts.len(),
            failed = outcome.failed.len(),
            "push cycle finished"
        );
        Ok(outcome)
    }

    async fn finish_success(
        &self,
        action: &OfflineAction,
        remote_id: RemoteId,
        remote_version: Option<i64>,
    ) -> Result<()> {
        self.ledger.mark_synced(&action.local_id, &remote_id).await?;

        if let Some(context) = action.entity_context() {
            if let Some(update) = self
                .store
                .find_unconfirmed_for_entity(context.entity_type, &context.entity_id)
                .await?
            {
                self.optimistic.confirm(&update.update_id).await?;
            }

            let cache_key = context.cache_key();
            let cache_type = CacheType::from(context.entity_type);
            match remote_version {
                // Only a reported version may clear staleness.
                Some(version) => {
                    self.staleness
                        .record_sync(&cache_key, &cache_type, version)
                        .await?;
                }
                None => self.staleness.touch(&cache_key, &cache_type).await?,
            }
        }
        Ok(())
    }

    /// A divergence over identical content is agreement, not a conflict.
    fn is_identical(action: &OfflineAction, remote: &RemoteRecord) -> bool {
        let local = match &action.payload {
            ActionPayload::TopicUpdate { fields, .. }
            | ActionPayload::ProfileUpdate { fields, .. } => fields.clone(),
            other => serde_json::to_value(other).unwrap_or_default(),
        };
        local == remote.data
    }

    fn classify(action: &OfflineAction, remote: &RemoteRecord) -> ConflictType {
        match (action.payload.base_version(), remote.doc_version) {
            // Only a counter that moved past what the action assumed makes
            // this a version conflict.
            (Some(base), Some(current)) if current > base => ConflictType::Version,
            _ => ConflictType::Timestamp,
        }
    }

    async fn register_conflict(
        &self,
        action: OfflineAction,
        remote: RemoteRecord,
    ) -> Result<String> {
        if let Some(context) = action.entity_context() {
            self.staleness.mark_entity_stale(&context).await?;
        }

        let conflict_type = Self::classify(&action, &remote);
        let conflict = SyncConflict::new(action, Some(remote), conflict_type);
        let conflict_id = conflict.conflict_id.clone();
        tracing::warn!(
            target: "sync::coordinator",
            conflict_id = %conflict_id,
            local_id = %conflict.local_action.local_id,
            ?conflict_type,
            "sync conflict detected"
        );
        self.lock_conflicts().push(conflict);
        Ok(conflict_id)
    }

    pub fn list_conflicts(&self) -> Vec<SyncConflict> {
        self.lock_conflicts().clone()
    }

    /// Settle a detected conflict. `Local` forces the queued action onto
    /// the authority; `Remote` discards it, rolling back any optimistic
    /// update that still shadows the entity.
    pub async fn resolve_conflict(&self, conflict_id: &str, choice: ConflictChoice) -> Result<()> {
        let conflict = {
            let mut conflicts = self.lock_conflicts();
            let index = conflicts
                .iter()
                .position(|c| c.conflict_id == conflict_id)
                .ok_or_else(|| SyncError::NotFound(format!("conflict {conflict_id}")))?;
            conflicts.remove(index)
        };

        match choice {
            ConflictChoice::Local => self.resolve_local(conflict).await,
            ConflictChoice::Remote => self.resolve_remote(conflict).await,
        }
    }

    async fn resolve_local(&self, conflict: SyncConflict) -> Result<()> {
        let action = conflict.local_action.clone();
        match self.authority.push(&action, true).await {
            Ok(PushOutcome::Accepted {
                remote_id,
                remote_version,
            }) => {
                self.finish_success(&action, remote_id, remote_version)
                    .await?;
                tracing::info!(
                    target: "sync::coordinator",
                    conflict_id = %conflict.conflict_id,
                    "conflict resolved in favor of local state"
                );
                Ok(())
            }
            Ok(PushOutcome::Diverged { .. }) => {
                // The forced push was refused; keep the conflict open.
                self.lock_conflicts().push(conflict);
                Err(SyncError::Internal(
                    "forced push was rejected by the remote authority".to_string(),
                ))
            }
            Err(err) => {
                self.lock_conflicts().push(conflict);
                Err(err)
            }
        }
    }

    async fn resolve_remote(&self, conflict: SyncConflict) -> Result<()> {
        let action = conflict.local_action;
        let remote_id = conflict
            .remote
            .as_ref()
            .map(|remote| remote.remote_id.clone())
            .unwrap_or_else(|| RemoteId::adopted(&action.local_id));

        // The action is settled without delivery; the remote record wins.
        self.ledger.mark_synced(&action.local_id, &remote_id).await?;

        if let Some(context) = action.entity_context() {
            self.optimistic
                .rollback_for_entity(context.entity_type, &context.entity_id)
                .await?;
            let cache_key = context.cache_key();
            let cache_type = CacheType::from(context.entity_type);
            match conflict.remote.as_ref().and_then(|r| r.doc_version) {
                Some(version) => {
                    self.staleness
                        .record_sync(&cache_key, &cache_type, version)
                        .await?;
                }
                None => self.staleness.mark_entity_stale(&context).await?,
            }
        }
        tracing::info!(
            target: "sync::coordinator",
            conflict_id = %conflict.conflict_id,
            "conflict resolved in favor of remote state"
        );
        Ok(())
    }

    /// Consume `process` messages from the bus, run the push cycle they
    /// ask for and report the attempt back to the scheduler. Runs until
    /// the bus closes.
    pub fn spawn_listener(self: Arc<Self>, bus: ChannelBus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            loop {
                let job = match rx.recv().await {
                    Ok(BusMessage::Process { job }) => job,
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            target: "sync::coordinator",
                            skipped,
                            "listener lagged behind the bus"
                        );
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                let payload: JobPayload = match serde_json::from_value(job.payload.clone()) {
                    Ok(payload) => payload,
                    Err(err) => {
                        tracing::error!(
                            target: "sync::coordinator",
                            job_id = %job.job_id,
                            %err,
                            "job payload not decodable, retiring job"
                        );
                        let _ = self
                            .store
                            .settle_job(
                                &job.job_id,
                                JobRecordStatus::Cancelled,
                                Some("payload not decodable"),
                            )
                            .await;
                        bus.publish(BusMessage::Complete {
                            job_id: job.job_id,
                            success: true,
                        });
                        continue;
                    }
                };

                let success = match UserId::new(payload.user_id) {
                    Ok(user_id) => match self.push_pending(&user_id).await {
                        // A latched cycle is reported as failure so the
                        // scheduler reschedules; the running cycle may be a
                        // manual trigger that reports to no scheduler, and
                        // a duplicate `process` later is idempotent anyway.
                        Ok(outcome) => !outcome.skipped && outcome.is_success(),
                        Err(err) => {
                            tracing::error!(
                                target: "sync::coordinator",
                                job_id = %job.job_id,
                                %err,
                                "push cycle failed"
                            );
                            false
                        }
                    },
                    Err(reason) => {
                        tracing::error!(
                            target: "sync::coordinator",
                            job_id = %job.job_id,
                            reason,
                            "job carries an invalid user id, retiring job"
                        );
                        true
                    }
                };

                if success {
                    let _ = self
                        .store
                        .settle_job(&job.job_id, JobRecordStatus::Completed, None)
                        .await;
                }
                bus.publish(BusMessage::Complete {
                    job_id: job.job_id,
                    success,
                });
            }
        })
    }

    fn latch(&self, user_id: &UserId) -> bool {
        self.lock_active().insert(user_id.as_str().to_string())
    }

    fn unlatch(&self, user_id: &UserId) {
        self.lock_active().remove(user_id.as_str());
    }

    fn lock_conflicts(&self) -> std::sync::MutexGuard<'_, Vec<SyncConflict>> {
        self.conflicts.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.active_users.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ActionFilter;
    use crate::domain::entities::{NewOfflineAction, OptimisticUpdateDraft, RetryPolicy, SyncJob};
    use crate::domain::value_objects::{EntityId, EntityType, JobId};
    use crate::infrastructure::database::{SqliteActionLedger, SqliteOfflineStore};
    use async_trait::async_trait;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::sync::Notify;
    use tokio::time::timeout;

    /// Scripted remote authority; pops one outcome per push.
    struct ScriptedAuthority {
        script: Mutex<VecDeque<Result<PushOutcome>>>,
        pushes: Mutex<Vec<(String, bool)>>,
    }

    impl ScriptedAuthority {
        fn new(script: Vec<Result<PushOutcome>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                pushes: Mutex::new(Vec::new()),
            })
        }

        fn pushes(&self) -> Vec<(String, bool)> {
            self.pushes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteAuthority for ScriptedAuthority {
        async fn push(&self, action: &OfflineAction, force: bool) -> Result<PushOutcome> {
            self.pushes
                .lock()
                .unwrap()
                .push((action.local_id.to_string(), force));
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(SyncError::Network("script exhausted".to_string())))
        }
    }

    /// Authority that parks every push until the test releases it.
    struct GatedAuthority {
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl RemoteAuthority for GatedAuthority {
        async fn push(&self, _action: &OfflineAction, _force: bool) -> Result<PushOutcome> {
            self.started.notify_one();
            self.release.notified().await;
            Err(SyncError::Network("connection lost mid-push".to_string()))
        }
    }

    fn accepted(remote_id: &str, version: Option<i64>) -> Result<PushOutcome> {
        Ok(PushOutcome::Accepted {
            remote_id: RemoteId::new(remote_id.to_string()).unwrap(),
            remote_version: version,
        })
    }

    fn diverged(remote_id: &str, version: Option<i64>, data: serde_json::Value) -> Result<PushOutcome> {
        Ok(PushOutcome::Diverged {
            remote: RemoteRecord {
                remote_id: RemoteId::new(remote_id.to_string()).unwrap(),
                doc_version: version,
                modified_at: Some(chrono::Utc::now()),
                data,
            },
        })
    }

    async fn setup_full(
        script: Vec<Result<PushOutcome>>,
    ) -> (
        Arc<SyncCoordinator>,
        Arc<dyn ActionLedger>,
        Arc<dyn OfflineStore>,
        Arc<ScriptedAuthority>,
    ) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        let ledger: Arc<dyn ActionLedger> = Arc::new(SqliteActionLedger::new(pool.clone()));
        let store: Arc<dyn OfflineStore> = Arc::new(SqliteOfflineStore::new(pool));
        let authority = ScriptedAuthority::new(script);
        let coordinator = Arc::new(SyncCoordinator::new(
            ledger.clone(),
            store.clone(),
            authority.clone(),
        ));
        (coordinator, ledger, store, authority)
    }

    async fn setup(
        script: Vec<Result<PushOutcome>>,
    ) -> (Arc<SyncCoordinator>, Arc<dyn ActionLedger>, Arc<ScriptedAuthority>) {
        let (coordinator, ledger, _, authority) = setup_full(script).await;
        (coordinator, ledger, authority)
    }

    fn user() -> UserId {
        UserId::new("alice".to_string()).unwrap()
    }

    async fn queue_like(ledger: &Arc<dyn ActionLedger>, post: &str) -> OfflineAction {
        ledger
            .save(NewOfflineAction::new(
                user(),
                Some(EntityId::new(post.to_string()).unwrap()),
                ActionPayload::Like {
                    post_id: post.to_string(),
                },
            ))
            .await
            .unwrap()
    }

    async fn queue_profile_update(
        ledger: &Arc<dyn ActionLedger>,
        base_version: Option<i64>,
    ) -> OfflineAction {
        ledger
            .save(NewOfflineAction::new(
                user(),
                None,
                ActionPayload::ProfileUpdate {
                    fields: serde_json::json!({"name": "Alice"}),
                    base_version,
                },
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_push_cycle_syncs_in_creation_order() {
        let (coordinator, ledger, authority) =
            setup(vec![accepted("r1", None), accepted("r2", None)]).await;
        let first = queue_like(&ledger, "post-1").await;
        let second = queue_like(&ledger, "post-2").await;

        let outcome = coordinator.push_pending(&user()).await.unwrap();

        assert_eq!(outcome.synced, vec![first.local_id.clone(), second.local_id]);
        assert!(outcome.is_success());
        assert_eq!(
            authority.pushes()[0],
            (first.local_id.to_string(), false)
        );
        assert!(ledger
            .pending_in_creation_order(&user())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_transient_failure_stops_the_cycle() {
        let (coordinator, ledger, authority) = setup(vec![
            accepted("r1", None),
            Err(SyncError::Network("offline".to_string())),
        ])
        .await;
        queue_like(&ledger, "post-1").await;
        let stalled = queue_like(&ledger, "post-2").await;
        queue_like(&ledger, "post-3").await;

        let outcome = coordinator.push_pending(&user()).await.unwrap();

        assert!(outcome.transient_failure);
        assert_eq!(outcome.synced.len(), 1);
        assert_eq!(outcome.failed, vec![stalled.local_id]);
        // The third action was never attempted.
        assert_eq!(authority.pushes().len(), 2);
        assert_eq!(
            ledger.pending_in_creation_order(&user()).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn test_version_divergence_becomes_version_conflict() {
        let (coordinator, ledger, _) = setup(vec![diverged(
            "r-profile",
            Some(3),
            serde_json::json!({"name": "Remote Alice"}),
        )])
        .await;
        queue_profile_update(&ledger, Some(2)).await;

        let outcome = coordinator.push_pending(&user()).await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.conflicts.len(), 1);
        let conflicts = coordinator.list_conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::Version);
    }

    #[tokio::test]
    async fn test_divergence_without_versions_is_timestamp_conflict() {
        let (coordinator, ledger, _) = setup(vec![diverged(
            "r-profile",
            None,
            serde_json::json!({"name": "Remote Alice"}),
        )])
        .await;
        queue_profile_update(&ledger, None).await;

        coordinator.push_pending(&user()).await.unwrap();
        assert_eq!(
            coordinator.list_conflicts()[0].conflict_type,
            ConflictType::Timestamp
        );
    }

    #[tokio::test]
    async fn test_unmoved_version_counter_classifies_as_timestamp() {
        // The remote counter never advanced past what the action assumed,
        // yet the content diverged; that is not a version conflict.
        let (coordinator, ledger, _) = setup(vec![diverged(
            "r-profile",
            Some(2),
            serde_json::json!({"name": "Remote Alice"}),
        )])
        .await;
        queue_profile_update(&ledger, Some(2)).await;

        coordinator.push_pending(&user()).await.unwrap();
        assert_eq!(
            coordinator.list_conflicts()[0].conflict_type,
            ConflictType::Timestamp
        );
    }

    #[tokio::test]
    async fn test_remote_resolution_rolls_back_the_optimistic_update() {
        let (coordinator, ledger, store, _) = setup_full(vec![diverged(
            "r-profile",
            Some(3),
            serde_json::json!({"name": "Remote Alice"}),
        )])
        .await;
        queue_profile_update(&ledger, Some(2)).await;

        // The UI already shows the speculative profile edit.
        let manager = OptimisticUpdateManager::new(store.clone());
        manager
            .apply(OptimisticUpdateDraft::new(
                EntityType::User,
                EntityId::new("alice".to_string()).unwrap(),
                Some(serde_json::json!({"name": "Old Alice"})),
                serde_json::json!({"name": "Alice"}),
            ))
            .await
            .unwrap();

        coordinator.push_pending(&user()).await.unwrap();
        let conflict_id = coordinator.list_conflicts()[0].conflict_id.clone();
        coordinator
            .resolve_conflict(&conflict_id, ConflictChoice::Remote)
            .await
            .unwrap();

        // Adopting remote truth withdrew the speculative edit with it.
        assert!(store.unconfirmed_updates().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_latched_cycle_reports_failure_to_the_scheduler() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        let ledger: Arc<dyn ActionLedger> = Arc::new(SqliteActionLedger::new(pool.clone()));
        let store: Arc<dyn OfflineStore> = Arc::new(SqliteOfflineStore::new(pool));
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let authority = Arc::new(GatedAuthority {
            started: started.clone(),
            release: release.clone(),
        });
        let coordinator = Arc::new(SyncCoordinator::new(ledger.clone(), store, authority));
        queue_like(&ledger, "post-1").await;

        // A manual cycle takes the latch and parks inside the push.
        let manual = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.push_pending(&user()).await })
        };
        started.notified().await;

        let bus = ChannelBus::new(16);
        let mut rx = bus.subscribe();
        let _listener = coordinator.clone().spawn_listener(bus.clone());
        let job = SyncJob::new(
            JobId::generate(),
            serde_json::to_value(JobPayload {
                user_id: "alice".to_string(),
            })
            .unwrap(),
            RetryPolicy::new(3, 10, 80),
        );
        bus.publish(BusMessage::Process { job: job.clone() });

        // The skipped cycle must not retire the job; the manual cycle may
        // still fail and then nothing would retry.
        let reply = loop {
            match timeout(Duration::from_millis(500), rx.recv())
                .await
                .expect("bus reply")
                .unwrap()
            {
                BusMessage::Complete { job_id, success } => break (job_id, success),
                _ => continue,
            }
        };
        assert_eq!(reply, (job.job_id, false));

        release.notify_one();
        let outcome = manual.await.unwrap().unwrap();
        assert!(outcome.transient_failure);
    }

    #[tokio::test]
    async fn test_identical_content_divergence_is_no_conflict() {
        let (coordinator, ledger, _) = setup(vec![diverged(
            "r-profile",
            Some(3),
            serde_json::json!({"name": "Alice"}),
        )])
        .await;
        let action = queue_profile_update(&ledger, Some(2)).await;

        let outcome = coordinator.push_pending(&user()).await.unwrap();

        assert!(outcome.conflicts.is_empty());
        assert_eq!(outcome.synced, vec![action.local_id.clone()]);
        let settled = ledger.get(&action.local_id).await.unwrap().unwrap();
        assert_eq!(settled.remote_id.unwrap().as_str(), "r-profile");
    }

    #[tokio::test]
    async fn test_resolve_local_forces_the_push() {
        let (coordinator, ledger, authority) = setup(vec![
            diverged("r-profile", Some(3), serde_json::json!({"name": "Remote"})),
            accepted("r-profile", Some(4)),
        ])
        .await;
        let action = queue_profile_update(&ledger, Some(2)).await;

        coordinator.push_pending(&user()).await.unwrap();
        let conflict_id = coordinator.list_conflicts()[0].conflict_id.clone();
        coordinator
            .resolve_conflict(&conflict_id, ConflictChoice::Local)
            .await
            .unwrap();

        assert!(coordinator.list_conflicts().is_empty());
        assert_eq!(authority.pushes()[1], (action.local_id.to_string(), true));
        assert!(ledger
            .get(&action.local_id)
            .await
            .unwrap()
            .unwrap()
            .is_synced);
    }

    #[tokio::test]
    async fn test_resolve_remote_settles_without_delivery() {
        let (coordinator, ledger, authority) = setup(vec![diverged(
            "r-profile",
            Some(3),
            serde_json::json!({"name": "Remote"}),
        )])
        .await;
        let action = queue_profile_update(&ledger, Some(2)).await;

        coordinator.push_pending(&user()).await.unwrap();
        let conflict_id = coordinator.list_conflicts()[0].conflict_id.clone();
        coordinator
            .resolve_conflict(&conflict_id, ConflictChoice::Remote)
            .await
            .unwrap();

        // No second push happened; the remote record's id was adopted.
        assert_eq!(authority.pushes().len(), 1);
        let settled = ledger.get(&action.local_id).await.unwrap().unwrap();
        assert!(settled.is_synced);
        assert_eq!(settled.remote_id.unwrap().as_str(), "r-profile");
    }

    #[tokio::test]
    async fn test_resolve_unknown_conflict_is_not_found() {
        let (coordinator, _, _) = setup(vec![]).await;
        let missing = coordinator
            .resolve_conflict("nope", ConflictChoice::Remote)
            .await;
        assert!(matches!(missing, Err(SyncError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_failed_local_resolution_keeps_conflict_open() {
        let (coordinator, ledger, _) = setup(vec![
            diverged("r-profile", Some(3), serde_json::json!({"name": "Remote"})),
            Err(SyncError::Network("offline".to_string())),
        ])
        .await;
        queue_profile_update(&ledger, Some(2)).await;

        coordinator.push_pending(&user()).await.unwrap();
        let conflict_id = coordinator.list_conflicts()[0].conflict_id.clone();

        let result = coordinator
            .resolve_conflict(&conflict_id, ConflictChoice::Local)
            .await;
        assert!(matches!(result, Err(SyncError::Network(_))));
        assert_eq!(coordinator.list_conflicts().len(), 1);
    }

    #[tokio::test]
    async fn test_synced_actions_do_not_resurface_in_listing() {
        let (coordinator, ledger, _) = setup(vec![accepted("r1", None)]).await;
        let action = queue_like(&ledger, "post-1").await;

        coordinator.push_pending(&user()).await.unwrap();

        let synced = ledger
            .list(ActionFilter {
                user_id: Some(user()),
                is_synced: Some(true),
                limit: None,
            })
            .await
            .unwrap();
        assert_eq!(synced.len(), 1);
        assert_eq!(synced[0].local_id, action.local_id);
    }
}
