use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::application::ports::{
    ActionFilter, ActionLedger, JobRecordStatus, OfflineStore, RemoteAuthority,
};
use crate::application::services::optimistic::OptimisticUpdateManager;
use crate::application::services::sync_coordinator::{JobPayload, SyncCoordinator};
use crate::domain::entities::{
    CacheStatus, ConflictChoice, NewOfflineAction, OfflineAction, OptimisticUpdateDraft,
    RetryPolicy, SyncConflict, SyncJob, SyncOutcome,
};
use crate::domain::value_objects::{JobId, LocalActionId, UserId};
use crate::scheduler::{BusMessage, ChannelBus, JobScheduler};
use crate::shared::config::SyncConfig;
use crate::shared::error::{Result, SyncError};

/// Facade over the offline core: queue an action, let the scheduler drive
/// delivery, surface conflicts and cache health.
pub struct OfflineSyncService {
    config: SyncConfig,
    ledger: Arc<dyn ActionLedger>,
    store: Arc<dyn OfflineStore>,
    coordinator: Arc<SyncCoordinator>,
    optimistic: OptimisticUpdateManager,
    bus: ChannelBus,
}

impl OfflineSyncService {
    pub fn new(
        config: SyncConfig,
        ledger: Arc<dyn ActionLedger>,
        store: Arc<dyn OfflineStore>,
        authority: Arc<dyn RemoteAuthority>,
    ) -> Self {
        let bus = ChannelBus::new(config.bus.capacity);
        let coordinator = Arc::new(SyncCoordinator::new(
            ledger.clone(),
            store.clone(),
            authority,
        ));
        Self {
            config,
            ledger,
            optimistic: OptimisticUpdateManager::new(store.clone()),
            store,
            coordinator,
            bus,
        }
    }

    /// Spawn the background scheduler and the coordinator's bus listener.
    /// Both tasks run until every bus handle is dropped.
    pub fn start(&self) -> (JoinHandle<()>, JoinHandle<()>) {
        let scheduler = JobScheduler::spawn(self.bus.clone());
        let listener = self.coordinator.clone().spawn_listener(self.bus.clone());
        (scheduler, listener)
    }

    /// Record an action in the ledger and hand a sync job to the
    /// scheduler. When the caller supplies an optimistic draft, the
    /// speculative entity state is recorded in the same breath, to be
    /// confirmed or rolled back once the push settles. The job record is
    /// persisted before the bus message so a crash between the two steps
    /// leaves a recoverable trace.
    pub async fn enqueue_offline_action(
        &self,
        draft: NewOfflineAction,
        optimistic: Option<OptimisticUpdateDraft>,
    ) -> Result<LocalActionId> {
        let saved = self.ledger.save(draft).await?;
        if let Some(update) = optimistic {
            self.optimistic.apply(update).await?;
        }

        let payload = serde_json::to_value(JobPayload {
            user_id: saved.user_id.to_string(),
        })?;
        let policy = RetryPolicy::from(&self.config.retry);
        let job = SyncJob::new(JobId::generate(), payload, policy);
        self.store.record_job(&job).await?;

        self.bus.publish(BusMessage::Enqueue {
            job_id: Some(job.job_id.clone()),
            payload: job.payload,
            policy,
            delay_ms: None,
        });
        tracing::debug!(
            target: "sync::service",
            local_id = %saved.local_id,
            job_id = %job.job_id,
            "offline action queued"
        );
        Ok(saved.local_id)
    }

    /// Run a push cycle now, without going through the scheduler.
    pub async fn trigger_sync(&self, user_id: &UserId) -> Result<SyncOutcome> {
        self.coordinator.push_pending(user_id).await
    }

    pub async fn pending_actions(&self, user_id: &UserId) -> Result<Vec<OfflineAction>> {
        self.ledger.pending_in_creation_order(user_id).await
    }

    pub async fn actions(&self, filter: ActionFilter) -> Result<Vec<OfflineAction>> {
        self.ledger.list(filter).await
    }

    /// Drop a pending action without ever delivering it, withdrawing any
    /// optimistic update that still shadows its entity. `NotFound` on an
    /// unknown id; already-synced actions cannot be abandoned this way.
    pub async fn abandon_action(&self, local_id: &LocalActionId) -> Result<()> {
        let action = self
            .ledger
            .get(local_id)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("offline action {local_id}")))?;
        if action.is_synced {
            return Err(SyncError::Validation(format!(
                "offline action {local_id} is already synced"
            )));
        }

        if let Some(context) = action.entity_context() {
            self.optimistic
                .rollback_for_entity(context.entity_type, &context.entity_id)
                .await?;
        }
        self.ledger.remove(local_id).await?;
        tracing::info!(target: "sync::service", local_id = %local_id, "offline action abandoned");
        Ok(())
    }

    pub fn list_conflicts(&self) -> Vec<SyncConflict> {
        self.coordinator.list_conflicts()
    }

    pub async fn resolve_conflict(&self, conflict_id: &str, choice: ConflictChoice) -> Result<()> {
        self.coordinator.resolve_conflict(conflict_id, choice).await
    }

    pub async fn cache_status(&self) -> Result<CacheStatus> {
        self.store.cache_status().await
    }

    pub async fn cleanup_cache(&self) -> Result<u64> {
        self.store.cleanup_expired().await
    }

    /// Re-enqueue job records that never settled, typically after a
    /// restart. Returns how many jobs were handed back to the scheduler.
    pub async fn recover_pending_jobs(&self) -> Result<usize> {
        let pending = self.store.pending_job_records().await?;
        let recovered = pending.len();
        for job in pending {
            self.bus.publish(BusMessage::Enqueue {
                job_id: Some(job.job_id),
                payload: job.payload,
                policy: job.policy,
                delay_ms: None,
            });
        }
        if recovered > 0 {
            tracing::info!(target: "sync::service", recovered, "pending sync jobs re-enqueued");
        }
        Ok(recovered)
    }

    /// Withdraw a job from the scheduler and settle its record.
    pub async fn cancel_job(&self, job_id: &JobId) -> Result<()> {
        self.store
            .settle_job(job_id, JobRecordStatus::Cancelled, None)
            .await?;
        self.bus.publish(BusMessage::Cancel {
            job_id: job_id.clone(),
        });
        Ok(())
    }

    pub fn bus(&self) -> &ChannelBus {
        &self.bus
    }
}
