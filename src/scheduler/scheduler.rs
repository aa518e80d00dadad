use chrono::Utc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::bus::{BusMessage, ChannelBus};
use super::job_store::JobStore;
use crate::domain::entities::{RetryPolicy, SyncJob};
use crate::domain::value_objects::JobId;
use serde_json::Value;

/// Background job scheduler. Runs in its own task with no access to the
/// ledger, the network, or any foreground state; it only measures time and
/// exchanges messages over the bus.
///
/// Per-job state machine: enqueued -> scheduled(delay) -> dispatched ->
/// retired, or rescheduled with `min(base * 2^retry_count, max)` backoff
/// until `max_retries` failures, after which the job is abandoned.
pub struct JobScheduler {
    bus: ChannelBus,
    store: JobStore,
}

impl JobScheduler {
    /// Spawn the scheduler event loop. The task ends when every other bus
    /// handle has been dropped, aborting all pending timers.
    pub fn spawn(bus: ChannelBus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            let mut scheduler = JobScheduler {
                bus,
                store: JobStore::new(),
            };
            loop {
                match rx.recv().await {
                    Ok(message) => scheduler.handle(message),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            target: "sync::scheduler",
                            skipped,
                            "scheduler lagged behind the bus; duplicate-safe handlers recover"
                        );
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            scheduler.store.abort_all();
            tracing::debug!(target: "sync::scheduler", "scheduler stopped");
        })
    }

    fn handle(&mut self, message: BusMessage) {
        match message {
            BusMessage::Enqueue {
                job_id,
                payload,
                policy,
                delay_ms,
            } => self.on_enqueue(job_id, payload, policy, delay_ms),
            BusMessage::Complete { job_id, success } => self.on_complete(&job_id, success),
            BusMessage::Cancel { job_id } => self.on_cancel(&job_id),
            // Our own timer output; the handle is done, just forget it.
            BusMessage::Process { job } => self.store.clear_fired_timer(&job.job_id),
            BusMessage::Scheduled { .. } => {}
        }
    }

    fn on_enqueue(
        &mut self,
        job_id: Option<JobId>,
        payload: Value,
        policy: RetryPolicy,
        delay_ms: Option<u64>,
    ) {
        let job_id = job_id.unwrap_or_else(JobId::generate);

        // A duplicate enqueue reschedules the tracked job instead of
        // creating a second copy.
        let job = match self.store.get(&job_id) {
            Some(existing) => existing.clone(),
            None => SyncJob::new(job_id, payload, policy),
        };

        let delay = Duration::from_millis(delay_ms.unwrap_or(0));
        self.schedule(job, delay);
    }

    fn on_complete(&mut self, job_id: &JobId, success: bool) {
        let Some(job) = self.store.get(job_id).cloned() else {
            // Cancelled or already retired; late completions are ignored
            // so cancelled jobs cannot resurrect.
            tracing::debug!(
                target: "sync::scheduler",
                job_id = %job_id,
                "completion for untracked job ignored"
            );
            return;
        };

        if success {
            self.store.remove(job_id);
            tracing::debug!(target: "sync::scheduler", job_id = %job_id, "job retired");
            return;
        }

        if job.exhausted_after_failure() {
            self.store.remove(job_id);
            tracing::warn!(
                target: "sync::scheduler",
                job_id = %job_id,
                retries = job.retry_count + 1,
                "job abandoned after exhausting retries"
            );
            return;
        }

        let delay = job.next_delay();
        let mut job = job;
        job.retry_count += 1;
        self.schedule(job, delay);
    }

    fn on_cancel(&mut self, job_id: &JobId) {
        // Safe on unknown or already-retired jobs.
        if self.store.remove(job_id).is_some() {
            tracing::debug!(target: "sync::scheduler", job_id = %job_id, "job cancelled");
        }
    }

    /// Arm a timer for the job. The timer is an independent task so a slow
    /// `process` consumer can never delay other timers; cancelling the job
    /// aborts the handle.
    fn schedule(&mut self, job: SyncJob, delay: Duration) {
        let job_id = job.job_id.clone();
        let retry_count = job.retry_count;
        let next_run_at = Utc::now()
            + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());

        let bus = self.bus.clone();
        let dispatched = job.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            bus.publish(BusMessage::Process { job: dispatched });
        });
        self.store.track(job, timer);

        self.bus.publish(BusMessage::Scheduled {
            job_id: job_id.clone(),
            retry_count,
            next_run_at,
        });
        tracing::debug!(
            target: "sync::scheduler",
            job_id = %job_id,
            retry_count,
            delay_ms = delay.as_millis() as u64,
            "job scheduled"
        );
    }
}
