use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::domain::entities::{RetryPolicy, SyncJob};
use crate::domain::value_objects::JobId;

/// Message set exchanged over the channel bus. Tagged variants, one
/// message kind per variant; both contexts must tolerate duplicate and
/// late deliveries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMessage {
    /// Create and schedule a job. `job_id` may be provided to make the
    /// enqueue idempotent across restarts.
    Enqueue {
        job_id: Option<JobId>,
        payload: Value,
        policy: RetryPolicy,
        delay_ms: Option<u64>,
    },
    /// Scheduler -> coordinator: do the work now. Carries the full job
    /// record so the consumer needs no scheduler state.
    Process { job: SyncJob },
    /// Coordinator -> scheduler: outcome of the last attempt.
    Complete { job_id: JobId, success: bool },
    /// Scheduler -> any listener. Observability only.
    Scheduled {
        job_id: JobId,
        retry_count: u32,
        next_run_at: DateTime<Utc>,
    },
    /// Clear any pending timer and drop the job.
    Cancel { job_id: JobId },
}

/// Named many-to-many asynchronous bus connecting the foreground
/// coordinator and the background scheduler. Every subscriber receives
/// every message independently, in publish order per sender; nothing is
/// delivered across a process restart.
#[derive(Debug, Clone)]
pub struct ChannelBus {
    sender: broadcast::Sender<BusMessage>,
}

impl ChannelBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. A bus with no subscribers
    /// drops the message, which matches the no-delivery-guarantee model.
    pub fn publish(&self, message: BusMessage) {
        if let Err(err) = self.sender.send(message) {
            tracing::debug!(
                target: "sync::bus",
                "message dropped, no subscribers: {:?}",
                err.0
            );
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.sender.subscribe()
    }
}

impl Default for ChannelBus {
    fn default() -> Self {
        Self::new(crate::shared::config::SyncConfig::default().bus.capacity)
    }
}
