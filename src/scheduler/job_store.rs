use std::collections::HashMap;
use tokio::task::JoinHandle;

use crate::domain::entities::SyncJob;
use crate::domain::value_objects::JobId;

/// Job and timer state owned by the scheduler task. Constructed with the
/// scheduler and torn down with it; never reachable from any other
/// execution context.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: HashMap<JobId, SyncJob>,
    timers: HashMap<JobId, JoinHandle<()>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, job_id: &JobId) -> Option<&SyncJob> {
        self.jobs.get(job_id)
    }

    pub fn contains(&self, job_id: &JobId) -> bool {
        self.jobs.contains_key(job_id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Track a job together with its pending timer, aborting any timer
    /// already registered under the same id.
    pub fn track(&mut self, job: SyncJob, timer: JoinHandle<()>) {
        let job_id = job.job_id.clone();
        if let Some(previous) = self.timers.insert(job_id.clone(), timer) {
            previous.abort();
        }
        self.jobs.insert(job_id, job);
    }

    /// Forget a timer that has already fired, without aborting it.
    pub fn clear_fired_timer(&mut self, job_id: &JobId) {
        self.timers.remove(job_id);
    }

    /// Drop all state for a job, aborting its pending timer if any.
    pub fn remove(&mut self, job_id: &JobId) -> Option<SyncJob> {
        if let Some(timer) = self.timers.remove(job_id) {
            timer.abort();
        }
        self.jobs.remove(job_id)
    }

    pub fn abort_all(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
        self.jobs.clear();
    }
}

impl Drop for JobStore {
    fn drop(&mut self) {
        self.abort_all();
    }
}
