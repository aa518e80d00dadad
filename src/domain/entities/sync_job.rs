use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::domain::value_objects::JobId;
use crate::shared::config::RetryConfig;

/// Retry policy fixed at job creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
            max_delay_ms,
        }
    }

    /// Delay before the attempt following `retry_count` failures:
    /// `min(base * 2^retry_count, max)`.
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        let factor = 1u64.checked_shl(retry_count).unwrap_or(u64::MAX);
        let delay = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(delay)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from(&crate::shared::config::SyncConfig::default().retry)
    }
}

/// The unit of retryable work owned by the background scheduler. The
/// payload is opaque to the scheduler; it only measures time and counts
/// attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncJob {
    pub job_id: JobId,
    pub payload: Value,
    pub retry_count: u32,
    pub policy: RetryPolicy,
    pub requested_at: DateTime<Utc>,
}

impl SyncJob {
    pub fn new(job_id: JobId, payload: Value, policy: RetryPolicy) -> Self {
        Self {
            job_id,
            payload,
            retry_count: 0,
            policy,
            requested_at: Utc::now(),
        }
    }

    /// Whether the failure just reported was the job's last allowed attempt.
    pub fn exhausted_after_failure(&self) -> bool {
        self.retry_count + 1 >= self.policy.max_retries
    }

    /// Delay before the next attempt after recording one more failure.
    pub fn next_delay(&self) -> Duration {
        self.policy.delay_for(self.retry_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(10, 15_000, 300_000);
        let delays: Vec<u64> = (0..7)
            .map(|n| policy.delay_for(n).as_millis() as u64)
            .collect();
        assert_eq!(
            delays,
            vec![15_000, 30_000, 60_000, 120_000, 240_000, 300_000, 300_000]
        );
    }

    #[test]
    fn test_backoff_never_decreases() {
        let policy = RetryPolicy::new(10, 5_000, 300_000);
        let mut previous = Duration::ZERO;
        for n in 0..64 {
            let delay = policy.delay_for(n);
            assert!(delay >= previous);
            assert!(delay.as_millis() as u64 <= 300_000);
            previous = delay;
        }
    }

    #[test]
    fn test_exhaustion_counts_the_final_attempt() {
        let mut job = SyncJob::new(
            JobId::generate(),
            serde_json::json!({}),
            RetryPolicy::new(3, 10, 100),
        );
        assert!(!job.exhausted_after_failure()); // 1st failure -> retry
        job.retry_count = 1;
        assert!(!job.exhausted_after_failure()); // 2nd failure -> retry
        job.retry_count = 2;
        assert!(job.exhausted_after_failure()); // 3rd failure -> abandoned
    }
}
