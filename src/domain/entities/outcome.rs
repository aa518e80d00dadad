use serde::{Deserialize, Serialize};

use crate::domain::value_objects::LocalActionId;

/// Summary of one push cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub synced: Vec<LocalActionId>,
    pub conflicts: Vec<String>,
    pub failed: Vec<LocalActionId>,
    pub total_processed: usize,
    /// The cycle stopped on a transient failure; the scheduler's retry
    /// policy decides when the remaining actions are attempted again.
    pub transient_failure: bool,
    /// Another cycle for the same user was already running; nothing was
    /// attempted.
    pub skipped: bool,
}

impl SyncOutcome {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        !self.transient_failure
    }
}
