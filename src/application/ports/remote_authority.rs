use async_trait::async_trait;

use crate::domain::entities::{OfflineAction, RemoteRecord};
use crate::domain::value_objects::RemoteId;
use crate::shared::error::Result;

/// Result of delivering one action to the remote authority.
#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    Accepted {
        remote_id: RemoteId,
        /// Version counter of the accepted record, when the authority
        /// exposes one. Feeds cache staleness bookkeeping.
        remote_version: Option<i64>,
    },
    /// The remote state diverged from what the action was based on. Not an
    /// error; the coordinator classifies it into a resolvable conflict.
    Diverged { remote: RemoteRecord },
}

/// The transport seam. The core never cares how an action reaches the
/// remote authority, only that a push reports accept/diverge, or fails
/// with `SyncError::Network` when the attempt should be retried.
#[async_trait]
pub trait RemoteAuthority: Send + Sync {
    /// Deliver one action. `force` skips the divergence check once, used
    /// when a conflict is resolved in favor of local state.
    async fn push(&self, action: &OfflineAction, force: bool) -> Result<PushOutcome>;
}
