pub mod optimistic;
pub mod staleness;
pub mod sync_coordinator;
pub mod sync_service;

pub use optimistic::OptimisticUpdateManager;
pub use staleness::CacheStalenessTracker;
pub use sync_coordinator::{JobPayload, SyncCoordinator};
pub use sync_service::OfflineSyncService;
