pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod scheduler;
pub mod shared;

pub use application::ports::{
    ActionFilter, ActionLedger, JobRecordStatus, OfflineStore, PushOutcome, RemoteAuthority,
};
pub use application::services::{
    CacheStalenessTracker, JobPayload, OfflineSyncService, OptimisticUpdateManager,
    SyncCoordinator,
};
pub use domain::entities::{
    CacheEntry, CacheStatus, ConflictChoice, ConflictType, NewOfflineAction, OfflineAction,
    OptimisticUpdateDraft, RemoteRecord, RetryPolicy, SyncConflict, SyncJob, SyncOutcome,
};
pub use scheduler::{BusMessage, ChannelBus, JobScheduler};
pub use shared::{Result, SyncConfig, SyncError};

/// Install the global tracing subscriber. Call once at startup; embedders
/// that already manage a subscriber can skip this.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offline_sync_core=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
