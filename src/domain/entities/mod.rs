pub mod cache_metadata;
pub mod conflict;
pub mod offline_action;
pub mod optimistic_update;
pub mod outcome;
pub mod sync_job;

pub use cache_metadata::{CacheEntry, CacheStatus, CacheTypeStatus};
pub use conflict::{ConflictChoice, ConflictType, RemoteRecord, SyncConflict};
pub use offline_action::{EntityContext, NewOfflineAction, OfflineAction};
pub use optimistic_update::{OptimisticUpdate, OptimisticUpdateDraft};
pub use outcome::SyncOutcome;
pub use sync_job::{RetryPolicy, SyncJob};
