pub mod action_id;
pub mod action_type;
pub mod cache_key;
pub mod cache_type;
pub mod entity_id;
pub mod entity_type;
pub mod job_id;
pub mod payload;
pub mod remote_id;
pub mod update_id;
pub mod user_id;

pub use action_id::LocalActionId;
pub use action_type::ActionType;
pub use cache_key::CacheKey;
pub use cache_type::CacheType;
pub use entity_id::EntityId;
pub use entity_type::EntityType;
pub use job_id::JobId;
pub use payload::ActionPayload;
pub use remote_id::RemoteId;
pub use update_id::UpdateId;
pub use user_id::UserId;
