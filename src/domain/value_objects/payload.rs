use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ActionType, EntityId, UserId};

/// Per-action payload. Stored opaquely as a JSON blob in the ledger; the
/// serde tag keeps it a closed union over the action types at the boundary
/// where it is consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionPayload {
    CreatePost {
        content: String,
        topic_id: Option<String>,
        reply_to: Option<String>,
    },
    Like {
        post_id: String,
    },
    Boost {
        post_id: String,
    },
    Bookmark {
        post_id: String,
    },
    Unbookmark {
        post_id: String,
    },
    Follow {
        user_id: String,
    },
    Unfollow {
        user_id: String,
    },
    TopicJoin {
        topic_id: String,
    },
    TopicLeave {
        topic_id: String,
    },
    TopicCreate {
        topic_id: String,
        name: String,
    },
    TopicUpdate {
        topic_id: String,
        fields: Value,
        base_version: Option<i64>,
    },
    TopicDelete {
        topic_id: String,
    },
    ProfileUpdate {
        fields: Value,
        base_version: Option<i64>,
    },
    SendDirectMessage {
        recipient: String,
        body: String,
    },
}

impl ActionPayload {
    pub fn action_type(&self) -> ActionType {
        match self {
            ActionPayload::CreatePost { .. } => ActionType::CreatePost,
            ActionPayload::Like { .. } => ActionType::Like,
            ActionPayload::Boost { .. } => ActionType::Boost,
            ActionPayload::Bookmark { .. } => ActionType::Bookmark,
            ActionPayload::Unbookmark { .. } => ActionType::Unbookmark,
            ActionPayload::Follow { .. } => ActionType::Follow,
            ActionPayload::Unfollow { .. } => ActionType::Unfollow,
            ActionPayload::TopicJoin { .. } => ActionType::TopicJoin,
            ActionPayload::TopicLeave { .. } => ActionType::TopicLeave,
            ActionPayload::TopicCreate { .. } => ActionType::TopicCreate,
            ActionPayload::TopicUpdate { .. } => ActionType::TopicUpdate,
            ActionPayload::TopicDelete { .. } => ActionType::TopicDelete,
            ActionPayload::ProfileUpdate { .. } => ActionType::ProfileUpdate,
            ActionPayload::SendDirectMessage { .. } => ActionType::SendDirectMessage,
        }
    }

    /// Version of the remote record this mutation was based on, where the
    /// payload carries one. Drives version-conflict classification.
    pub fn base_version(&self) -> Option<i64> {
        match self {
            ActionPayload::TopicUpdate { base_version, .. }
            | ActionPayload::ProfileUpdate { base_version, .. } => *base_version,
            _ => None,
        }
    }

    /// Id of the entity this payload mutates, where the payload itself
    /// names one. Falls back to the action's `target_id` or owning user at
    /// the call site.
    pub fn entity_id(&self, user_id: &UserId) -> Option<EntityId> {
        let raw = match self {
            ActionPayload::CreatePost { topic_id, .. } => topic_id.clone()?,
            ActionPayload::Like { post_id }
            | ActionPayload::Boost { post_id }
            | ActionPayload::Bookmark { post_id }
            | ActionPayload::Unbookmark { post_id } => post_id.clone(),
            ActionPayload::Follow { user_id } | ActionPayload::Unfollow { user_id } => {
                user_id.clone()
            }
            ActionPayload::TopicJoin { topic_id }
            | ActionPayload::TopicLeave { topic_id }
            | ActionPayload::TopicCreate { topic_id, .. }
            | ActionPayload::TopicUpdate { topic_id, .. }
            | ActionPayload::TopicDelete { topic_id } => topic_id.clone(),
            ActionPayload::ProfileUpdate { .. } => user_id.to_string(),
            ActionPayload::SendDirectMessage { recipient, .. } => recipient.clone(),
        };
        EntityId::new(raw).ok()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_round_trips_with_tag() {
        let payload = ActionPayload::CreatePost {
            content: "hello".to_string(),
            topic_id: Some("topic1".to_string()),
            reply_to: None,
        };

        let json = payload.to_json().unwrap();
        assert!(json.contains(r#""type":"create_post""#));
        assert_eq!(ActionPayload::from_json(&json).unwrap(), payload);
    }

    #[test]
    fn test_base_version_only_on_versioned_payloads() {
        let profile = ActionPayload::ProfileUpdate {
            fields: serde_json::json!({"avatar": "a.png"}),
            base_version: Some(3),
        };
        assert_eq!(profile.base_version(), Some(3));

        let like = ActionPayload::Like {
            post_id: "p1".to_string(),
        };
        assert_eq!(like.base_version(), None);
    }

    #[test]
    fn test_profile_update_targets_owning_user() {
        let user = UserId::new("npub1abc".to_string()).unwrap();
        let payload = ActionPayload::ProfileUpdate {
            fields: serde_json::json!({}),
            base_version: None,
        };
        assert_eq!(
            payload.entity_id(&user).unwrap().as_str(),
            "npub1abc"
        );
    }
}
