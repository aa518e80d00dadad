use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::EntityType;

/// Closed enumeration of user actions that can be queued offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    CreatePost,
    Like,
    Boost,
    Bookmark,
    Unbookmark,
    Follow,
    Unfollow,
    TopicJoin,
    TopicLeave,
    TopicCreate,
    TopicUpdate,
    TopicDelete,
    ProfileUpdate,
    SendDirectMessage,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CreatePost => "create_post",
            ActionType::Like => "like",
            ActionType::Boost => "boost",
            ActionType::Bookmark => "bookmark",
            ActionType::Unbookmark => "unbookmark",
            ActionType::Follow => "follow",
            ActionType::Unfollow => "unfollow",
            ActionType::TopicJoin => "topic_join",
            ActionType::TopicLeave => "topic_leave",
            ActionType::TopicCreate => "topic_create",
            ActionType::TopicUpdate => "topic_update",
            ActionType::TopicDelete => "topic_delete",
            ActionType::ProfileUpdate => "profile_update",
            ActionType::SendDirectMessage => "send_direct_message",
        }
    }

    /// Kind of entity this action mutates, used for optimistic-update and
    /// cache bookkeeping.
    pub fn entity_type(&self) -> EntityType {
        match self {
            ActionType::CreatePost
            | ActionType::Like
            | ActionType::Boost
            | ActionType::Bookmark
            | ActionType::Unbookmark => EntityType::Post,
            ActionType::Follow | ActionType::Unfollow | ActionType::ProfileUpdate => {
                EntityType::User
            }
            ActionType::TopicJoin | ActionType::TopicLeave => EntityType::TopicMembership,
            ActionType::TopicCreate | ActionType::TopicUpdate | ActionType::TopicDelete => {
                EntityType::Topic
            }
            ActionType::SendDirectMessage => EntityType::DirectMessage,
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "create_post" => Ok(ActionType::CreatePost),
            "like" => Ok(ActionType::Like),
            "boost" => Ok(ActionType::Boost),
            "bookmark" => Ok(ActionType::Bookmark),
            "unbookmark" => Ok(ActionType::Unbookmark),
            "follow" => Ok(ActionType::Follow),
            "unfollow" => Ok(ActionType::Unfollow),
            "topic_join" => Ok(ActionType::TopicJoin),
            "topic_leave" => Ok(ActionType::TopicLeave),
            "topic_create" => Ok(ActionType::TopicCreate),
            "topic_update" => Ok(ActionType::TopicUpdate),
            "topic_delete" => Ok(ActionType::TopicDelete),
            "profile_update" => Ok(ActionType::ProfileUpdate),
            "send_direct_message" => Ok(ActionType::SendDirectMessage),
            other => Err(format!("Unknown action type: {other}")),
        }
    }
}
