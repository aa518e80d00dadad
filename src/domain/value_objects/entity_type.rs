use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of entity an action mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Post,
    User,
    Topic,
    TopicMembership,
    DirectMessage,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Post => "post",
            EntityType::User => "user",
            EntityType::Topic => "topic",
            EntityType::TopicMembership => "topic_membership",
            EntityType::DirectMessage => "direct_message",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
