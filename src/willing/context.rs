use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::PersonRef;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub group_id: String,
    #[serde(default)]
    pub group_name: Option<String>,
}

/// A conversation: a group chat, or a private chat with `user`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatStream {
    pub stream_id: String,
    pub user: PersonRef,
    #[serde(default)]
    pub group: Option<GroupInfo>,
}

impl ChatStream {
    pub fn display_name(&self) -> &str {
        self.group
            .as_ref()
            .and_then(|g| g.group_name.as_deref())
            .unwrap_or("私聊")
    }
}

/// An incoming message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message_id: String,
    pub time: DateTime<Utc>,
    pub processed_plain_text: String,
    #[serde(default)]
    pub is_emoji: bool,
}

impl ChatMessage {
    pub fn new(message_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            time: Utc::now(),
            processed_plain_text: text.into(),
            is_emoji: false,
        }
    }
}

/// Scoring context for one in-flight message
#[derive(Debug, Clone)]
pub struct WillingInfo {
    pub message: ChatMessage,
    pub chat: ChatStream,
    pub chat_id: String,
    pub person_id: String,
    pub is_mentioned: bool,
    pub interested_rate: f64,
    pub is_emoji: bool,
    pub group_info: Option<GroupInfo>,
}

impl WillingInfo {
    pub fn new(
        message: ChatMessage,
        chat: ChatStream,
        person_id: String,
        is_mentioned: bool,
        interested_rate: f64,
    ) -> Self {
        Self {
            chat_id: chat.stream_id.clone(),
            is_emoji: message.is_emoji,
            group_info: chat.group.clone(),
            message,
            chat,
            person_id,
            is_mentioned,
            interested_rate,
        }
    }

    pub fn is_same_speaker(&self, chat_id: &str, person_id: &str) -> bool {
        self.chat_id == chat_id && self.person_id == person_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let user = PersonRef::new("qq", "1", "alice");
        let private = ChatStream {
            stream_id: "s1".to_string(),
            user: user.clone(),
            group: None,
        };
        assert_eq!(private.display_name(), "私聊");

        let group = ChatStream {
            stream_id: "s2".to_string(),
            user,
            group: Some(GroupInfo {
                group_id: "g1".to_string(),
                group_name: Some("rust-cn".to_string()),
            }),
        };
        assert_eq!(group.display_name(), "rust-cn");
    }
}
