use serde::{Deserialize, Serialize};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric). Private chats share the id of their user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// Store-assigned queue id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueueId(pub i64);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

impl From<UserId> for ChatId {
    fn from(u: UserId) -> Self {
        ChatId(u.0)
    }
}

/// What the transport told us about a chat on this event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatInfo {
    pub id: ChatId,
    pub title: Option<String>,
    pub is_private: bool,
}

/// What the transport told us about a user on this event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserInfo {
    pub id: UserId,
    pub first_name: String,
    pub last_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: ChatId,
    pub title: String,
    pub members: Vec<UserId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl User {
    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.trim().is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

impl From<&UserInfo> for User {
    fn from(u: &UserInfo) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMember {
    pub user_id: UserId,
    pub position: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queue {
    pub id: QueueId,
    pub group_id: ChatId,
    pub name: String,
    pub creator_id: UserId,
    pub is_dynamic: bool,
    /// Kept sorted by position.
    pub members: Vec<QueueMember>,
}

impl Queue {
    pub fn position_of(&self, user_id: UserId) -> Option<u32> {
        self.members
            .iter()
            .find(|m| m.user_id == user_id)
            .map(|m| m.position)
    }

    pub fn is_member(&self, user_id: UserId) -> bool {
        self.position_of(user_id).is_some()
    }

    pub fn occupied(&self) -> std::collections::BTreeSet<u32> {
        self.members.iter().map(|m| m.position).collect()
    }
}

/// Input for creating a queue.
#[derive(Clone, Debug)]
pub struct NewQueue {
    pub group_id: ChatId,
    pub name: String,
    pub creator_id: UserId,
}
