use {
    serde::{Deserialize, Serialize},
    uuid::Uuid,
};

/// A persisted message, either observed while walking a thread or produced
/// by publishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Deterministic id derived from the platform message id.
    pub id: Uuid,
    pub agent_id: Uuid,
    /// Author. The agent's own id for messages it authored.
    pub entity_id: Uuid,
    /// Conversation the message belongs to.
    pub room_id: Uuid,
    pub content: MemoryContent,
    /// Unix milliseconds.
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryContent {
    pub text: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
    /// Memory id of the message this one replies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<Uuid>,
    /// Platform id, set on records created by publishing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    #[default]
    Group,
    Direct,
}

impl ChannelType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Direct => "direct",
        }
    }
}

/// Link between an author and a conversation room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub entity_id: Uuid,
    pub room_id: Uuid,
    pub username: Option<String>,
    pub name: Option<String>,
    pub source: String,
    pub channel_type: ChannelType,
}
