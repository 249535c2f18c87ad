use {
    serde::{Deserialize, Serialize},
    threadline_common::{agent_id_for, unique_id},
    threadline_config::ThreadlineConfig,
    threadline_memory::{ChannelType, Connection, MemoryContent, MemoryRecord},
    uuid::Uuid,
};

/// A message as fetched from the platform. Never mutated after fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageNode {
    pub id: String,
    pub text: String,
    pub author_id: String,
    #[serde(default)]
    pub username: Option<String>,
    /// Author display name.
    #[serde(default)]
    pub name: Option<String>,
    pub conversation_id: String,
    /// Id of the message this one replies to.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Unix seconds.
    pub timestamp: i64,
    #[serde(default)]
    pub photos: Vec<String>,
    pub permanent_url: String,
}

/// Media to attach to a post: an `http(s)://` URL or a local file path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub url: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Resolved media bytes, ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaData {
    pub data: Vec<u8>,
    pub media_type: String,
}

/// Generated content to publish.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<MediaAttachment>,
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachments: Vec::new(),
        }
    }
}

/// A chunk the platform accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedPost {
    /// Platform-assigned id.
    pub id: String,
    /// Canonical text as returned by the platform.
    pub text: String,
    pub conversation_id: Option<String>,
    /// Platform id this post replies to.
    pub parent_id: Option<String>,
    /// Unix seconds.
    pub timestamp: i64,
    pub memory_id: Uuid,
}

/// The acting agent plus the platform constants needed to map platform ids
/// onto memory ids, rooms, and entities.
#[derive(Debug, Clone)]
pub struct AgentProfile {
    pub agent_id: Uuid,
    /// Platform user id of the agent's own account.
    pub profile_id: Option<String>,
    /// The agent's own handle, used in links to what it publishes.
    pub username: Option<String>,
    pub source: String,
    pub permalink_base: String,
}

impl AgentProfile {
    pub fn from_config(config: &ThreadlineConfig) -> Self {
        Self {
            agent_id: agent_id_for(&config.agent.name),
            profile_id: config.agent.profile_id.clone(),
            username: config.agent.username.clone(),
            source: config.platform.source.clone(),
            permalink_base: config.platform.permalink_base.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn memory_id(&self, message_id: &str) -> Uuid {
        unique_id(self.agent_id, message_id)
    }

    #[must_use]
    pub fn room_id(&self, conversation_id: &str) -> Uuid {
        unique_id(self.agent_id, conversation_id)
    }

    /// Entity for an author; the agent itself when it wrote the message.
    #[must_use]
    pub fn entity_id(&self, author_id: &str) -> Uuid {
        if self.profile_id.as_deref() == Some(author_id) {
            self.agent_id
        } else {
            unique_id(self.agent_id, author_id)
        }
    }

    #[must_use]
    pub fn permalink(&self, username: &str, post_id: &str) -> String {
        format!("{}/{username}/status/{post_id}", self.permalink_base)
    }

    pub fn connection_for(&self, node: &MessageNode) -> Connection {
        Connection {
            entity_id: unique_id(self.agent_id, &node.author_id),
            room_id: self.room_id(&node.conversation_id),
            username: node.username.clone(),
            name: node.name.clone(),
            source: self.source.clone(),
            channel_type: ChannelType::Group,
        }
    }

    pub fn message_record(&self, node: &MessageNode) -> MemoryRecord {
        MemoryRecord {
            id: self.memory_id(&node.id),
            agent_id: self.agent_id,
            entity_id: self.entity_id(&node.author_id),
            room_id: self.room_id(&node.conversation_id),
            content: MemoryContent {
                text: node.text.clone(),
                source: self.source.clone(),
                url: Some(node.permanent_url.clone()),
                image_urls: node.photos.clone(),
                in_reply_to: node.parent_id.as_deref().map(|p| self.memory_id(p)),
                post_id: Some(node.id.clone()),
            },
            created_at: node.timestamp.saturating_mul(1000),
        }
    }

    pub fn published_record(
        &self,
        post: &PublishedPost,
        room_id: Uuid,
        author_name: &str,
    ) -> MemoryRecord {
        MemoryRecord {
            id: post.memory_id,
            agent_id: self.agent_id,
            entity_id: self.agent_id,
            room_id,
            content: MemoryContent {
                text: post.text.clone(),
                source: self.source.clone(),
                url: Some(self.permalink(author_name, &post.id)),
                image_urls: Vec::new(),
                in_reply_to: post.parent_id.as_deref().map(|p| self.memory_id(p)),
                post_id: Some(post.id.clone()),
            },
            created_at: post.timestamp.saturating_mul(1000),
        }
    }
}
