//! Message model representing one unit of conversation content

use super::{Attachment, ConversationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a message, globally unique across providers
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A single message within a conversation
///
/// Once stored, a message is never rewritten: later syncs that return the
/// same id are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// Counterpart identity used for cross-conversation contact queries
    pub contact_uid: String,
    /// Wall-clock time, second resolution once stored
    pub timestamp: DateTime<Utc>,
    pub sender_uid: String,
    pub sender_name: String,
    pub conversation_uid: ConversationId,
    pub chat_title: String,
    #[serde(rename = "content")]
    pub text: String,
    pub platform: String,
    /// Message ID in the provider's own format
    pub platform_id: String,
    /// True if the local account authored the message
    pub is_sent: bool,
    pub attachments: Vec<Attachment>,
    /// Provider-opaque tiebreak for same-timestamp ordering
    pub sort_key: String,
}

impl Message {
    /// Create a new message builder
    pub fn builder(id: impl Into<MessageId>, conversation_uid: impl Into<ConversationId>) -> MessageBuilder {
        MessageBuilder::new(id.into(), conversation_uid.into())
    }
}

/// Builder for creating Message instances
pub struct MessageBuilder {
    id: MessageId,
    conversation_uid: ConversationId,
    contact_uid: String,
    timestamp: Option<DateTime<Utc>>,
    sender_uid: String,
    sender_name: String,
    chat_title: String,
    text: String,
    platform: String,
    platform_id: Option<String>,
    is_sent: bool,
    attachments: Vec<Attachment>,
    sort_key: String,
}

impl MessageBuilder {
    fn new(id: MessageId, conversation_uid: ConversationId) -> Self {
        Self {
            id,
            conversation_uid,
            contact_uid: String::new(),
            timestamp: None,
            sender_uid: String::new(),
            sender_name: String::new(),
            chat_title: String::new(),
            text: String::new(),
            platform: String::new(),
            platform_id: None,
            is_sent: false,
            attachments: Vec::new(),
            sort_key: String::new(),
        }
    }

    pub fn contact(mut self, contact_uid: impl Into<String>) -> Self {
        self.contact_uid = contact_uid.into();
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn sender(mut self, uid: impl Into<String>, name: impl Into<String>) -> Self {
        self.sender_uid = uid.into();
        self.sender_name = name.into();
        self
    }

    pub fn chat_title(mut self, chat_title: impl Into<String>) -> Self {
        self.chat_title = chat_title.into();
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn platform_id(mut self, platform_id: impl Into<String>) -> Self {
        self.platform_id = Some(platform_id.into());
        self
    }

    pub fn sent(mut self, is_sent: bool) -> Self {
        self.is_sent = is_sent;
        self
    }

    pub fn attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.sort_key = sort_key.into();
        self
    }

    /// Build the message; `platform_id` defaults to the message id and
    /// `timestamp` to now
    pub fn build(self) -> Message {
        let platform_id = self
            .platform_id
            .unwrap_or_else(|| self.id.as_str().to_string());
        Message {
            id: self.id,
            contact_uid: self.contact_uid,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            sender_uid: self.sender_uid,
            sender_name: self.sender_name,
            conversation_uid: self.conversation_uid,
            chat_title: self.chat_title,
            text: self.text,
            platform: self.platform,
            platform_id,
            is_sent: self.is_sent,
            attachments: self.attachments,
            sort_key: self.sort_key,
        }
    }
}
