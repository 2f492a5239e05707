//! Conversation model representing one chat, room or thread

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a conversation (provider-scoped chat ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ConversationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Whether a conversation is a 1:1 chat or a group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationType {
    #[default]
    Single,
    Group,
}

impl ConversationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationType::Single => "single",
            ConversationType::Group => "group",
        }
    }

    /// Parse the stored text form; `None` for anything unrecognized
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "single" => Some(ConversationType::Single),
            "group" => Some(ConversationType::Group),
            _ => None,
        }
    }
}

/// A conversation as last reported by its provider
///
/// `participant_count` is carried as reported and is not checked against
/// `participant_uids`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub account_id: String,
    /// Provider or network name (e.g. "whatsapp", "matrix")
    pub platform: String,
    pub title: String,
    #[serde(rename = "type")]
    pub conversation_type: ConversationType,
    pub participant_uids: Vec<String>,
    pub participant_count: u32,
    pub unread_count: u32,
    pub last_activity: DateTime<Utc>,
    pub is_archived: bool,
    pub is_muted: bool,
    pub is_pinned: bool,
}

impl Conversation {
    /// Create a single-type conversation with empty membership and state
    pub fn new(
        id: impl Into<ConversationId>,
        account_id: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            account_id: account_id.into(),
            platform: platform.into(),
            title: String::new(),
            conversation_type: ConversationType::Single,
            participant_uids: Vec::new(),
            participant_count: 0,
            unread_count: 0,
            last_activity: DateTime::<Utc>::UNIX_EPOCH,
            is_archived: false,
            is_muted: false,
            is_pinned: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_type(mut self, conversation_type: ConversationType) -> Self {
        self.conversation_type = conversation_type;
        self
    }

    /// Set the participant list and a matching participant count
    pub fn with_participants<I, S>(mut self, participants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.participant_uids = participants.into_iter().map(Into::into).collect();
        self.participant_count = self.participant_uids.len() as u32;
        self
    }

    pub fn with_unread_count(mut self, unread_count: u32) -> Self {
        self.unread_count = unread_count;
        self
    }

    pub fn with_last_activity(mut self, last_activity: DateTime<Utc>) -> Self {
        self.last_activity = last_activity;
        self
    }

    pub fn with_flags(mut self, is_archived: bool, is_muted: bool, is_pinned: bool) -> Self {
        self.is_archived = is_archived;
        self.is_muted = is_muted;
        self.is_pinned = is_pinned;
        self
    }

    /// Exact membership test against the participant list
    pub fn has_participant(&self, uid: &str) -> bool {
        self.participant_uids.iter().any(|p| p == uid)
    }
}

/// Encode a participant list as JSON text for storage
pub fn encode_participant_uids(uids: &[String]) -> serde_json::Result<String> {
    serde_json::to_string(uids)
}

/// Decode a stored participant list
///
/// NULL, empty text and JSON `null` all decode to an empty list.
pub fn decode_participant_uids(raw: Option<&str>) -> serde_json::Result<Vec<String>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(text) => Ok(serde_json::from_str::<Option<Vec<String>>>(text)?.unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_participants_sets_count() {
        let conv = Conversation::new("c1", "acc-1", "whatsapp").with_participants(["u1", "u2"]);
        assert_eq!(conv.participant_count, 2);
        assert!(conv.has_participant("u1"));
        assert!(!conv.has_participant("u"));
    }

    #[test]
    fn test_conversation_type_text_form() {
        assert_eq!(ConversationType::Group.as_str(), "group");
        assert_eq!(ConversationType::parse("single"), Some(ConversationType::Single));
        assert_eq!(ConversationType::parse("channel"), None);
    }

    #[test]
    fn test_participants_round_trip() {
        let uids = vec!["@alice:example.org".to_string(), "bob \"b\"".to_string()];
        let encoded = encode_participant_uids(&uids).unwrap();
        assert_eq!(decode_participant_uids(Some(&encoded)).unwrap(), uids);
    }

    #[test]
    fn test_decode_missing_participants() {
        assert!(decode_participant_uids(None).unwrap().is_empty());
        assert!(decode_participant_uids(Some("")).unwrap().is_empty());
        assert!(decode_participant_uids(Some("null")).unwrap().is_empty());
        assert!(decode_participant_uids(Some("{oops")).is_err());
    }

    #[test]
    fn test_type_serializes_lowercase() {
        let conv = Conversation::new("c1", "a", "p").with_type(ConversationType::Group);
        let json = serde_json::to_value(&conv).unwrap();
        assert_eq!(json["type"], "group");
    }
}
