//! Conversation query functions

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Conversation, ConversationId, Message};
use crate::storage::MessageStore;

/// A conversation together with all of its stored messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationDetail {
    /// The conversation metadata
    pub conversation: Conversation,
    /// Messages in the conversation, newest first
    pub messages: Vec<Message>,
}

/// List all conversations, most recently active first
pub fn list_all_conversations(store: &dyn MessageStore) -> Result<Vec<Conversation>> {
    Ok(store.list_conversations()?)
}

/// Look up one conversation; `None` if it was never synced
pub fn get_conversation(store: &dyn MessageStore, id: &ConversationId) -> Result<Option<Conversation>> {
    Ok(store.get_conversation(id)?)
}

/// Conversations whose participant list contains exactly `contact_uid`
///
/// Membership is compared per participant, so `u1` does not match `u10`.
pub fn get_conversations_for_contact(store: &dyn MessageStore, contact_uid: &str) -> Result<Vec<Conversation>> {
    Ok(store.list_conversations_for_contact(contact_uid)?)
}

/// Get a conversation with its messages
///
/// # Arguments
/// * `store` - The storage backend
/// * `id` - The conversation to fetch
pub fn get_conversation_detail(store: &dyn MessageStore, id: &ConversationId) -> Result<Option<ConversationDetail>> {
    let conversation = match store.get_conversation(id)? {
        Some(c) => c,
        None => return Ok(None),
    };

    let messages = store.list_messages_for_conversation(id)?;

    Ok(Some(ConversationDetail { conversation, messages }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryMessageStore;
    use chrono::{TimeZone, Utc};

    fn setup() -> InMemoryMessageStore {
        let at = |secs| Utc.timestamp_opt(secs, 0).unwrap();
        let store = InMemoryMessageStore::new();
        store
            .save_conversations(&[
                Conversation::new("c1", "acc", "signal")
                    .with_participants(["u1", "u2"])
                    .with_last_activity(at(10)),
                Conversation::new("c2", "acc", "signal")
                    .with_participants(["u10"])
                    .with_last_activity(at(20)),
            ])
            .unwrap();
        store
            .save_messages(&[
                Message::builder("m1", "c1").contact("u1").timestamp(at(5)).build(),
                Message::builder("m2", "c1").contact("u2").timestamp(at(8)).build(),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_list_all_conversations() {
        let store = setup();
        let ids: Vec<_> = list_all_conversations(&store)
            .unwrap()
            .into_iter()
            .map(|c| c.id.0)
            .collect();
        assert_eq!(ids, vec!["c2", "c1"]);
    }

    #[test]
    fn test_conversations_for_contact_exact() {
        let store = setup();
        let convs = get_conversations_for_contact(&store, "u1").unwrap();
        assert_eq!(convs.len(), 1);
        assert_eq!(convs[0].id.as_str(), "c1");

        assert!(get_conversations_for_contact(&store, "u").unwrap().is_empty());
    }

    #[test]
    fn test_conversation_detail() {
        let store = setup();
        let detail = get_conversation_detail(&store, &ConversationId::new("c1"))
            .unwrap()
            .unwrap();
        assert_eq!(detail.conversation.participant_count, 2);
        let ids: Vec<_> = detail.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m2", "m1"]);

        // Conversation without messages
        let empty = get_conversation_detail(&store, &ConversationId::new("c2"))
            .unwrap()
            .unwrap();
        assert!(empty.messages.is_empty());
    }

    #[test]
    fn test_missing_conversation() {
        let store = setup();
        let missing = ConversationId::new("nope");
        assert!(get_conversation(&store, &missing).unwrap().is_none());
        assert!(get_conversation_detail(&store, &missing).unwrap().is_none());
    }
}
