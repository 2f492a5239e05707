//! In-memory storage implementation
//!
//! Mirrors the SQLite store's semantics (batch atomicity, insert-if-absent
//! messages, conversation linkage, second-resolution timestamps) without
//! touching disk. Used by tests and by callers that only need a scratch store.

use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{MessageStore, truncate_to_seconds};
use crate::error::{StoreError, StoreResult};
use crate::models::{Conversation, ConversationId, Message};

#[derive(Default)]
struct MessageTable {
    /// Insertion order, which breaks timestamp ties
    rows: Vec<Message>,
    ids: HashSet<String>,
}

/// In-memory implementation of MessageStore
///
/// Uses collections protected by RwLocks for thread-safe access.
#[derive(Default)]
pub struct InMemoryMessageStore {
    conversations: RwLock<HashMap<String, Conversation>>,
    messages: RwLock<MessageTable>,
}

fn read<T>(lock: &RwLock<T>) -> StoreResult<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| StoreError::LockPoisoned)
}

fn write<T>(lock: &RwLock<T>) -> StoreResult<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| StoreError::LockPoisoned)
}

impl InMemoryMessageStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted_messages<F>(&self, filter: F) -> StoreResult<Vec<Message>>
    where
        F: Fn(&Message) -> bool,
    {
        let table = read(&self.messages)?;
        let mut messages: Vec<Message> = table.rows.iter().filter(|&m| filter(m)).cloned().collect();
        messages.sort_by_key(|m| Reverse(m.timestamp));
        Ok(messages)
    }

    fn sorted_conversations<F>(&self, filter: F) -> StoreResult<Vec<Conversation>>
    where
        F: Fn(&Conversation) -> bool,
    {
        let conversations = read(&self.conversations)?;
        let mut list: Vec<Conversation> = conversations.values().filter(|&c| filter(c)).cloned().collect();
        list.sort_by(|a, b| {
            b.last_activity
                .cmp(&a.last_activity)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(list)
    }
}

impl MessageStore for InMemoryMessageStore {
    fn save_conversations(&self, conversations: &[Conversation]) -> StoreResult<usize> {
        // Prepare the whole batch before touching the map
        let prepared = conversations
            .iter()
            .map(|conv| {
                let mut conv = conv.clone();
                conv.last_activity = truncate_to_seconds("last_activity", &conv.last_activity)?;
                Ok(conv)
            })
            .collect::<StoreResult<Vec<_>>>()?;

        let mut map = write(&self.conversations)?;
        for conv in prepared {
            map.insert(conv.id.as_str().to_string(), conv);
        }
        Ok(conversations.len())
    }

    fn save_messages(&self, messages: &[Message]) -> StoreResult<usize> {
        let conversations = read(&self.conversations)?;
        let mut table = write(&self.messages)?;

        let mut batch_ids = HashSet::new();
        let mut accepted = Vec::new();
        for msg in messages {
            // Known ids are skipped before the conversation link is checked
            if table.ids.contains(msg.id.as_str()) || batch_ids.contains(msg.id.as_str()) {
                continue;
            }
            if !conversations.contains_key(msg.conversation_uid.as_str()) {
                return Err(StoreError::UnknownConversation {
                    message_id: msg.id.to_string(),
                    conversation_id: msg.conversation_uid.to_string(),
                });
            }
            batch_ids.insert(msg.id.as_str());
            let mut msg = msg.clone();
            msg.timestamp = truncate_to_seconds("timestamp", &msg.timestamp)?;
            accepted.push(msg);
        }

        let inserted = accepted.len();
        for msg in accepted {
            table.ids.insert(msg.id.as_str().to_string());
            table.rows.push(msg);
        }
        Ok(inserted)
    }

    fn get_conversation(&self, id: &ConversationId) -> StoreResult<Option<Conversation>> {
        Ok(read(&self.conversations)?.get(id.as_str()).cloned())
    }

    fn list_conversations(&self) -> StoreResult<Vec<Conversation>> {
        self.sorted_conversations(|_| true)
    }

    fn list_conversations_for_contact(&self, contact_uid: &str) -> StoreResult<Vec<Conversation>> {
        self.sorted_conversations(|c| c.has_participant(contact_uid))
    }

    fn list_messages_for_conversation(&self, id: &ConversationId) -> StoreResult<Vec<Message>> {
        self.sorted_messages(|m| &m.conversation_uid == id)
    }

    fn list_messages_for_contact(&self, contact_uid: &str) -> StoreResult<Vec<Message>> {
        self.sorted_messages(|m| m.contact_uid == contact_uid)
    }

    fn last_contact_date(&self, contact_uid: &str) -> StoreResult<Option<DateTime<Utc>>> {
        let table = read(&self.messages)?;
        Ok(table
            .rows
            .iter()
            .filter(|m| m.contact_uid == contact_uid)
            .map(|m| m.timestamp)
            .max())
    }

    fn count_conversations(&self) -> StoreResult<usize> {
        Ok(read(&self.conversations)?.len())
    }

    fn count_messages(&self) -> StoreResult<usize> {
        Ok(read(&self.messages)?.rows.len())
    }

    fn close(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn conversation(id: &str, participants: &[&str], secs: i64) -> Conversation {
        Conversation::new(id, "acc-1", "matrix")
            .with_participants(participants.iter().copied())
            .with_last_activity(at(secs))
    }

    fn message(id: &str, conversation: &str, contact: &str, secs: i64) -> Message {
        Message::builder(id, conversation)
            .contact(contact)
            .timestamp(at(secs))
            .text(id)
            .build()
    }

    #[test]
    fn test_insert_if_absent() {
        let store = InMemoryMessageStore::new();
        store.save_conversations(&[conversation("c1", &["u1"], 10)]).unwrap();

        assert_eq!(store.save_messages(&[message("m1", "c1", "u1", 10)]).unwrap(), 1);

        let mut changed = message("m1", "c1", "u1", 10);
        changed.text = "changed".to_string();
        assert_eq!(store.save_messages(&[changed]).unwrap(), 0);

        let stored = store.list_messages_for_contact("u1").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].text, "m1");
    }

    #[test]
    fn test_orphan_message_rejects_whole_batch() {
        let store = InMemoryMessageStore::new();
        store.save_conversations(&[conversation("c1", &["u1"], 10)]).unwrap();

        let err = store
            .save_messages(&[message("m1", "c1", "u1", 10), message("m2", "nope", "u1", 11)])
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownConversation { .. }));
        assert_eq!(store.count_messages().unwrap(), 0);
    }

    #[test]
    fn test_known_id_skipped_even_if_conversation_moved() {
        let store = InMemoryMessageStore::new();
        store.save_conversations(&[conversation("c1", &["u1"], 10)]).unwrap();
        store.save_messages(&[message("m1", "c1", "u1", 10)]).unwrap();

        let inserted = store
            .save_messages(&[message("m1", "c-renamed", "u1", 10), message("m2", "c1", "u1", 11)])
            .unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(store.count_messages().unwrap(), 2);

        let first = &store.list_messages_for_contact("u1").unwrap()[1];
        assert_eq!(first.conversation_uid.as_str(), "c1");
    }

    #[test]
    fn test_duplicate_in_batch_skipped_before_link_check() {
        let store = InMemoryMessageStore::new();
        store.save_conversations(&[conversation("c1", &["u1"], 10)]).unwrap();

        let inserted = store
            .save_messages(&[message("m1", "c1", "u1", 10), message("m1", "nope", "u1", 12)])
            .unwrap();
        assert_eq!(inserted, 1);
    }

    #[test]
    fn test_ordering_and_exact_membership() {
        let store = InMemoryMessageStore::new();
        store
            .save_conversations(&[
                conversation("c1", &["u1"], 10),
                conversation("c2", &["u10"], 30),
                conversation("c3", &["u1", "u2"], 20),
            ])
            .unwrap();

        let ids: Vec<String> = store
            .list_conversations_for_contact("u1")
            .unwrap()
            .into_iter()
            .map(|c| c.id.0)
            .collect();
        assert_eq!(ids, vec!["c3", "c1"]);

        store
            .save_messages(&[message("m1", "c1", "u1", 5), message("m2", "c1", "u1", 9)])
            .unwrap();
        let ids: Vec<String> = store
            .list_messages_for_conversation(&ConversationId::new("c1"))
            .unwrap()
            .into_iter()
            .map(|m| m.id.0)
            .collect();
        assert_eq!(ids, vec!["m2", "m1"]);
        assert_eq!(store.last_contact_date("u1").unwrap(), Some(at(9)));
        assert_eq!(store.last_contact_date("u2").unwrap(), None);
    }

    #[test]
    fn test_timestamps_truncated_like_sqlite() {
        let store = InMemoryMessageStore::new();
        let precise = Utc.timestamp_opt(42, 999_000_000).unwrap();
        store
            .save_conversations(&[conversation("c1", &[], 0).with_last_activity(precise)])
            .unwrap();

        let stored = store.get_conversation(&ConversationId::new("c1")).unwrap().unwrap();
        assert_eq!(stored.last_activity, at(42));
    }
}
