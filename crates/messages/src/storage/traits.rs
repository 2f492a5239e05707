//! Storage trait definitions

use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::models::{Conversation, ConversationId, Message};

/// Trait for message storage operations
///
/// Writes are batch-atomic: a batch is either fully applied or not at all.
/// Conversations are upserted (every field replaced); messages are
/// insert-if-absent (an existing id is never rewritten).
pub trait MessageStore: Send + Sync {
    /// Upsert a batch of conversations by id; returns the number written
    fn save_conversations(&self, conversations: &[Conversation]) -> StoreResult<usize>;

    /// Insert messages whose id is not yet stored; returns the number inserted
    fn save_messages(&self, messages: &[Message]) -> StoreResult<usize>;

    /// Get a conversation by id
    fn get_conversation(&self, id: &ConversationId) -> StoreResult<Option<Conversation>>;

    /// List all conversations, ordered by last_activity descending
    fn list_conversations(&self) -> StoreResult<Vec<Conversation>>;

    /// List conversations whose participant list contains `contact_uid` exactly,
    /// ordered by last_activity descending
    fn list_conversations_for_contact(&self, contact_uid: &str) -> StoreResult<Vec<Conversation>>;

    /// List messages for a conversation, ordered by timestamp descending
    fn list_messages_for_conversation(&self, id: &ConversationId) -> StoreResult<Vec<Message>>;

    /// List messages whose contact_uid equals `contact_uid`, ordered by timestamp descending
    fn list_messages_for_contact(&self, contact_uid: &str) -> StoreResult<Vec<Message>>;

    /// Latest message timestamp for a contact; `None` when the contact has no messages
    fn last_contact_date(&self, contact_uid: &str) -> StoreResult<Option<DateTime<Utc>>>;

    /// Count stored conversations
    fn count_conversations(&self) -> StoreResult<usize>;

    /// Count stored messages
    fn count_messages(&self) -> StoreResult<usize>;

    /// Release the underlying resources, reporting any failure to do so
    fn close(self: Box<Self>) -> StoreResult<()>;
}
